//! [`Command`] for creating a new [`PromoCode`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{promo, PromoCode},
    error,
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new active [`PromoCode`].
#[derive(Clone, Debug)]
pub struct CreatePromoCode {
    /// Code of the new [`PromoCode`], canonicalized before storing.
    pub code: String,

    /// Discount granted by the new [`PromoCode`].
    pub discount: Percent,

    /// First day the new [`PromoCode`] may be used at, if limited.
    pub active_from: Option<promo::ActiveFromDate>,

    /// Last day the new [`PromoCode`] may be used at, if limited.
    pub active_to: Option<promo::ActiveToDate>,

    /// Indicator whether the new [`PromoCode`] is distributed via
    /// advertising.
    pub is_advertising: bool,
}

impl<Db> Command<CreatePromoCode> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<PromoCode, promo::Code>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<PromoCode>, promo::Code>>,
            Ok = Option<PromoCode>,
            Err = Traced<database::Error>,
        > + Database<Insert<PromoCode>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = PromoCode;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreatePromoCode,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePromoCode {
            code,
            discount,
            active_from,
            active_to,
            is_advertising,
        } = cmd;

        let code = promo::Code::new(&code)
            .ok_or(E::InvalidCode(code))
            .map_err(tracerr::wrap!())?;
        if discount.value().normalize().scale() > PromoCode::DISCOUNT_SCALE {
            return Err(tracerr::new!(E::InvalidDiscount(discount)));
        }
        if let (Some(from), Some(to)) = (active_from, active_to) {
            if to.coerce::<()>() < from.coerce() {
                return Err(tracerr::new!(E::InvalidWindow));
            }
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent creation of the same code.
        tx.execute(Lock(By::new(code.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::<Option<PromoCode>, _>::new(code.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::CodeOccupied(code)));
        }

        let promo = PromoCode {
            code,
            discount,
            active_from,
            active_to,
            is_active: true,
            is_advertising,
            usage_count: promo::UsageCount::default(),
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(promo.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(code = %promo.code, %discount, "`PromoCode` is created");

        Ok(promo)
    }
}

/// Error of [`CreatePromoCode`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`promo::Code`] is already taken.
    #[display("`{_0}` promo code already exists")]
    CodeOccupied(#[error(not(source))] promo::Code),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Discount has more decimal places than a [`PromoCode`] stores.
    #[display("`{_0}` discount is too precise")]
    InvalidDiscount(#[error(not(source))] Percent),

    /// Malformed [`promo::Code`].
    #[display("`{_0}` is not a valid promo code")]
    InvalidCode(#[error(not(source))] String),

    /// Validity window ends before it starts.
    #[display("Validity window ends before it starts")]
    InvalidWindow,
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(_) => error::Kind::Internal,
            Self::CodeOccupied(_)
            | Self::InvalidCode(_)
            | Self::InvalidDiscount(_)
            | Self::InvalidWindow => error::Kind::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, Percent};

    use crate::{error, spec::service, Command as _};

    use super::{CreatePromoCode, ExecutionError};

    fn create(code: &str) -> CreatePromoCode {
        CreatePromoCode {
            code: code.to_owned(),
            discount: Percent::new(20).unwrap(),
            active_from: None,
            active_to: None,
            is_advertising: true,
        }
    }

    #[tokio::test]
    async fn canonicalizes_and_rejects_duplicates() {
        let (svc, _inbox) = service();

        let p = svc.execute(create(" summer ")).await.unwrap();
        assert_eq!(p.code.as_ref(), "SUMMER");
        assert!(p.is_active);

        let err = svc.execute(create("Summer")).await.unwrap_err();
        assert_eq!(err.as_ref().kind(), error::Kind::Validation);
    }

    #[tokio::test]
    async fn rejects_too_precise_discount() {
        let (svc, _inbox) = service();

        let err = svc
            .execute(CreatePromoCode {
                discount: "12.345".parse().unwrap(),
                ..create("precise")
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidDiscount(_)));
        assert_eq!(err.as_ref().kind(), error::Kind::Validation);

        let p = svc
            .execute(CreatePromoCode {
                discount: "12.50".parse().unwrap(),
                ..create("precise")
            })
            .await
            .unwrap();
        assert_eq!(p.discount, "12.5".parse().unwrap());
    }

    #[tokio::test]
    async fn rejects_inverted_window() {
        let (svc, _inbox) = service();

        let err = svc
            .execute(CreatePromoCode {
                active_from: Date::from_calendar(2025, 6, 1).map(Date::coerce),
                active_to: Date::from_calendar(2025, 5, 1).map(Date::coerce),
                ..create("late")
            })
            .await
            .unwrap_err();

        assert_eq!(err.as_ref().kind(), error::Kind::Validation);
    }
}
