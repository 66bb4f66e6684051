//! [`ComputePrice`] definition.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        order::{DeliveryMode, Term},
        pricing::Breakdown,
        promo, unit, PromoCode,
    },
    error,
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] quoting the price of renting a [`Unit`] without placing an
/// [`Order`].
///
/// [`Order`]: crate::domain::Order
/// [`Unit`]: crate::domain::Unit
#[derive(Clone, Debug)]
pub struct ComputePrice {
    /// ID of the [`Unit`] to be rented.
    ///
    /// [`Unit`]: crate::domain::Unit
    pub unit_id: String,

    /// Number of months to rent the [`Unit`] for.
    ///
    /// [`Unit`]: crate::domain::Unit
    pub months: u8,

    /// [`DeliveryMode`] of the goods.
    pub delivery_mode: DeliveryMode,

    /// Promo code to apply, if any.
    pub promo_code: Option<String>,
}

impl<Db> Query<ComputePrice> for Service<Db>
where
    Db: Database<
        Select<By<Option<PromoCode>, promo::Code>>,
        Ok = Option<PromoCode>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Breakdown;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: ComputePrice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ComputePrice {
            unit_id,
            months,
            delivery_mode,
            promo_code,
        } = query;

        let rate = unit::Id::new(&unit_id)
            .and_then(|id| self.catalog().unit(&id))
            .map(|u| u.price_per_month)
            .ok_or(E::UnknownUnit(unit_id))
            .map_err(tracerr::wrap!())?;
        let term = Term::from_months(months)
            .ok_or(E::InvalidTerm(months))
            .map_err(tracerr::wrap!())?;

        let discount = match promo_code.filter(|c| !c.trim().is_empty()) {
            None => None,
            Some(raw) => {
                let Some(code) = promo::Code::new(&raw) else {
                    return Err(tracerr::new!(E::PromoRejected {
                        code: raw,
                        reason: promo::Rejection::NotFound,
                    }));
                };
                let promo = self
                    .database()
                    .execute(Select(By::<Option<PromoCode>, _>::new(
                        code.clone(),
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                let validated = promo
                    .ok_or(promo::Rejection::NotFound)
                    .and_then(|p| p.validate(self.today()));
                Some(validated.map_err(|reason| {
                    tracerr::new!(E::PromoRejected {
                        code: code.to_string(),
                        reason,
                    })
                })?)
            }
        };

        Ok(Breakdown::compute(
            rate,
            term,
            delivery_mode,
            self.catalog().delivery(),
            discount,
        ))
    }
}

/// Error of [`ComputePrice`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Number of months is not an allowed [`Term`].
    #[display("{_0} months is not an allowed rental term")]
    InvalidTerm(#[error(not(source))] u8),

    /// Promo code cannot be applied.
    #[display("`{code}` promo code is rejected: {reason}")]
    PromoRejected {
        /// Provided promo code.
        #[error(not(source))]
        code: String,

        /// [`promo::Rejection`] reason.
        #[error(not(source))]
        reason: promo::Rejection,
    },

    /// [`Unit`] is not present in the catalog.
    ///
    /// [`Unit`]: crate::domain::Unit
    #[display("`Unit(id: {_0})` is not offered")]
    UnknownUnit(#[error(not(source))] String),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(_) => error::Kind::Internal,
            Self::InvalidTerm(_)
            | Self::PromoRejected { .. }
            | Self::UnknownUnit(_) => error::Kind::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, operations::Insert, Money};

    use crate::{
        domain::{order::DeliveryMode, promo},
        infra::Database as _,
        spec::service,
        Query as _,
    };

    use super::{ComputePrice, ExecutionError};

    fn rub(amount: i64) -> Money {
        Money::new(amount, Currency::Rub)
    }

    #[tokio::test]
    async fn quotes_without_side_effects() {
        let (svc, _inbox) = service();
        let p = promo::spec::promo("spring", 15);
        svc.database().execute(Insert(p.clone())).await.unwrap();

        let quote = svc
            .execute(ComputePrice {
                unit_id: "medium".to_owned(),
                months: 3,
                delivery_mode: DeliveryMode::SelfDelivery,
                promo_code: Some("spring".to_owned()),
            })
            .await
            .unwrap();

        assert_eq!(quote.base, rub(9000));
        assert_eq!(quote.self_delivery_deduction, rub(1800));
        assert_eq!(quote.promo_deduction, rub(1080));
        assert_eq!(quote.total, rub(6120));

        let stored = svc
            .execute(crate::query::promo_code::ByCode::by(p.code.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.usage_count, promo::UsageCount::default());
    }

    #[tokio::test]
    async fn rejects_unknown_inputs() {
        let (svc, _inbox) = service();
        let quote = |unit: &str, months, code: Option<&str>| ComputePrice {
            unit_id: unit.to_owned(),
            months,
            delivery_mode: DeliveryMode::PickupService,
            promo_code: code.map(ToOwned::to_owned),
        };

        let err = svc.execute(quote("huge", 1, None)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UnknownUnit(_)));

        let err = svc.execute(quote("small", 2, None)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidTerm(2)));

        let err = svc
            .execute(quote("small", 1, Some("nope")))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::PromoRejected {
                reason: promo::Rejection::NotFound,
                ..
            },
        ));

        let full = svc.execute(quote("small", 6, Some(" "))).await.unwrap();
        assert_eq!(full.total, rub(6000));
    }
}
