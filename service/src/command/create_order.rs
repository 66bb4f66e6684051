//! [`Command`] for creating a new [`Order`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime, Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        order::{self, Address, Contact, DeliveryMode, Email, Name, Phone, Term},
        pricing::Breakdown,
        promo, unit, user, Order, PromoCode, User,
    },
    error,
    infra::{database, Database},
    Service,
};

use super::Command;

/// Maximum length of a preferred collection time.
const PREFERRED_TIME_MAX_LEN: usize = 255;

/// [`Command`] for creating a new [`Order`] out of the raw customer input.
///
/// A promo code is validated once, at creation, and its discount is
/// snapshotted into the [`Order`] along with recording its usage.
#[derive(Clone, Debug)]
pub struct CreateOrder {
    /// ID of the [`User`] placing the [`Order`].
    pub user_id: user::Id,

    /// ID of the rented [`Unit`].
    ///
    /// [`Unit`]: crate::domain::Unit
    pub unit_id: String,

    /// Number of months to rent the [`Unit`] for.
    ///
    /// [`Unit`]: crate::domain::Unit
    pub months: u8,

    /// [`DeliveryMode`] of the goods.
    pub delivery_mode: DeliveryMode,

    /// Phone number of the customer.
    pub phone: String,

    /// Email of the customer.
    pub email: String,

    /// Name of the customer, if provided.
    pub name: Option<String>,

    /// Address to collect the goods from.
    ///
    /// Required for [`DeliveryMode::PickupService`].
    pub address: Option<String>,

    /// Time the customer prefers the goods to be collected at.
    pub preferred_time: Option<String>,

    /// Promo code to apply, if any.
    pub promo_code: Option<String>,
}

impl<Db> Command<CreateOrder> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<PromoCode, promo::Code>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<PromoCode>, promo::Code>>,
            Ok = Option<PromoCode>,
            Err = Traced<database::Error>,
        > + Database<Update<PromoCode>, Err = Traced<database::Error>>
        + Database<Insert<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = (Order, Breakdown);
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateOrder {
            user_id,
            unit_id,
            months,
            delivery_mode,
            phone,
            email,
            name,
            address,
            preferred_time,
            promo_code,
        } = cmd;

        let unit = unit::Id::new(&unit_id)
            .and_then(|id| self.catalog().unit(&id))
            .ok_or(E::UnknownUnit(unit_id))
            .map_err(tracerr::wrap!())?
            .clone();
        let term = Term::from_months(months)
            .ok_or(E::InvalidTerm(months))
            .map_err(tracerr::wrap!())?;
        let contact = Contact {
            phone: Phone::new(phone)
                .ok_or(E::InvalidPhone)
                .map_err(tracerr::wrap!())?,
            email: Email::new(email)
                .ok_or(E::InvalidEmail)
                .map_err(tracerr::wrap!())?,
            name: name
                .filter(|n| !n.trim().is_empty())
                .map(|n| Name::new(n).ok_or(E::InvalidName))
                .transpose()
                .map_err(tracerr::wrap!())?,
        };
        let address = address
            .filter(|a| !a.trim().is_empty())
            .map(|a| Address::new(a).ok_or(E::InvalidAddress))
            .transpose()
            .map_err(tracerr::wrap!())?;
        if delivery_mode == DeliveryMode::PickupService && address.is_none() {
            return Err(tracerr::new!(E::AddressRequired));
        }
        let preferred_time = preferred_time
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        if preferred_time
            .as_ref()
            .is_some_and(|t| t.chars().count() > PREFERRED_TIME_MAX_LEN)
        {
            return Err(tracerr::new!(E::InvalidPreferredTime));
        }
        let promo_code = promo_code
            .filter(|c| !c.trim().is_empty())
            .map(|c| {
                promo::Code::new(&c).ok_or(E::PromoRejected {
                    code: c,
                    reason: promo::Rejection::NotFound,
                })
            })
            .transpose()
            .map_err(tracerr::wrap!())?;

        _ = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let discount = if let Some(code) = &promo_code {
            // Avoid lost updates of the usage counter.
            tx.execute(Lock(By::new(code.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            let rejected = |reason| E::PromoRejected {
                code: code.to_string(),
                reason,
            };
            let mut promo = tx
                .execute(Select(By::<Option<PromoCode>, _>::new(code.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| rejected(promo::Rejection::NotFound))
                .map_err(tracerr::wrap!())?;
            let discount = promo
                .validate(self.today())
                .map_err(rejected)
                .map_err(tracerr::wrap!())?;

            promo.record_usage();
            tx.execute(Update(promo))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            Some(discount)
        } else {
            None
        };

        let breakdown = Breakdown::compute(
            unit.price_per_month,
            term,
            delivery_mode,
            self.catalog().delivery(),
            discount,
        );

        let order = Order {
            id: order::Id::new(),
            user_id,
            unit_id: unit.id,
            term,
            delivery_mode,
            contact,
            address,
            preferred_time,
            promo_code,
            discount: discount.unwrap_or(Percent::ZERO),
            base_price: unit.price_per_month,
            final_price: breakdown.total,
            start_date: None,
            end_date: None,
            is_delivery_required: delivery_mode == DeliveryMode::PickupService,
            is_delivered: false,
            status: order::Status::Created,
            last_reminded_on: None,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            order_id = %order.id,
            %user_id,
            total = %breakdown.total,
            "`Order` is created",
        );

        Ok((order, breakdown))
    }
}

/// Error of [`CreateOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Pickup service requested without an [`Address`].
    #[display("Address is required for the pickup service")]
    AddressRequired,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Malformed [`Address`].
    #[display("Invalid address")]
    InvalidAddress,

    /// Malformed [`Email`].
    #[display("Invalid email")]
    InvalidEmail,

    /// Malformed [`Name`].
    #[display("Invalid name")]
    InvalidName,

    /// Malformed [`Phone`].
    #[display("Invalid phone number")]
    InvalidPhone,

    /// Malformed preferred collection time.
    #[display("Invalid preferred time")]
    InvalidPreferredTime,

    /// Requested number of months is not an allowed [`Term`].
    #[display("`{_0}` months is not an allowed rental term")]
    InvalidTerm(#[error(not(source))] u8),

    /// Provided promo code cannot be applied.
    #[display("`{code}` promo code is rejected: {reason}")]
    PromoRejected {
        /// Rejected promo code.
        #[error(not(source))]
        code: String,

        /// Reason of the rejection.
        #[error(not(source))]
        reason: promo::Rejection,
    },

    /// Requested [`Unit`] is not in the [`Catalog`].
    ///
    /// [`Catalog`]: crate::domain::Catalog
    /// [`Unit`]: crate::domain::Unit
    #[display("`Unit(id: {_0})` is not in the catalog")]
    UnknownUnit(#[error(not(source))] String),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(_) => error::Kind::Internal,
            Self::UserNotExists(_) => error::Kind::NotFound,
            Self::AddressRequired
            | Self::InvalidAddress
            | Self::InvalidEmail
            | Self::InvalidName
            | Self::InvalidPhone
            | Self::InvalidPreferredTime
            | Self::InvalidTerm(_)
            | Self::PromoRejected { .. }
            | Self::UnknownUnit(_) => error::Kind::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{
        money::Currency,
        operations::{By, Insert, Select},
        Money, Percent,
    };

    use crate::{
        domain::{
            order::{self, DeliveryMode},
            promo::{self, spec::promo},
            PromoCode,
        },
        error,
        infra::Database as _,
        spec::{service, user},
        Command as _,
    };

    use super::{CreateOrder, ExecutionError};

    fn create(user_id: crate::domain::user::Id) -> CreateOrder {
        CreateOrder {
            user_id,
            unit_id: "medium".to_owned(),
            months: 3,
            delivery_mode: DeliveryMode::SelfDelivery,
            phone: "+7 (999) 123-45-67".to_owned(),
            email: "client@example.com".to_owned(),
            name: Some("Jane".to_owned()),
            address: None,
            preferred_time: None,
            promo_code: None,
        }
    }

    #[tokio::test]
    async fn prices_with_promo_snapshot() {
        let (svc, _inbox) = service();
        let u = user(&svc).await;
        svc.database()
            .execute(Insert(promo("spring", 15)))
            .await
            .unwrap();

        let (o, breakdown) = svc
            .execute(CreateOrder {
                promo_code: Some(" Spring ".to_owned()),
                ..create(u.id)
            })
            .await
            .unwrap();

        assert_eq!(o.status, order::Status::Created);
        assert_eq!(o.final_price, Money::new(6120, Currency::Rub));
        assert_eq!(o.base_price, Money::new(3000, Currency::Rub));
        assert_eq!(breakdown.promo_deduction, Money::new(1080, Currency::Rub));
        assert_eq!(o.discount, Percent::new(15).unwrap());
        assert_eq!(o.promo_code, promo::Code::new("SPRING"));
        assert!(!o.is_delivery_required);

        let p: Option<PromoCode> = svc
            .database()
            .execute(Select(By::new(promo::Code::new("SPRING").unwrap())))
            .await
            .unwrap();
        assert_eq!(p.unwrap().usage_count, promo::UsageCount::from(1));
    }

    #[tokio::test]
    async fn keeps_snapshot_after_deactivation() {
        let (svc, _inbox) = service();
        let u = user(&svc).await;
        let mut p = promo("once", 10);
        svc.database().execute(Insert(p.clone())).await.unwrap();

        let (o, _) = svc
            .execute(CreateOrder {
                promo_code: Some("once".to_owned()),
                ..create(u.id)
            })
            .await
            .unwrap();

        p.is_active = false;
        svc.database().execute(Insert(p)).await.unwrap();

        let stored: Option<crate::domain::Order> =
            svc.database().execute(Select(By::new(o.id))).await.unwrap();
        let stored = stored.unwrap();
        assert_eq!(stored.discount, Percent::new(10).unwrap());
        assert_eq!(stored.final_price, o.final_price);
    }

    #[tokio::test]
    async fn rejects_invalid_promo() {
        let (svc, _inbox) = service();
        let u = user(&svc).await;
        let mut p = promo("off", 10);
        p.is_active = false;
        svc.database().execute(Insert(p)).await.unwrap();

        for (code, reason) in [
            ("off", promo::Rejection::Deactivated),
            ("missing", promo::Rejection::NotFound),
        ] {
            let err = svc
                .execute(CreateOrder {
                    promo_code: Some(code.to_owned()),
                    ..create(u.id)
                })
                .await
                .unwrap_err();

            assert_eq!(err.as_ref().kind(), error::Kind::Validation);
            assert!(matches!(
                err.as_ref(),
                ExecutionError::PromoRejected { reason: r, .. } if *r == reason,
            ));
        }
    }

    #[tokio::test]
    async fn requires_address_for_pickup() {
        let (svc, _inbox) = service();
        let u = user(&svc).await;

        let err = svc
            .execute(CreateOrder {
                delivery_mode: DeliveryMode::PickupService,
                ..create(u.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AddressRequired));

        let (o, breakdown) = svc
            .execute(CreateOrder {
                delivery_mode: DeliveryMode::PickupService,
                address: Some("Lenina st. 1".to_owned()),
                ..create(u.id)
            })
            .await
            .unwrap();
        assert!(o.is_delivery_required);
        assert_eq!(breakdown.total, Money::new(9000, Currency::Rub));
    }

    #[tokio::test]
    async fn validates_input() {
        let (svc, _inbox) = service();
        let u = user(&svc).await;

        for (cmd, expected) in [
            (
                CreateOrder {
                    unit_id: "huge".to_owned(),
                    ..create(u.id)
                },
                "unit",
            ),
            (
                CreateOrder {
                    months: 2,
                    ..create(u.id)
                },
                "term",
            ),
            (
                CreateOrder {
                    phone: "12".to_owned(),
                    ..create(u.id)
                },
                "phone",
            ),
            (
                CreateOrder {
                    email: "not-an-email".to_owned(),
                    ..create(u.id)
                },
                "email",
            ),
        ] {
            let err = svc.execute(cmd).await.unwrap_err();
            assert_eq!(
                err.as_ref().kind(),
                error::Kind::Validation,
                "{expected}",
            );
        }

        let err = svc
            .execute(create(crate::domain::user::Id::new()))
            .await
            .unwrap_err();
        assert_eq!(err.as_ref().kind(), error::Kind::NotFound);
    }
}
