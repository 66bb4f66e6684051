//! [`Command`] for extending the rental of an [`Order`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        order::{self, Term},
        Notification, Order,
    },
    error,
    infra::{database, Database},
    Service,
};

use super::{Command, TransitionError};

/// [`Command`] for extending the rental of a stored [`Order`] by the
/// provided number of months.
///
/// The extension is charged at the monthly rate snapshotted at the [`Order`]
/// creation, without any discounts.
#[derive(Clone, Copy, Debug)]
pub struct ExtendOrder {
    /// ID of the [`Order`] to be extended.
    pub order_id: order::Id,

    /// Number of months to extend the rental by.
    pub months: u8,
}

impl<Db> Command<ExtendOrder> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Order, order::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Update<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ExtendOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ExtendOrder { order_id, months } = cmd;
        let term = Term::from_months(months)
            .ok_or(E::InvalidTerm(months))
            .map_err(tracerr::wrap!())?;
        let today = self.today();

        let (order, surcharge) = self
            .transit_order(order_id, |o| o.extend(term, today))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        log::info!(
            %order_id,
            %surcharge,
            "`Order` is extended for {months} month(s)",
        );

        self.outbox().push(Notification::extended(&order, surcharge));

        Ok(order)
    }
}

/// Error of [`ExtendOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Requested number of months is not an allowed [`Term`].
    #[display("`{_0}` months is not an allowed rental term")]
    InvalidTerm(#[error(not(source))] u8),

    /// [`Order`] transition error.
    #[display("{_0}")]
    #[from]
    Transition(TransitionError),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::InvalidTerm(_) => error::Kind::Validation,
            Self::Transition(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{
        money::Currency,
        operations::{By, Insert, Select},
        Money,
    };

    use crate::{
        domain::{
            notification,
            order::{
                self,
                spec::{date, order},
            },
            Order,
        },
        error,
        infra::Database as _,
        spec::service,
        Command as _,
    };

    use super::ExtendOrder;

    #[tokio::test]
    async fn adds_months_to_end_and_price() {
        let (svc, mut inbox) = service();
        let mut o = order(1000);
        _ = o.confirm_payment(date(2024, 12, 2)).unwrap();
        o.receive().unwrap();
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let extended = svc
            .execute(ExtendOrder {
                order_id: o.id,
                months: 3,
            })
            .await
            .unwrap();

        assert_eq!(extended.status, order::Status::InStorage);
        assert_eq!(
            extended.end_date.map(|d| d.coerce()),
            Some(date(2025, 4, 1)),
        );
        assert_eq!(extended.final_price, Money::new(4000, Currency::Rub));
        assert_eq!(
            inbox.try_recv().map(|n| n.kind),
            Some(notification::Kind::Extended),
        );
    }

    #[tokio::test]
    async fn rejects_disallowed_months() {
        let (svc, _inbox) = service();
        let mut o = order(1000);
        _ = o.confirm_payment(date(2024, 12, 2)).unwrap();
        o.receive().unwrap();
        svc.database().execute(Insert(o.clone())).await.unwrap();

        for months in [0, 2, 4, 12] {
            let err = svc
                .execute(ExtendOrder {
                    order_id: o.id,
                    months,
                })
                .await
                .unwrap_err();
            assert_eq!(err.as_ref().kind(), error::Kind::Validation);
        }

        let stored: Option<Order> =
            svc.database().execute(Select(By::new(o.id))).await.unwrap();
        assert_eq!(stored.unwrap().final_price, o.final_price);
    }

    #[tokio::test]
    async fn requires_stored_goods() {
        let (svc, mut inbox) = service();
        let mut o = order(1000);
        _ = o.confirm_payment(date(2024, 12, 2)).unwrap();
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let err = svc
            .execute(ExtendOrder {
                order_id: o.id,
                months: 1,
            })
            .await
            .unwrap_err();

        assert_eq!(err.as_ref().kind(), error::Kind::InvalidTransition);
        assert!(inbox.try_recv().is_none());
    }
}
