//! [`Command`] for confirming the payment of an [`Order`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{order, Notification, Order},
    infra::{database, Database},
    Service,
};

use super::{Command, TransitionError};

/// [`Command`] for confirming the payment of an [`Order`], starting its
/// rental.
///
/// Confirming an already paid [`Order`] returns it untouched.
#[derive(Clone, Copy, Debug)]
pub struct ConfirmPayment {
    /// ID of the paid [`Order`].
    pub order_id: order::Id,
}

impl<Db> Command<ConfirmPayment> for Service<Db>
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

    async fn execute(
        &self,
        cmd: ConfirmPayment,
    ) -> Result<Self::Ok, Self::Err> {
        let ConfirmPayment { order_id } = cmd;
        let today = self.today();

        let (order, confirmed) = self
            .transit_order(order_id, |o| o.confirm_payment(today))
            .await
            .map_err(tracerr::wrap!())?;

        if confirmed {
            log::info!(%order_id, "`Order` is paid");
            self.outbox().push(Notification::payment_confirmed(&order));
        }

        Ok(order)
    }
}

/// Error of [`ConfirmPayment`] [`Command`] execution.
pub type ExecutionError = TransitionError;

#[cfg(test)]
mod spec {
    use common::operations::{By, Insert, Select};

    use crate::{
        domain::{
            notification,
            order::{self, spec::order},
            Order,
        },
        error,
        infra::Database as _,
        spec::service,
        Command as _,
    };

    use super::ConfirmPayment;

    #[tokio::test]
    async fn starts_rental_today() {
        let (svc, mut inbox) = service();
        let o = order(1000);
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let paid = svc
            .execute(ConfirmPayment { order_id: o.id })
            .await
            .unwrap();

        let today = svc.today();
        assert_eq!(paid.status, order::Status::Paid);
        assert_eq!(paid.start_date.map(|d| d.coerce()), Some(today));
        assert_eq!(
            paid.end_date.map(|d| d.coerce()),
            Some(today.saturating_add_days(30)),
        );
        assert_eq!(
            inbox.try_recv().map(|n| n.kind),
            Some(notification::Kind::PaymentConfirmed),
        );
    }

    #[tokio::test]
    async fn is_idempotent() {
        let (svc, mut inbox) = service();
        let o = order(1000);
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let first = svc
            .execute(ConfirmPayment { order_id: o.id })
            .await
            .unwrap();
        let second = svc
            .execute(ConfirmPayment { order_id: o.id })
            .await
            .unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.start_date, second.start_date);
        assert_eq!(first.end_date, second.end_date);
        assert!(inbox.try_recv().is_some());
        assert!(inbox.try_recv().is_none(), "notified only once");
    }

    #[tokio::test]
    async fn rejects_cancelled() {
        let (svc, _inbox) = service();
        let mut o = order(1000);
        o.cancel().unwrap();
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let err = svc
            .execute(ConfirmPayment { order_id: o.id })
            .await
            .unwrap_err();

        assert_eq!(err.as_ref().kind(), error::Kind::InvalidTransition);
        let stored: Option<Order> =
            svc.database().execute(Select(By::new(o.id))).await.unwrap();
        assert_eq!(stored.unwrap().status, order::Status::Cancelled);
    }

    #[tokio::test]
    async fn rejects_unknown() {
        let (svc, _inbox) = service();

        let err = svc
            .execute(ConfirmPayment {
                order_id: order::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.as_ref().kind(), error::Kind::NotFound);
    }
}
