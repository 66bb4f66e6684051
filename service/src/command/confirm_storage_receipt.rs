//! [`Command`] for confirming the goods of an [`Order`] are received.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{order, Order},
    infra::{database, Database},
    Service,
};

use super::{Command, TransitionError};

/// [`Command`] for confirming the goods of a paid [`Order`] are received
/// at the warehouse.
#[derive(Clone, Copy, Debug)]
pub struct ConfirmStorageReceipt {
    /// ID of the [`Order`] whose goods are received.
    pub order_id: order::Id,
}

impl<Db> Command<ConfirmStorageReceipt> for Service<Db>
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
        cmd: ConfirmStorageReceipt,
    ) -> Result<Self::Ok, Self::Err> {
        let ConfirmStorageReceipt { order_id } = cmd;

        let (order, ()) = self
            .transit_order(order_id, Order::receive)
            .await
            .map_err(tracerr::wrap!())?;
        log::info!(%order_id, "`Order` goods are stored");

        Ok(order)
    }
}

/// Error of [`ConfirmStorageReceipt`] [`Command`] execution.
pub type ExecutionError = TransitionError;

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::order::{self, spec::order, DeliveryMode},
        error,
        infra::Database as _,
        spec::service,
        Command as _,
    };

    use super::ConfirmStorageReceipt;

    #[tokio::test]
    async fn marks_collected_goods_delivered() {
        let (svc, _inbox) = service();
        let mut o = order(1000);
        o.delivery_mode = DeliveryMode::PickupService;
        o.is_delivery_required = true;
        _ = o.confirm_payment(svc.today()).unwrap();
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let stored = svc
            .execute(ConfirmStorageReceipt { order_id: o.id })
            .await
            .unwrap();

        assert_eq!(stored.status, order::Status::InStorage);
        assert!(stored.is_delivered);
    }

    #[tokio::test]
    async fn requires_payment() {
        let (svc, _inbox) = service();
        let o = order(1000);
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let err = svc
            .execute(ConfirmStorageReceipt { order_id: o.id })
            .await
            .unwrap_err();

        assert_eq!(err.as_ref().kind(), error::Kind::InvalidTransition);
    }
}
