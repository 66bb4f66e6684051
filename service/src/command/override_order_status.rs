//! [`Command`] for overriding the status of an [`Order`].

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

/// [`Command`] for forcing an [`order::Status`] upon an [`Order`] by an
/// operator, bypassing the regular lifecycle.
#[derive(Clone, Copy, Debug)]
pub struct OverrideOrderStatus {
    /// ID of the [`Order`] to be updated.
    pub order_id: order::Id,

    /// New [`order::Status`] of the [`Order`].
    pub status: order::Status,
}

impl<Db> Command<OverrideOrderStatus> for Service<Db>
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
        cmd: OverrideOrderStatus,
    ) -> Result<Self::Ok, Self::Err> {
        let OverrideOrderStatus { order_id, status } = cmd;
        let today = self.today();

        let (order, previous) = self
            .transit_order(order_id, |o| {
                let previous = o.status;
                o.override_status(status, today);
                Ok(previous)
            })
            .await
            .map_err(tracerr::wrap!())?;
        log::warn!(
            %order_id,
            from = %previous,
            to = %status,
            "`Order` status is overridden by an operator",
        );

        Ok(order)
    }
}

/// Error of [`OverrideOrderStatus`] [`Command`] execution.
pub type ExecutionError = TransitionError;

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::order::{self, spec::order},
        infra::Database as _,
        spec::service,
        Command as _,
    };

    use super::OverrideOrderStatus;

    #[tokio::test]
    async fn bypasses_lifecycle() {
        let (svc, _inbox) = service();
        let o = order(1000);
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let stored = svc
            .execute(OverrideOrderStatus {
                order_id: o.id,
                status: order::Status::InStorage,
            })
            .await
            .unwrap();

        assert_eq!(stored.status, order::Status::InStorage);
        assert_eq!(stored.start_date.map(|d| d.coerce()), Some(svc.today()));
        assert!(stored.end_date.is_some());
    }
}
