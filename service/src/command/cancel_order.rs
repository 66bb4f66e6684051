//! [`Command`] for cancelling an [`Order`].

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

/// [`Command`] for cancelling an [`Order`] before its goods are stored.
#[derive(Clone, Copy, Debug)]
pub struct CancelOrder {
    /// ID of the [`Order`] to be cancelled.
    pub order_id: order::Id,
}

impl<Db> Command<CancelOrder> for Service<Db>
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

    async fn execute(&self, cmd: CancelOrder) -> Result<Self::Ok, Self::Err> {
        let CancelOrder { order_id } = cmd;

        let (order, ()) = self
            .transit_order(order_id, Order::cancel)
            .await
            .map_err(tracerr::wrap!())?;
        log::info!(%order_id, "`Order` is cancelled");

        Ok(order)
    }
}

/// Error of [`CancelOrder`] [`Command`] execution.
pub type ExecutionError = TransitionError;
