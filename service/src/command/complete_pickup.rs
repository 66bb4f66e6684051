//! [`Command`] for completing an [`Order`] by picking its goods up.

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

/// [`Command`] for completing an [`Order`] once its goods are returned to
/// the customer.
#[derive(Clone, Copy, Debug)]
pub struct CompletePickup {
    /// ID of the [`Order`] to be completed.
    pub order_id: order::Id,
}

impl<Db> Command<CompletePickup> for Service<Db>
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
        cmd: CompletePickup,
    ) -> Result<Self::Ok, Self::Err> {
        let CompletePickup { order_id } = cmd;

        let (order, ()) = self
            .transit_order(order_id, Order::complete_pickup)
            .await
            .map_err(tracerr::wrap!())?;
        log::info!(%order_id, "`Order` is completed");

        Ok(order)
    }
}

/// Error of [`CompletePickup`] [`Command`] execution.
pub type ExecutionError = TransitionError;
