//! [`Command`] for expiring an overdue [`Order`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::{order, Order},
    infra::{database, Database},
    Service,
};

use super::{Command, TransitionError};

/// [`Command`] for expiring a stored [`Order`] whose rental is over.
///
/// Returns the expired [`Order`], or [`None`] if its rental isn't over as of
/// [`ExpireOrder::today`].
#[derive(Clone, Copy, Debug)]
pub struct ExpireOrder {
    /// ID of the [`Order`] to be expired.
    pub order_id: order::Id,

    /// Current [`Date`].
    pub today: Date,
}

impl<Db> Command<ExpireOrder> for Service<Db>
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
    type Ok = Option<Order>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ExpireOrder) -> Result<Self::Ok, Self::Err> {
        let ExpireOrder { order_id, today } = cmd;

        let (order, expired) = self
            .transit_order(order_id, |o| o.expire(today))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(expired.then_some(order))
    }
}

/// Error of [`ExpireOrder`] [`Command`] execution.
pub type ExecutionError = TransitionError;
