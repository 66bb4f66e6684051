//! [`Command`] for recording an expiry reminder of an [`Order`].

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

/// [`Command`] for recording an expiry reminder of a stored [`Order`], if
/// it's due.
///
/// Returns the reminded [`Order`] along with the matched threshold in days,
/// or [`None`] if no reminder is due as of [`RecordReminder::today`]. A
/// reminder is never due twice a day, so repeated sweeps don't remind twice.
#[derive(Clone, Copy, Debug)]
pub struct RecordReminder {
    /// ID of the [`Order`] to be reminded about.
    pub order_id: order::Id,

    /// Current [`Date`].
    pub today: Date,
}

impl<Db> Command<RecordReminder> for Service<Db>
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
    type Ok = Option<(Order, u8)>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordReminder,
    ) -> Result<Self::Ok, Self::Err> {
        let RecordReminder { order_id, today } = cmd;

        let (order, threshold) = self
            .transit_order(order_id, |o| Ok(o.remind(today)))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(threshold.map(|t| (order, t)))
    }
}

/// Error of [`RecordReminder`] [`Command`] execution.
pub type ExecutionError = TransitionError;
