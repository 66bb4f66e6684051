//! Common machinery of [`Order`] lifecycle transitions.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{order, Order},
    error,
    infra::{database, Database},
    Service,
};

impl<Db> Service<Db>
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
    /// Applies the provided `transition` to the [`Order`] with the provided
    /// ID, while holding its lock.
    ///
    /// The [`Order`] is re-read under the lock, so the `transition` guards
    /// are checked against its committed state. Nothing is written if the
    /// `transition` fails.
    pub(crate) async fn transit_order<R, F>(
        &self,
        id: order::Id,
        transition: F,
    ) -> Result<(Order, R), Traced<TransitionError>>
    where
        F: FnOnce(&mut Order) -> Result<R, order::InvalidTransition>,
    {
        use TransitionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent transitions of the same `Order`.
        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut order = tx
            .execute(Select(By::<Option<Order>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(id))
            .map_err(tracerr::wrap!())?;

        let outcome = transition(&mut order)
            .map_err(E::InvalidTransition)
            .map_err(tracerr::wrap!())?;

        tx.execute(Update(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok((order, outcome))
    }
}

/// Error of an [`Order`] lifecycle transition.
#[derive(Debug, Display, Error, From)]
pub enum TransitionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Transition is not permitted in the current [`order::Status`].
    #[display("{_0}")]
    #[from]
    InvalidTransition(order::InvalidTransition),

    /// [`Order`] with the provided ID does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    OrderNotExists(#[error(not(source))] order::Id),
}

impl TransitionError {
    /// Returns [`error::Kind`] of this [`TransitionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(_) => error::Kind::Internal,
            Self::InvalidTransition(_) => error::Kind::InvalidTransition,
            Self::OrderNotExists(_) => error::Kind::NotFound,
        }
    }
}
