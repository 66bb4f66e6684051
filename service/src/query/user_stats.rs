//! [`UserStats`] definition.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, Order, User},
    error,
    infra::{database, Database},
    read::{order::list::Filter, user::Stats},
    Query, Service,
};

/// [`Query`] computing spending [`Stats`] of a [`User`].
#[derive(Clone, Copy, Debug)]
pub struct UserStats {
    /// ID of the [`User`].
    pub user_id: user::Id,
}

impl<Db> Query<UserStats> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Order>, Filter>>,
            Ok = Vec<Order>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Stats;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        UserStats { user_id }: UserStats,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        _ = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        let orders = self
            .database()
            .execute(Select(By::<Vec<Order>, _>::new(Filter {
                user_id: Some(user_id),
                ..Filter::default()
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Stats::compute(&orders, self.catalog().currency()))
    }
}

/// Error of [`UserStats`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

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
        }
    }
}
