//! [`Command`] for getting a [`User`] by its chat identity, creating it if
//! necessary.

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    error,
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for getting a [`User`] by its [`user::ChatId`], creating a new
/// one on the first contact.
#[derive(Clone, Copy, Debug)]
pub struct GetOrCreateUser {
    /// [`user::ChatId`] of the [`User`].
    pub chat_id: user::ChatId,
}

impl<Db> Command<GetOrCreateUser> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::ChatId>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Ok = bool, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: GetOrCreateUser,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GetOrCreateUser { chat_id } = cmd;

        let existing = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(chat_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(u) = existing {
            return Ok(u);
        }

        let user = User {
            id: user::Id::new(),
            chat_id,
            created_at: DateTime::now().coerce(),
        };
        let inserted = self
            .database()
            .execute(Insert(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if inserted {
            return Ok(user);
        }

        // Lost the race to a concurrent creation.
        self.database()
            .execute(Select(By::<Option<User>, _>::new(chat_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserVanished(chat_id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`GetOrCreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] was neither inserted nor found.
    #[display("`User(chat_id: {_0})` is neither inserted nor found")]
    UserVanished(#[error(not(source))] user::ChatId),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(_) | Self::UserVanished(_) => error::Kind::Internal,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{domain::user, spec::service, Command as _};

    use super::GetOrCreateUser;

    #[tokio::test]
    async fn creates_once() {
        let (svc, _inbox) = service();
        let chat_id = user::ChatId::from(100_500);

        let (first, second) = tokio::join!(
            svc.execute(GetOrCreateUser { chat_id }),
            svc.execute(GetOrCreateUser { chat_id }),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.id, second.id);
        assert_eq!(first.chat_id, chat_id);

        let third = svc.execute(GetOrCreateUser { chat_id }).await.unwrap();
        assert_eq!(third.id, first.id);
    }
}
