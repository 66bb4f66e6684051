//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Reconstructs a [`User`] from the provided `users` table [`Row`].
fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, chat_id, created_at \
            FROM users \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(user_from_row))
    }
}

impl<C> Database<Select<By<Option<User>, user::ChatId>>> for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::ChatId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let chat_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, chat_id, created_at \
            FROM users \
            WHERE chat_id = $1::INT8";
        Ok(self
            .query_opt(SQL, &[&chat_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(user_from_row))
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection + Sync,
{
    /// Indicator whether the [`User`] was inserted, or another one with the
    /// same [`user::ChatId`] exists already.
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            chat_id,
            created_at,
        } = user;

        const SQL: &str = "\
            INSERT INTO users (id, chat_id, created_at) \
            VALUES ($1::UUID, $2::INT8, $3::TIMESTAMPTZ) \
            ON CONFLICT (chat_id) DO NOTHING";
        self.exec(SQL, &[&id, &chat_id, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(|inserted| inserted > 0)
    }
}
