//! [`PromoCode`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{promo, PromoCode},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Reconstructs a [`PromoCode`] from the provided `promo_codes` table
/// [`Row`].
fn promo_code_from_row(row: &Row) -> PromoCode {
    PromoCode {
        code: row.get("code"),
        discount: row.get("discount"),
        active_from: row.get("active_from"),
        active_to: row.get("active_to"),
        is_active: row.get("is_active"),
        is_advertising: row.get("is_advertising"),
        usage_count: row.get("usage_count"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<PromoCode>, promo::Code>>> for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = Option<PromoCode>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<PromoCode>, promo::Code>>,
    ) -> Result<Self::Ok, Self::Err> {
        let code = by.into_inner();

        const SQL: &str = "\
            SELECT code, discount, active_from, active_to, \
                   is_active, is_advertising, usage_count, created_at \
            FROM promo_codes \
            WHERE code = $1::VARCHAR";
        Ok(self
            .query_opt(SQL, &[&code])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(promo_code_from_row))
    }
}

impl<C> Database<Select<By<Vec<PromoCode>, ()>>> for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = Vec<PromoCode>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<PromoCode>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT code, discount, active_from, active_to, \
                   is_active, is_advertising, usage_count, created_at \
            FROM promo_codes \
            ORDER BY created_at DESC, code";
        Ok(self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(promo_code_from_row)
            .collect())
    }
}

impl<C> Database<Insert<PromoCode>> for Postgres<C>
where
    C: Connection + Sync,
    Self: Database<Update<PromoCode>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(promo): Insert<PromoCode>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(promo)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<PromoCode>> for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(promo): Update<PromoCode>,
    ) -> Result<Self::Ok, Self::Err> {
        let PromoCode {
            code,
            discount,
            active_from,
            active_to,
            is_active,
            is_advertising,
            usage_count,
            created_at,
        } = promo;

        const SQL: &str = "\
            INSERT INTO promo_codes (\
                code, discount, active_from, active_to, \
                is_active, is_advertising, usage_count, created_at\
            ) \
            VALUES (\
                $1::VARCHAR, $2::NUMERIC, $3::DATE, $4::DATE, \
                $5::BOOL, $6::BOOL, $7::INT4, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (code) DO UPDATE \
            SET discount = EXCLUDED.discount, \
                active_from = EXCLUDED.active_from, \
                active_to = EXCLUDED.active_to, \
                is_active = EXCLUDED.is_active, \
                is_advertising = EXCLUDED.is_advertising, \
                usage_count = EXCLUDED.usage_count";
        self.exec(
            SQL,
            &[
                &code,
                &discount,
                &active_from,
                &active_to,
                &is_active,
                &is_advertising,
                &usage_count,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<PromoCode, promo::Code>>> for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<PromoCode, promo::Code>>,
    ) -> Result<Self::Ok, Self::Err> {
        let code: promo::Code = by.into_inner();

        const SQL: &str = "\
            INSERT INTO promo_codes_lock (code) \
            VALUES ($1::VARCHAR) \
            ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code";
        self.lock_row(SQL, &code).await
    }
}
