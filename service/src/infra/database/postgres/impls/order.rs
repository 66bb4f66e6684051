//! [`Order`]-related [`Database`] implementations.

use common::{
    money::Currency,
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        order::{self, Contact},
        Order,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `orders` table, in the order [`order_from_row()`] expects.
const COLUMNS: &str = "\
    id, user_id, unit_id, term, delivery_mode, \
    phone, email, name, address, preferred_time, \
    promo_code, discount, currency, base_price, final_price, \
    start_date, end_date, is_delivery_required, is_delivered, \
    status, last_reminded_on, created_at";

/// Reconstructs an [`Order`] from the provided `orders` table [`Row`].
fn order_from_row(row: &Row) -> Order {
    let currency: Currency = row.get("currency");
    let money = |col: &str| Money::new(row.get::<_, Decimal>(col), currency);
    Order {
        id: row.get("id"),
        user_id: row.get("user_id"),
        unit_id: row.get("unit_id"),
        term: row.get("term"),
        delivery_mode: row.get("delivery_mode"),
        contact: Contact {
            phone: row.get("phone"),
            email: row.get("email"),
            name: row.get("name"),
        },
        address: row.get("address"),
        preferred_time: row.get("preferred_time"),
        promo_code: row.get("promo_code"),
        discount: row.get("discount"),
        base_price: money("base_price"),
        final_price: money("final_price"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        is_delivery_required: row.get("is_delivery_required"),
        is_delivered: row.get("is_delivered"),
        status: row.get("status"),
        last_reminded_on: row.get("last_reminded_on"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Order>, order::Id>>> for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!("SELECT {COLUMNS} FROM orders WHERE id = $1::UUID");
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(order_from_row))
    }
}

impl<C> Database<Select<By<Vec<Order>, read::order::list::Filter>>>
    for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, read::order::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::order::list::Filter {
            status,
            user_id,
            ends_before,
            awaiting_delivery,
        } = by.into_inner();
        let paid = order::Status::Paid;

        let sql = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE ($1::INT2 IS NULL OR status = $1::INT2) \
               AND ($2::UUID IS NULL OR user_id = $2::UUID) \
               AND ($3::DATE IS NULL OR end_date < $3::DATE) \
               AND (NOT $4::BOOL \
                    OR (status = $5::INT2 \
                        AND is_delivery_required \
                        AND NOT is_delivered)) \
             ORDER BY created_at DESC",
        );
        Ok(self
            .query(
                sql.as_str(),
                &[&status, &user_id, &ends_before, &awaiting_delivery, &paid],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(order_from_row)
            .collect())
    }
}

impl<C> Database<Insert<Order>> for Postgres<C>
where
    C: Connection + Sync,
    Self: Database<Update<Order>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(order)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Order>> for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        let Order {
            id,
            user_id,
            unit_id,
            term,
            delivery_mode,
            contact: Contact { phone, email, name },
            address,
            preferred_time,
            promo_code,
            discount,
            base_price,
            final_price,
            start_date,
            end_date,
            is_delivery_required,
            is_delivered,
            status,
            last_reminded_on,
            created_at,
        } = order;

        const SQL: &str = "\
            INSERT INTO orders (\
                id, user_id, unit_id, term, delivery_mode, \
                phone, email, name, address, preferred_time, \
                promo_code, discount, currency, base_price, final_price, \
                start_date, end_date, is_delivery_required, is_delivered, \
                status, last_reminded_on, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::INT2, $5::INT2, \
                $6::VARCHAR, $7::VARCHAR, $8::VARCHAR, $9::VARCHAR, \
                $10::VARCHAR, \
                $11::VARCHAR, $12::NUMERIC, $13::INT2, $14::NUMERIC, \
                $15::NUMERIC, \
                $16::DATE, $17::DATE, $18::BOOL, $19::BOOL, \
                $20::INT2, $21::DATE, $22::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET final_price = EXCLUDED.final_price, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                is_delivered = EXCLUDED.is_delivered, \
                status = EXCLUDED.status, \
                last_reminded_on = EXCLUDED.last_reminded_on";
        self.exec(
            SQL,
            &[
                &id,
                &user_id,
                &unit_id,
                &term,
                &delivery_mode,
                &phone,
                &email,
                &name,
                &address,
                &preferred_time,
                &promo_code,
                &discount,
                &base_price.currency,
                &base_price.amount,
                &final_price.amount,
                &start_date,
                &end_date,
                &is_delivery_required,
                &is_delivered,
                &status,
                &last_reminded_on,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Order, order::Id>>> for Postgres<C>
where
    C: Connection + Sync,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: order::Id = by.into_inner();

        // Conflicting update takes the row lock even if it already exists.
        const SQL: &str = "\
            INSERT INTO orders_lock (id) \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.lock_row(SQL, &id).await
    }
}
