//! Postgres database clients.

use std::sync::Arc;

use futures::TryFutureExt as _;
use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{
        self,
        connection::{Pool, Pooled, Transaction},
        Connection,
    },
};

/// Non-transactional Postgres database client.
///
/// Lazily retrieves a single [`Pooled`] connection shared by all its clones.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`Pool`] to retrieve [`Pooled`] connections from.
    pub(crate) pool: Pool,

    /// [`Pooled`] connection, once retrieved.
    pooled: Arc<OnceCell<Pooled>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client retrieving its connection from the
    /// provided [`Pool`].
    #[must_use]
    pub(crate) fn new(pool: Pool) -> Self {
        Self {
            pool,
            pooled: Arc::new(OnceCell::new()),
        }
    }

    /// Returns the [`Pooled`] connection of this [`NonTx`] client,
    /// retrieving it first if necessary.
    async fn pooled(&self) -> Result<&Pooled, Traced<database::Error>> {
        self.pooled
            .get_or_try_init(|| {
                self.pool
                    .get()
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            })
            .await
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + Send + Sync + ?Sized,
    {
        Connection::query(self.pooled().await?, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + Send + Sync + ?Sized,
    {
        Connection::query_opt(self.pooled().await?, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + Send + Sync + ?Sized,
    {
        Connection::exec(self.pooled().await?, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Transactional Postgres database client.
///
/// The transaction is begun lazily on the first statement, and is rolled back
/// once the last clone of this client is dropped without [`Tx::commit()`].
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`Pool`] to retrieve a [`Pooled`] connection for the transaction.
    pool: Pool,

    /// Begun [`Transaction`], if any.
    tx: Arc<Mutex<Option<Transaction>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client out of the provided [`NonTx`] one.
    #[must_use]
    pub fn from_non_tx(client: &NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            tx: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the [`Transaction`] of this [`Tx`] client, beginning it first
    /// if necessary.
    async fn begun(
        &self,
    ) -> Result<MutexGuard<'_, Option<Transaction>>, Traced<database::Error>>
    {
        let mut tx = self.tx.lock().await;
        if tx.is_none() {
            let pooled = self
                .pool
                .get()
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)?;
            *tx = Some(
                Transaction::begin(pooled)
                    .await
                    .map_err(tracerr::wrap!())?,
            );
        }
        Ok(tx)
    }

    /// Commits this [`Tx`] client.
    ///
    /// Does nothing if no statement was run inside it.
    ///
    /// # Errors
    ///
    /// If failed to commit the [`Transaction`] of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.lock().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + Send + Sync + ?Sized,
    {
        let tx = self.begun().await?;
        let tx = tx
            .as_ref()
            .and_then(Transaction::get)
            .ok_or_else(committed)?;
        Connection::query(tx, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + Send + Sync + ?Sized,
    {
        let tx = self.begun().await?;
        let tx = tx
            .as_ref()
            .and_then(Transaction::get)
            .ok_or_else(committed)?;
        Connection::query_opt(tx, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + Send + Sync + ?Sized,
    {
        let tx = self.begun().await?;
        let tx = tx
            .as_ref()
            .and_then(Transaction::get)
            .ok_or_else(committed)?;
        Connection::exec(tx, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Creates an error of using an already committed [`Transaction`].
fn committed() -> Traced<database::Error> {
    tracerr::map_from(tracerr::new!(postgres::Error::Committed))
}
