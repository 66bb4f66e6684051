//! In-memory [`Database`] implementation.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError},
};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use tokio::sync::OwnedMutexGuard;
use tracerr::Traced;

use crate::{
    domain::{order, promo, user, Order, PromoCode, User},
    infra::database::{self, Database},
    read,
};

/// In-memory [`Database`].
///
/// Supports the same operations as the [`Postgres`] one, including
/// per-entity locks held until a [`Commit`]. Outside a transaction writes are
/// applied immediately.
///
/// [`Postgres`]: crate::infra::Postgres
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Shared [`Storage`].
    storage: Arc<Storage>,

    /// State of the transaction this [`Memory`] runs in, if any.
    ///
    /// Dropping its last clone without a [`Commit`] discards the staged
    /// writes and releases the taken locks.
    tx: Option<Arc<Mutex<TxState>>>,
}

/// State of a [`Memory`] transaction.
#[derive(Debug, Default)]
struct TxState {
    /// Staged writes, in the order they were made.
    writes: Vec<Write>,

    /// Taken locks.
    guards: Vec<OwnedMutexGuard<()>>,

    /// Keys of the taken locks.
    keys: HashSet<LockKey>,
}

/// Shared state of a [`Memory`] database.
#[derive(Debug, Default)]
struct Storage {
    /// Committed [`Data`].
    data: Mutex<Data>,

    /// Mutexes backing the [`Lock`] operation.
    locks: Mutex<HashMap<LockKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl Storage {
    /// Returns the mutex backing the lock of the provided [`LockKey`].
    fn mutex(&self, key: LockKey) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default(),
        )
    }
}

/// Stored entities.
#[derive(Clone, Debug, Default)]
struct Data {
    /// Stored [`Order`]s.
    orders: HashMap<order::Id, Order>,

    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`PromoCode`]s.
    promo_codes: HashMap<promo::Code, PromoCode>,
}

impl Data {
    /// Applies the provided [`Write`] to this [`Data`].
    ///
    /// Returns `false` if the [`Write`] was discarded.
    fn apply(&mut self, write: Write) -> bool {
        match write {
            Write::Order(o) => {
                drop(self.orders.insert(o.id, o));
                true
            }
            Write::User(u) => {
                if self.user_by_chat(u.chat_id).is_some() {
                    return false;
                }
                drop(self.users.insert(u.id, u));
                true
            }
            Write::PromoCode(p) => {
                drop(self.promo_codes.insert(p.code.clone(), p));
                true
            }
        }
    }

    /// Returns the [`User`] with the provided [`user::ChatId`], if any.
    fn user_by_chat(&self, chat_id: user::ChatId) -> Option<&User> {
        self.users.values().find(|u| u.chat_id == chat_id)
    }
}

/// Write operation over [`Data`].
#[derive(Clone, Debug)]
enum Write {
    /// Upsert of an [`Order`].
    Order(Order),

    /// Insert of a [`User`] unless its [`user::ChatId`] is taken.
    User(User),

    /// Upsert of a [`PromoCode`].
    PromoCode(PromoCode),
}

/// Key of a [`Lock`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum LockKey {
    /// Lock of an [`Order`].
    Order(order::Id),

    /// Lock of a [`PromoCode`].
    PromoCode(promo::Code),
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the provided `f` over the [`Data`] visible to this [`Memory`].
    fn read<R>(&self, f: impl FnOnce(&Data) -> R) -> R {
        let committed =
            self.storage.data.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = &self.tx else {
            return f(&committed);
        };
        let mut data = committed.clone();
        drop(committed);
        for w in &tx.lock().unwrap_or_else(PoisonError::into_inner).writes {
            _ = data.apply(w.clone());
        }
        f(&data)
    }

    /// Performs the provided [`Write`], staging it inside a transaction.
    ///
    /// Returns `false` if the [`Write`] is discarded.
    fn write(&self, write: Write) -> bool {
        let Some(tx) = &self.tx else {
            return self
                .storage
                .data
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .apply(write);
        };
        let applicable = self.read(|data| data.clone().apply(write.clone()));
        if applicable {
            tx.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .writes
                .push(write);
        }
        applicable
    }

    /// Takes the lock of the provided [`LockKey`] until a [`Commit`], unless
    /// it's held by this transaction already.
    ///
    /// Does nothing outside a transaction.
    async fn lock(&self, key: LockKey) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys
            .contains(&key)
        {
            return;
        }
        let guard = self.storage.mutex(key.clone()).lock_owned().await;
        let mut state = tx.lock().unwrap_or_else(PoisonError::into_inner);
        state.guards.push(guard);
        _ = state.keys.insert(key);
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Self {
            storage: Arc::clone(&self.storage),
            tx: Some(self.tx.clone().unwrap_or_default()),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Some(tx) = &self.tx else {
            return Ok(());
        };
        let (writes, guards) = {
            let mut state = tx.lock().unwrap_or_else(PoisonError::into_inner);
            state.keys.clear();
            (
                std::mem::take(&mut state.writes),
                std::mem::take(&mut state.guards),
            )
        };
        {
            let mut data = self
                .storage
                .data
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            for w in writes {
                _ = data.apply(w);
            }
        }
        drop(guards);
        Ok(())
    }
}

impl Database<Select<By<Option<Order>, order::Id>>> for Memory {
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|d| d.orders.get(&id).cloned()))
    }
}

impl Database<Select<By<Vec<Order>, read::order::list::Filter>>>
    for Memory
{
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, read::order::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let mut orders = self.read(|d| {
            d.orders
                .values()
                .filter(|o| filter.matches(o))
                .cloned()
                .collect::<Vec<_>>()
        });
        orders.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id))
        });
        Ok(orders)
    }
}

impl Database<Insert<Order>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.write(Write::Order(order));
        Ok(())
    }
}

impl Database<Update<Order>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.write(Write::Order(order));
        Ok(())
    }
}

impl Database<Lock<By<Order, order::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(LockKey::Order(by.into_inner())).await;
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|d| d.users.get(&id).cloned()))
    }
}

impl Database<Select<By<Option<User>, user::ChatId>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::ChatId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let chat_id = by.into_inner();
        Ok(self.read(|d| d.user_by_chat(chat_id).cloned()))
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.write(Write::User(user)))
    }
}

impl Database<Select<By<Option<PromoCode>, promo::Code>>>
    for Memory
{
    type Ok = Option<PromoCode>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<PromoCode>, promo::Code>>,
    ) -> Result<Self::Ok, Self::Err> {
        let code = by.into_inner();
        Ok(self.read(|d| d.promo_codes.get(&code).cloned()))
    }
}

impl Database<Select<By<Vec<PromoCode>, ()>>> for Memory {
    type Ok = Vec<PromoCode>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<PromoCode>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut codes =
            self.read(|d| d.promo_codes.values().cloned().collect::<Vec<_>>());
        codes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.code.as_ref().cmp(b.code.as_ref()))
        });
        Ok(codes)
    }
}

impl Database<Insert<PromoCode>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(promo): Insert<PromoCode>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.write(Write::PromoCode(promo));
        Ok(())
    }
}

impl Database<Update<PromoCode>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(promo): Update<PromoCode>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.write(Write::PromoCode(promo));
        Ok(())
    }
}

impl Database<Lock<By<PromoCode, promo::Code>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<PromoCode, promo::Code>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(LockKey::PromoCode(by.into_inner())).await;
        Ok(())
    }
}
