//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod error;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::{error::Error, sync::Arc};

use common::{
    operations::{By, Start},
    Date, DateTime,
};
use time::UtcOffset;
use tokio::sync::Mutex;

use crate::{
    domain::Catalog,
    infra::{notifier::Inbox, payment, Outbox},
};
#[cfg(doc)]
use crate::infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [`Catalog`] of the rented units.
    pub catalog: Arc<Catalog>,

    /// Builder of payment links.
    pub payment: payment::Link,

    /// [`UtcOffset`] of the warehouse calendar.
    pub utc_offset: UtcOffset,

    /// [`task::SweepOrders`] configuration.
    pub sweep_orders: task::sweep_orders::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Outbox`] of the [`Notification`]s to be delivered.
    ///
    /// [`Notification`]: domain::Notification
    outbox: Outbox,

    /// Guard preventing [`task::SweepOrders`] runs from overlapping.
    sweep_lock: Arc<Mutex<()>>,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, along with the
    /// [`task::Background`] running its [`Task`]s.
    ///
    /// [`Notification`]s are delivered via the provided `notifier`.
    ///
    /// [`Notification`]: domain::Notification
    pub fn new<N>(
        config: Config,
        database: Db,
        notifier: N,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<By<task::SweepOrders, task::sweep_orders::Config>>,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
        task::DispatchNotifications<N>:
            Task<Start<Inbox>, Ok = (), Err: Error> + 'static,
    {
        let (outbox, inbox) = Outbox::new();
        let this = Self::from_parts(config, database, outbox);

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("SweepOrders", async move {
            svc.execute(Start(By::new(svc.config().sweep_orders))).await
        });
        bg.spawn("DispatchNotifications", async move {
            task::DispatchNotifications::new(notifier)
                .execute(Start(inbox))
                .await
        });

        (this, bg)
    }

    /// Creates a new [`Service`] pushing [`Notification`]s into the provided
    /// [`Outbox`], without any [`Task`]s running.
    ///
    /// [`Notification`]: domain::Notification
    pub(crate) fn from_parts(
        config: Config,
        database: Db,
        outbox: Outbox,
    ) -> Self {
        Self {
            config,
            database,
            outbox,
            sweep_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Outbox`] of this [`Service`].
    #[must_use]
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Returns [`Catalog`] of this [`Service`].
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.config.catalog
    }

    /// Returns the current [`Date`] of the warehouse calendar.
    #[must_use]
    pub fn today(&self) -> Date {
        DateTime::now().date_at(self.config.utc_offset)
    }
}

#[cfg(test)]
pub(crate) mod spec {
    use std::{
        str::FromStr as _,
        sync::{
            atomic::{AtomicI64, Ordering},
            Arc,
        },
    };

    use common::{money::Currency, Money};
    use rust_decimal::Decimal;
    use time::UtcOffset;

    use crate::{
        command::GetOrCreateUser,
        domain::{
            catalog::{Delivery, Keywords},
            unit, user, Catalog, Unit, User,
        },
        infra::{notifier::Inbox, payment, Memory, Outbox},
        task, Command as _, Config, Service,
    };

    /// Next [`user::ChatId`] to be used by [`user()`].
    static CHAT_ID: AtomicI64 = AtomicI64::new(1);

    fn unit(id: &str, rate: i64) -> Unit {
        Unit {
            id: unit::Id::new(id).unwrap(),
            name: format!("{id} unit"),
            size: String::new(),
            dimensions: String::new(),
            description: String::new(),
            price_per_month: Money::new(rate, Currency::Rub),
        }
    }

    /// Creates a new [`Service`] over an empty [`Memory`] database, along
    /// with the [`Inbox`] of its [`Notification`]s.
    ///
    /// The catalog offers a `small` unit for 1000 RUB and a `medium` one for
    /// 3000 RUB per month, with self-delivery priced at 80%.
    ///
    /// [`Notification`]: crate::domain::Notification
    pub(crate) fn service() -> (Service<Memory>, Inbox) {
        let catalog = Catalog::new(
            vec![unit("small", 1000), unit("medium", 3000)],
            Delivery::new(Decimal::from_str("0.8").unwrap()).unwrap(),
            Keywords::default(),
        )
        .unwrap();
        let config = Config {
            catalog: Arc::new(catalog),
            payment: payment::Link::new("https://pay.example.com/checkout")
                .unwrap(),
            utc_offset: UtcOffset::UTC,
            sweep_orders: task::sweep_orders::Config::default(),
        };

        let (outbox, inbox) = Outbox::new();
        (Service::from_parts(config, Memory::new(), outbox), inbox)
    }

    /// Creates a new [`User`] in the provided [`Service`].
    pub(crate) async fn user(svc: &Service<Memory>) -> User {
        let chat_id =
            user::ChatId::from(CHAT_ID.fetch_add(1, Ordering::Relaxed));
        svc.execute(GetOrCreateUser { chat_id }).await.unwrap()
    }
}
