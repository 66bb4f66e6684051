//! Infrastructure layer.

pub mod database;
pub mod notifier;
pub mod payment;

pub use self::{
    database::{Database, Memory},
    notifier::{Notifier, Outbox},
};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
