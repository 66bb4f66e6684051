//! [`User`]-related HTTP API definitions.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Extension, Json,
};
use common::{DateTime, Money};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, user},
    query,
    read::user::Stats as StatsRead,
    Command as _,
};

use crate::{auth::Authorized, AsError, Error, Service};

/// Customer identified by their chat platform account.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct User {
    /// ID of this [`User`].
    pub id: user::Id,

    /// Chat platform identity of this [`User`].
    pub chat_id: user::ChatId,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: DateTime,
}

impl From<domain::User> for User {
    fn from(u: domain::User) -> Self {
        Self {
            id: u.id,
            chat_id: u.chat_id,
            created_at: u.created_at.coerce(),
        }
    }
}

/// Spending statistics of a [`User`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Stats {
    /// Number of orders placed, including cancelled ones.
    pub total_orders: usize,

    /// Sum of final prices of the non-cancelled orders.
    pub total_spent: Money,

    /// Average final price of the non-cancelled orders.
    pub average_order_value: Money,
}

impl From<StatsRead> for Stats {
    fn from(s: StatsRead) -> Self {
        Self {
            total_orders: s.total_orders,
            total_spent: s.total_spent,
            average_order_value: s.average_order_value,
        }
    }
}

/// Request for resolving the [`User`] of a chat platform account.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct GetOrCreateRequest {
    /// Chat platform identity of the [`User`].
    pub chat_id: user::ChatId,
}

/// Returns the [`User`] of the chat platform account, registering a new one
/// on the first contact.
#[tracing::instrument(skip_all, fields(api.name = "getOrCreateUser"))]
pub async fn get_or_create(
    _: Authorized,
    Extension(service): Extension<Service>,
    req: Result<Json<GetOrCreateRequest>, JsonRejection>,
) -> Result<Json<User>, Error> {
    let Json(GetOrCreateRequest { chat_id }) =
        req.map_err(AsError::into_error)?;

    service
        .execute(command::GetOrCreateUser { chat_id })
        .await
        .map(|u| Json(u.into()))
        .map_err(AsError::into_error)
}

/// Returns spending [`Stats`] of the [`User`].
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_EXISTS` - no [`User`] with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "userStats"))]
pub async fn stats(
    _: Authorized,
    Extension(service): Extension<Service>,
    id: Result<Path<user::Id>, PathRejection>,
) -> Result<Json<Stats>, Error> {
    let Path(user_id) = id.map_err(AsError::into_error)?;

    service
        .execute(query::UserStats { user_id })
        .await
        .map(|s| Json(s.into()))
        .map_err(AsError::into_error)
}

impl AsError for command::get_or_create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserVanished(_) => None,
        }
    }
}

impl AsError for query::user_stats::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => {
                Error::of_kind(self.kind(), "USER_NOT_EXISTS", self)
            }
        }
    }
}
