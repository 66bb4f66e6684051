//! HTTP API definitions.

pub mod catalog;
pub mod order;
pub mod payment;
pub mod promo_code;
pub mod sweep;
pub mod user;

use axum::{
    routing::{get, post},
    Router,
};
use service::command;

#[cfg(doc)]
use crate::{auth::Secret, Service};
use crate::{AsError, Error};

pub use self::{order::Order, promo_code::PromoCode, user::User};

/// Builds the [`Router`] of the HTTP API.
///
/// Expects the [`Service`] and the [`Secret`] to be provided as
/// [`Extension`]s.
///
/// [`Extension`]: axum::Extension
pub fn router() -> Router {
    Router::new()
        .route("/units", get(catalog::units))
        .route("/items/classify", post(catalog::classify_item))
        .route("/price", post(order::price))
        .route("/users", post(user::get_or_create))
        .route("/users/:id/stats", get(user::stats))
        .route("/orders", get(order::list).post(order::create))
        .route("/orders/:id", get(order::get))
        .route("/orders/:id/payment", post(order::initiate_payment))
        .route("/orders/:id/storage", post(order::confirm_storage_receipt))
        .route("/orders/:id/extend", post(order::extend))
        .route("/orders/:id/pickup", post(order::complete_pickup))
        .route("/orders/:id/cancel", post(order::cancel))
        .route("/orders/:id/status", post(order::override_status))
        .route("/payments/:order_id/confirm", post(payment::confirm))
        .route(
            "/promo-codes",
            get(promo_code::list).post(promo_code::create),
        )
        .route("/promo-codes/:code/validation", get(promo_code::validate))
        .route("/promo-codes/:code/active", post(promo_code::set_active))
        .route("/sweep", post(sweep::run))
}

impl AsError for command::TransitionError {
    fn try_as_error(&self) -> Option<Error> {
        let code = match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::OrderNotExists(_) => "ORDER_NOT_EXISTS",
        };
        Error::of_kind(self.kind(), code, self)
    }
}
