//! Payment provider callbacks.

use axum::{
    extract::{rejection::PathRejection, Path},
    Extension, Json,
};
use service::{command, domain::order, Command as _};

use crate::{api::Order, auth::Authorized, AsError, Error, Service};

/// Confirms the [`Order`] is paid, starting its rental.
///
/// Repeated confirmations of an already paid [`Order`] change nothing.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_TRANSITION` - [`Order`] is cancelled or its rental is already
///                          running;
/// - `ORDER_NOT_EXISTS` - no [`Order`] with the provided ID exists.
#[tracing::instrument(
    skip_all,
    fields(api.name = "confirmPayment", order.id = tracing::field::Empty),
)]
pub async fn confirm(
    _: Authorized,
    Extension(service): Extension<Service>,
    id: Result<Path<order::Id>, PathRejection>,
) -> Result<Json<Order>, Error> {
    let Path(order_id) = id.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("order.id", tracing::field::display(order_id));

    service
        .execute(command::ConfirmPayment { order_id })
        .await
        .map(|o| Json(o.into()))
        .map_err(AsError::into_error)
}
