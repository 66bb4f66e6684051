//! [`Order`]-related HTTP API definitions.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Extension, Json,
};
use common::{Date, DateTime, Money, Percent};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, order, pricing::Breakdown, user},
    query,
    read::order::list::Filter,
    Command as _,
};

use crate::{auth::Authorized, define_error, AsError, Error, Service};

/// Rental of a storage unit by a customer.
#[derive(Clone, Debug, Serialize)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: order::Id,

    /// ID of the customer owning this [`Order`].
    pub user_id: user::Id,

    /// ID of the rented unit.
    pub unit_id: String,

    /// Number of months initially chosen for the rental.
    pub months: u8,

    /// Way the goods get to the warehouse.
    pub delivery_mode: order::DeliveryMode,

    /// Current lifecycle status of this [`Order`].
    pub status: order::Status,

    /// Phone number of the customer.
    pub phone: String,

    /// Email of the customer.
    pub email: String,

    /// Name of the customer, if provided.
    pub name: Option<String>,

    /// Address to collect the goods from.
    pub address: Option<String>,

    /// Time the customer prefers the goods to be collected at.
    pub preferred_time: Option<String>,

    /// Promo code applied to this [`Order`], if any.
    pub promo_code: Option<String>,

    /// Discount granted by the applied promo code.
    pub discount: Percent,

    /// Monthly rate of the rented unit.
    pub base_price: Money,

    /// Cumulative price of this [`Order`], including extensions.
    pub final_price: Money,

    /// [`Date`] the rental started at.
    pub start_date: Option<Date>,

    /// [`Date`] the rental ends at.
    pub end_date: Option<Date>,

    /// Indicator whether the goods should be collected from the customer.
    pub is_delivery_required: bool,

    /// Indicator whether the goods were collected from the customer.
    pub is_delivered: bool,

    /// [`DateTime`] when this [`Order`] was created.
    pub created_at: DateTime,
}

impl From<domain::Order> for Order {
    fn from(o: domain::Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            unit_id: o.unit_id.to_string(),
            months: o.term.months(),
            delivery_mode: o.delivery_mode,
            status: o.status,
            phone: o.contact.phone.to_string(),
            email: o.contact.email.to_string(),
            name: o.contact.name.map(|n| n.to_string()),
            address: o.address.map(|a| a.to_string()),
            preferred_time: o.preferred_time,
            promo_code: o.promo_code.map(|c| c.to_string()),
            discount: o.discount,
            base_price: o.base_price,
            final_price: o.final_price,
            start_date: o.start_date.map(|d| d.coerce()),
            end_date: o.end_date.map(|d| d.coerce()),
            is_delivery_required: o.is_delivery_required,
            is_delivered: o.is_delivered,
            created_at: o.created_at.coerce(),
        }
    }
}

/// Price of a rental, itemized.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Price {
    /// Price before any deductions.
    pub base: Money,

    /// Deduction for bringing the goods to the warehouse by the customer.
    pub self_delivery_deduction: Money,

    /// Deduction granted by the applied promo code.
    pub promo_deduction: Money,

    /// Price to be paid.
    pub total: Money,
}

impl From<Breakdown> for Price {
    fn from(b: Breakdown) -> Self {
        Self {
            base: b.base,
            self_delivery_deduction: b.self_delivery_deduction,
            promo_deduction: b.promo_deduction,
            total: b.total,
        }
    }
}

/// Request for placing a new [`Order`].
#[derive(Clone, Debug, Deserialize)]
pub struct CreateRequest {
    /// ID of the customer placing the [`Order`].
    pub user_id: user::Id,

    /// ID of the unit to rent.
    pub unit_id: String,

    /// Number of months to rent the unit for.
    pub months: u8,

    /// Way the goods get to the warehouse.
    pub delivery_mode: order::DeliveryMode,

    /// Phone number of the customer.
    pub phone: String,

    /// Email of the customer.
    pub email: String,

    /// Name of the customer.
    #[serde(default)]
    pub name: Option<String>,

    /// Address to collect the goods from.
    #[serde(default)]
    pub address: Option<String>,

    /// Time the customer prefers the goods to be collected at.
    #[serde(default)]
    pub preferred_time: Option<String>,

    /// Promo code to apply.
    #[serde(default)]
    pub promo_code: Option<String>,
}

/// Newly placed [`Order`] along with its [`Price`].
#[derive(Clone, Debug, Serialize)]
pub struct Created {
    /// Placed [`Order`].
    pub order: Order,

    /// [`Price`] the [`Order`] was placed with.
    pub price: Price,
}

/// Request for quoting a [`Price`] without placing an [`Order`].
#[derive(Clone, Debug, Deserialize)]
pub struct PriceRequest {
    /// ID of the unit to rent.
    pub unit_id: String,

    /// Number of months to rent the unit for.
    pub months: u8,

    /// Way the goods get to the warehouse.
    pub delivery_mode: order::DeliveryMode,

    /// Promo code to apply.
    #[serde(default)]
    pub promo_code: Option<String>,
}

/// Criteria of listing [`Order`]s.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Status the [`Order`]s should be in.
    pub status: Option<order::Status>,

    /// ID of the customer owning the [`Order`]s.
    pub user_id: Option<user::Id>,

    /// [`Date`] before which the rental should end.
    pub ends_before: Option<Date>,

    /// Indicator whether only the [`Order`]s with goods still to be
    /// collected should be listed.
    pub awaiting_delivery: bool,
}

impl From<ListParams> for Filter {
    fn from(p: ListParams) -> Self {
        Self {
            status: p.status,
            user_id: p.user_id,
            ends_before: p.ends_before,
            awaiting_delivery: p.awaiting_delivery,
        }
    }
}

/// Link the customer should follow to pay for an [`Order`].
#[derive(Clone, Debug, Serialize)]
pub struct Payment {
    /// URL of the payment provider's checkout page.
    pub reference: String,
}

/// Request for extending the rental of an [`Order`].
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ExtendRequest {
    /// Number of months to extend the rental by.
    pub months: u8,
}

/// Request for overriding the status of an [`Order`].
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct OverrideStatusRequest {
    /// New status of the [`Order`].
    pub status: order::Status,
}

/// Quotes the [`Price`] of a rental without any side effects.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_TERM` - rental term is not 1, 3 or 6 months;
/// - `PROMO_REJECTED` - provided promo code cannot be applied;
/// - `UNKNOWN_UNIT` - no unit with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "price"))]
pub async fn price(
    _: Authorized,
    Extension(service): Extension<Service>,
    req: Result<Json<PriceRequest>, JsonRejection>,
) -> Result<Json<Price>, Error> {
    let Json(req) = req.map_err(AsError::into_error)?;

    service
        .execute(query::ComputePrice {
            unit_id: req.unit_id,
            months: req.months,
            delivery_mode: req.delivery_mode,
            promo_code: req.promo_code,
        })
        .await
        .map(|b| Json(b.into()))
        .map_err(AsError::into_error)
}

/// Places a new [`Order`].
///
/// # Errors
///
/// Possible error codes:
/// - `ADDRESS_REQUIRED` - pickup service is chosen without an address;
/// - `INVALID_ADDRESS`, `INVALID_EMAIL`, `INVALID_NAME`, `INVALID_PHONE`,
///   `INVALID_PREFERRED_TIME` - provided contact info is malformed;
/// - `INVALID_TERM` - rental term is not 1, 3 or 6 months;
/// - `PROMO_REJECTED` - provided promo code cannot be applied;
/// - `UNKNOWN_UNIT` - no unit with the provided ID exists;
/// - `USER_NOT_EXISTS` - no customer with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "createOrder"))]
pub async fn create(
    _: Authorized,
    Extension(service): Extension<Service>,
    req: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<Created>, Error> {
    let Json(req) = req.map_err(AsError::into_error)?;

    let (order, price) = service
        .execute(command::CreateOrder {
            user_id: req.user_id,
            unit_id: req.unit_id,
            months: req.months,
            delivery_mode: req.delivery_mode,
            phone: req.phone,
            email: req.email,
            name: req.name,
            address: req.address,
            preferred_time: req.preferred_time,
            promo_code: req.promo_code,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Created {
        order: order.into(),
        price: price.into(),
    }))
}

/// Returns the [`Order`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `ORDER_NOT_EXISTS` - no [`Order`] with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "getOrder"))]
pub async fn get(
    _: Authorized,
    Extension(service): Extension<Service>,
    id: Result<Path<order::Id>, PathRejection>,
) -> Result<Json<Order>, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;

    service
        .execute(query::order::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|o| Json(o.into()))
        .ok_or_else(|| OrderError::NotExists.into())
}

/// Lists [`Order`]s matching the provided [`ListParams`], most recent first.
#[tracing::instrument(skip_all, fields(api.name = "listOrders"))]
pub async fn list(
    _: Authorized,
    Extension(service): Extension<Service>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Order>>, Error> {
    let Query(params) = params.map_err(AsError::into_error)?;

    service
        .execute(query::ListOrders::by(params.into()))
        .await
        .map(|orders| Json(orders.into_iter().map(Into::into).collect()))
        .map_err(AsError::into_error)
}

/// Builds the [`Payment`] link for the [`Order`] awaiting payment.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_TRANSITION` - [`Order`] doesn't await payment;
/// - `ORDER_NOT_EXISTS` - no [`Order`] with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "initiatePayment"))]
pub async fn initiate_payment(
    _: Authorized,
    Extension(service): Extension<Service>,
    id: Result<Path<order::Id>, PathRejection>,
) -> Result<Json<Payment>, Error> {
    let Path(order_id) = id.map_err(AsError::into_error)?;

    service
        .execute(command::InitiatePayment { order_id })
        .await
        .map(|r| {
            Json(Payment {
                reference: r.to_string(),
            })
        })
        .map_err(AsError::into_error)
}

/// Confirms the goods of the paid [`Order`] are received by the warehouse.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_TRANSITION` - [`Order`] is not paid;
/// - `ORDER_NOT_EXISTS` - no [`Order`] with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "confirmStorageReceipt"))]
pub async fn confirm_storage_receipt(
    _: Authorized,
    Extension(service): Extension<Service>,
    id: Result<Path<order::Id>, PathRejection>,
) -> Result<Json<Order>, Error> {
    let Path(order_id) = id.map_err(AsError::into_error)?;

    service
        .execute(command::ConfirmStorageReceipt { order_id })
        .await
        .map(|o| Json(o.into()))
        .map_err(AsError::into_error)
}

/// Extends the rental of the [`Order`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_TERM` - extension is not 1, 3 or 6 months;
/// - `INVALID_TRANSITION` - [`Order`] rental is not running;
/// - `ORDER_NOT_EXISTS` - no [`Order`] with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "extendOrder"))]
pub async fn extend(
    _: Authorized,
    Extension(service): Extension<Service>,
    id: Result<Path<order::Id>, PathRejection>,
    req: Result<Json<ExtendRequest>, JsonRejection>,
) -> Result<Json<Order>, Error> {
    let Path(order_id) = id.map_err(AsError::into_error)?;
    let Json(ExtendRequest { months }) = req.map_err(AsError::into_error)?;

    service
        .execute(command::ExtendOrder { order_id, months })
        .await
        .map(|o| Json(o.into()))
        .map_err(AsError::into_error)
}

/// Completes the [`Order`] once the customer picks the goods up.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_TRANSITION` - goods of the [`Order`] are not in storage;
/// - `ORDER_NOT_EXISTS` - no [`Order`] with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "completePickup"))]
pub async fn complete_pickup(
    _: Authorized,
    Extension(service): Extension<Service>,
    id: Result<Path<order::Id>, PathRejection>,
) -> Result<Json<Order>, Error> {
    let Path(order_id) = id.map_err(AsError::into_error)?;

    service
        .execute(command::CompletePickup { order_id })
        .await
        .map(|o| Json(o.into()))
        .map_err(AsError::into_error)
}

/// Cancels the [`Order`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_TRANSITION` - [`Order`] is already finished;
/// - `ORDER_NOT_EXISTS` - no [`Order`] with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "cancelOrder"))]
pub async fn cancel(
    _: Authorized,
    Extension(service): Extension<Service>,
    id: Result<Path<order::Id>, PathRejection>,
) -> Result<Json<Order>, Error> {
    let Path(order_id) = id.map_err(AsError::into_error)?;

    service
        .execute(command::CancelOrder { order_id })
        .await
        .map(|o| Json(o.into()))
        .map_err(AsError::into_error)
}

/// Forces the [`Order`] into the provided status, bypassing the lifecycle
/// rules.
///
/// # Errors
///
/// Possible error codes:
/// - `ORDER_NOT_EXISTS` - no [`Order`] with the provided ID exists.
#[tracing::instrument(skip_all, fields(api.name = "overrideOrderStatus"))]
pub async fn override_status(
    _: Authorized,
    Extension(service): Extension<Service>,
    id: Result<Path<order::Id>, PathRejection>,
    req: Result<Json<OverrideStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, Error> {
    let Path(order_id) = id.map_err(AsError::into_error)?;
    let Json(OverrideStatusRequest { status }) =
        req.map_err(AsError::into_error)?;

    service
        .execute(command::OverrideOrderStatus { order_id, status })
        .await
        .map(|o| Json(o.into()))
        .map_err(AsError::into_error)
}

define_error! {
    enum OrderError {
        #[code = "ORDER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Order` doesn't exist"]
        NotExists,
    }
}

impl AsError for command::create_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        let code = match self {
            Self::Db(e) => return e.try_as_error(),
            Self::AddressRequired => "ADDRESS_REQUIRED",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidName => "INVALID_NAME",
            Self::InvalidPhone => "INVALID_PHONE",
            Self::InvalidPreferredTime => "INVALID_PREFERRED_TIME",
            Self::InvalidTerm(_) => "INVALID_TERM",
            Self::PromoRejected { .. } => "PROMO_REJECTED",
            Self::UnknownUnit(_) => "UNKNOWN_UNIT",
            Self::UserNotExists(_) => "USER_NOT_EXISTS",
        };
        Error::of_kind(self.kind(), code, self)
    }
}

impl AsError for command::extend_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::InvalidTerm(_) => {
                Error::of_kind(self.kind(), "INVALID_TERM", self)
            }
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for query::compute_price::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        let code = match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTerm(_) => "INVALID_TERM",
            Self::PromoRejected { .. } => "PROMO_REJECTED",
            Self::UnknownUnit(_) => "UNKNOWN_UNIT",
        };
        Error::of_kind(self.kind(), code, self)
    }
}
