//! [`PromoCode`]-related HTTP API definitions.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Extension, Json,
};
use common::{Date, DateTime, Percent};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, promo},
    query, Command as _,
};

use crate::{auth::Authorized, define_error, AsError, Error, Service};

/// Discount code customers may apply to their orders.
#[derive(Clone, Debug, Serialize)]
pub struct PromoCode {
    /// Canonical code of this [`PromoCode`].
    pub code: String,

    /// Discount granted by this [`PromoCode`].
    pub discount: Percent,

    /// First day this [`PromoCode`] may be used at, if limited.
    pub active_from: Option<Date>,

    /// Last day this [`PromoCode`] may be used at, if limited.
    pub active_to: Option<Date>,

    /// Indicator whether this [`PromoCode`] is enabled by an operator.
    pub is_active: bool,

    /// Indicator whether this [`PromoCode`] is distributed via advertising.
    pub is_advertising: bool,

    /// Number of times this [`PromoCode`] was used.
    pub usage_count: i32,

    /// [`DateTime`] when this [`PromoCode`] was created.
    pub created_at: DateTime,
}

impl From<domain::PromoCode> for PromoCode {
    fn from(p: domain::PromoCode) -> Self {
        Self {
            code: p.code.to_string(),
            discount: p.discount,
            active_from: p.active_from.map(|d| d.coerce()),
            active_to: p.active_to.map(|d| d.coerce()),
            is_active: p.is_active,
            is_advertising: p.is_advertising,
            usage_count: p.usage_count.into(),
            created_at: p.created_at.coerce(),
        }
    }
}

/// Outcome of validating a promo code.
#[derive(Clone, Debug, Serialize)]
pub struct Validation {
    /// Indicator whether the promo code may be applied.
    pub is_valid: bool,

    /// Discount granted by the promo code, if valid.
    pub discount: Option<Percent>,

    /// Reason of the promo code being rejected, if invalid.
    pub reason: Option<String>,
}

impl From<promo::Validation> for Validation {
    fn from(v: promo::Validation) -> Self {
        Self {
            is_valid: v.is_valid,
            discount: v.discount,
            reason: v.reason.map(|r| r.to_string()),
        }
    }
}

/// Criteria of listing [`PromoCode`]s.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Indicator whether only applicable [`PromoCode`]s should be listed.
    pub active: bool,

    /// [`Date`] the [`PromoCode`]s should be applicable at.
    ///
    /// Today is assumed, if omitted.
    pub as_of: Option<Date>,
}

/// Criteria of validating a promo code.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidateParams {
    /// [`Date`] to validate the promo code at.
    ///
    /// Today is assumed, if omitted.
    pub as_of: Option<Date>,
}

/// Request for creating a new [`PromoCode`].
#[derive(Clone, Debug, Deserialize)]
pub struct CreateRequest {
    /// Code of the new [`PromoCode`].
    pub code: String,

    /// Discount granted by the new [`PromoCode`].
    pub discount: Percent,

    /// First day the new [`PromoCode`] may be used at.
    #[serde(default)]
    pub active_from: Option<Date>,

    /// Last day the new [`PromoCode`] may be used at.
    #[serde(default)]
    pub active_to: Option<Date>,

    /// Indicator whether the new [`PromoCode`] is distributed via
    /// advertising.
    #[serde(default)]
    pub is_advertising: bool,
}

/// Request for enabling or disabling a [`PromoCode`].
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SetActiveRequest {
    /// Indicator whether the [`PromoCode`] should be enabled.
    pub is_active: bool,
}

/// Lists [`PromoCode`]s along with their usage counters, most recent first.
#[tracing::instrument(skip_all, fields(api.name = "listPromoCodes"))]
pub async fn list(
    _: Authorized,
    Extension(service): Extension<Service>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<PromoCode>>, Error> {
    let Query(ListParams { active, as_of }) =
        params.map_err(AsError::into_error)?;

    let codes = if active {
        let as_of = as_of.unwrap_or_else(|| service.today());
        service
            .execute(query::ListActivePromoCodes { as_of })
            .await
    } else {
        service.execute(query::ListPromoCodes::by(())).await
    }
    .map_err(AsError::into_error)?;

    Ok(Json(codes.into_iter().map(Into::into).collect()))
}

/// Checks whether the promo code may be applied, without recording its
/// usage.
#[tracing::instrument(skip_all, fields(api.name = "validatePromoCode"))]
pub async fn validate(
    _: Authorized,
    Extension(service): Extension<Service>,
    code: Result<Path<String>, PathRejection>,
    params: Result<Query<ValidateParams>, QueryRejection>,
) -> Result<Json<Validation>, Error> {
    let Path(code) = code.map_err(AsError::into_error)?;
    let Query(ValidateParams { as_of }) =
        params.map_err(AsError::into_error)?;

    service
        .execute(query::ValidatePromoCode {
            code,
            as_of: as_of.unwrap_or_else(|| service.today()),
        })
        .await
        .map(|v| Json(v.into()))
        .map_err(AsError::into_error)
}

/// Creates a new active [`PromoCode`].
///
/// # Errors
///
/// Possible error codes:
/// - `CODE_OCCUPIED` - [`PromoCode`] with the same code already exists;
/// - `INVALID_CODE` - provided code is empty, too long or has whitespaces;
/// - `INVALID_DISCOUNT` - discount has more than 2 decimal places;
/// - `INVALID_WINDOW` - validity window ends before it starts.
#[tracing::instrument(skip_all, fields(api.name = "createPromoCode"))]
pub async fn create(
    _: Authorized,
    Extension(service): Extension<Service>,
    req: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<PromoCode>, Error> {
    let Json(req) = req.map_err(AsError::into_error)?;

    service
        .execute(command::CreatePromoCode {
            code: req.code,
            discount: req.discount,
            active_from: req.active_from.map(|d| d.coerce()),
            active_to: req.active_to.map(|d| d.coerce()),
            is_advertising: req.is_advertising,
        })
        .await
        .map(|p| Json(p.into()))
        .map_err(AsError::into_error)
}

/// Enables or disables the [`PromoCode`].
///
/// # Errors
///
/// Possible error codes:
/// - `PROMO_CODE_NOT_EXISTS` - no [`PromoCode`] with the provided code
///                             exists.
#[tracing::instrument(skip_all, fields(api.name = "setPromoCodeActive"))]
pub async fn set_active(
    _: Authorized,
    Extension(service): Extension<Service>,
    code: Result<Path<String>, PathRejection>,
    req: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<PromoCode>, Error> {
    let code = canonical(code)?;
    let Json(SetActiveRequest { is_active }) =
        req.map_err(AsError::into_error)?;

    service
        .execute(command::SetPromoCodeActive { code, is_active })
        .await
        .map(|p| Json(p.into()))
        .map_err(AsError::into_error)
}

/// Extracts the canonical [`promo::Code`] out of the request path.
///
/// Malformed codes are reported as non-existing ones.
fn canonical(
    code: Result<Path<String>, PathRejection>,
) -> Result<promo::Code, Error> {
    let Path(code) = code.map_err(AsError::into_error)?;
    promo::Code::new(code).ok_or_else(|| PromoCodeError::NotExists.into())
}

define_error! {
    enum PromoCodeError {
        #[code = "PROMO_CODE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`PromoCode` doesn't exist"]
        NotExists,
    }
}

impl AsError for command::create_promo_code::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        let code = match self {
            Self::Db(e) => return e.try_as_error(),
            Self::CodeOccupied(_) => "CODE_OCCUPIED",
            Self::InvalidCode(_) => "INVALID_CODE",
            Self::InvalidDiscount(_) => "INVALID_DISCOUNT",
            Self::InvalidWindow => "INVALID_WINDOW",
        };
        Error::of_kind(self.kind(), code, self)
    }
}

impl AsError for command::set_promo_code_active::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PromoCodeNotExists(_) => {
                Some(PromoCodeError::NotExists.into())
            }
        }
    }
}
