//! [`Catalog`]-related HTTP API definitions.
//!
//! [`Catalog`]: service::domain::Catalog

use axum::{extract::rejection::JsonRejection, Extension, Json};
use common::Money;
use serde::{Deserialize, Serialize};
use service::domain::{self, catalog::ItemVerdict};

use crate::{auth::Authorized, AsError, Error, Service};

/// Storage unit offered for rent.
#[derive(Clone, Debug, Serialize)]
pub struct Unit {
    /// ID of this [`Unit`].
    pub id: String,

    /// Human-readable name of this [`Unit`].
    pub name: String,

    /// Volume of this [`Unit`].
    pub size: String,

    /// Dimensions of this [`Unit`].
    pub dimensions: String,

    /// Free-form description of this [`Unit`].
    pub description: String,

    /// Base monthly rent rate of this [`Unit`].
    pub price_per_month: Money,
}

impl From<&domain::Unit> for Unit {
    fn from(u: &domain::Unit) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.name.clone(),
            size: u.size.clone(),
            dimensions: u.dimensions.clone(),
            description: u.description.clone(),
            price_per_month: u.price_per_month,
        }
    }
}

/// Request for checking whether an item may be stored.
#[derive(Clone, Debug, Deserialize)]
pub struct ClassifyRequest {
    /// Free-form description of the item.
    pub text: String,
}

/// Storage rules verdict on an item.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "verdict", content = "keywords", rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Item must not be stored.
    Prohibited(Vec<String>),

    /// Item is explicitly allowed for storage.
    Allowed(Vec<String>),

    /// Item matches no storage rule.
    Unknown,
}

impl From<ItemVerdict> for Verdict {
    fn from(v: ItemVerdict) -> Self {
        match v {
            ItemVerdict::Prohibited(kws) => Self::Prohibited(kws),
            ItemVerdict::Allowed(kws) => Self::Allowed(kws),
            ItemVerdict::Unknown => Self::Unknown,
        }
    }
}

/// Lists [`Unit`]s offered for rent.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
#[tracing::instrument(skip_all, fields(api.name = "listUnits"))]
pub async fn units(
    _: Authorized,
    Extension(service): Extension<Service>,
) -> Json<Vec<Unit>> {
    Json(service.catalog().units().iter().map(Into::into).collect())
}

/// Classifies the described item against the storage rules.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
#[tracing::instrument(skip_all, fields(api.name = "classifyItem"))]
pub async fn classify_item(
    _: Authorized,
    Extension(service): Extension<Service>,
    req: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<Verdict>, Error> {
    let Json(ClassifyRequest { text }) = req.map_err(AsError::into_error)?;

    Ok(Json(service.catalog().classify_item(&text).into()))
}

#[cfg(test)]
mod spec {
    use service::domain::catalog::ItemVerdict;

    use super::Verdict;

    #[test]
    fn tags_verdict() {
        let prohibited =
            Verdict::from(ItemVerdict::Prohibited(vec!["paint".to_owned()]));
        assert_eq!(
            serde_json::to_value(prohibited).unwrap(),
            serde_json::json!({
                "verdict": "PROHIBITED",
                "keywords": ["paint"],
            }),
        );

        assert_eq!(
            serde_json::to_value(Verdict::from(ItemVerdict::Unknown))
                .unwrap(),
            serde_json::json!({ "verdict": "UNKNOWN" }),
        );
    }
}
