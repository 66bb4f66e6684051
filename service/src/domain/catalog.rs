//! [`Catalog`] definitions.

use std::collections::HashSet;

use common::money::Currency;
use derive_more::{Display, Error as StdError};
use rust_decimal::Decimal;

use crate::domain::{unit, Unit};

/// Read-only offering of storage [`Unit`]s along with delivery settings.
#[derive(Clone, Debug)]
pub struct Catalog {
    /// [`Unit`]s available for rent.
    units: Vec<Unit>,

    /// [`Delivery`] settings.
    delivery: Delivery,

    /// [`Keywords`] describing storage rules.
    keywords: Keywords,

    /// [`Currency`] all the [`Unit`]s are priced in.
    currency: Currency,
}

impl Catalog {
    /// Creates a new [`Catalog`] out of the provided parts.
    ///
    /// # Errors
    ///
    /// If the provided [`Unit`]s are empty, have duplicated IDs or are priced
    /// in different currencies.
    pub fn new(
        units: Vec<Unit>,
        delivery: Delivery,
        keywords: Keywords,
    ) -> Result<Self, Error> {
        let Some(first) = units.first() else {
            return Err(Error::NoUnits);
        };
        let currency = first.price_per_month.currency;

        let mut seen = HashSet::with_capacity(units.len());
        for u in &units {
            if !seen.insert(&u.id) {
                return Err(Error::DuplicateUnit(u.id.clone()));
            }
            if u.price_per_month.currency != currency {
                return Err(Error::MixedCurrencies(u.id.clone()));
            }
            if u.price_per_month.is_negative() {
                return Err(Error::NegativePrice(u.id.clone()));
            }
        }

        Ok(Self {
            units,
            delivery,
            keywords,
            currency,
        })
    }

    /// Returns the [`Unit`] with the provided [`unit::Id`], if any.
    #[must_use]
    pub fn unit(&self, id: &unit::Id) -> Option<&Unit> {
        self.units.iter().find(|u| &u.id == id)
    }

    /// Returns all the [`Unit`]s of this [`Catalog`].
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Returns the [`Currency`] of this [`Catalog`] prices.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns [`Delivery`] settings of this [`Catalog`].
    #[must_use]
    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Classifies the provided free-form item description against the
    /// storage rules.
    ///
    /// Matching is case-insensitive. Prohibited keywords take precedence over
    /// the allowed ones.
    #[must_use]
    pub fn classify_item(&self, text: &str) -> ItemVerdict {
        let text = text.to_lowercase();
        let matching = |keywords: &[String]| {
            keywords
                .iter()
                .filter(|kw| text.contains(&kw.to_lowercase()))
                .cloned()
                .collect::<Vec<_>>()
        };

        let prohibited = matching(&self.keywords.prohibited);
        if !prohibited.is_empty() {
            return ItemVerdict::Prohibited(prohibited);
        }
        let allowed = matching(&self.keywords.allowed);
        if !allowed.is_empty() {
            return ItemVerdict::Allowed(allowed);
        }
        ItemVerdict::Unknown
    }
}

/// Delivery settings of a [`Catalog`].
#[derive(Clone, Copy, Debug)]
pub struct Delivery {
    /// Multiplier applied to the total price when a customer brings the
    /// goods to the warehouse by themselves.
    self_delivery_factor: Decimal,
}

impl Delivery {
    /// Creates new [`Delivery`] settings if the provided
    /// `self_delivery_factor` lies in the `(0, 1]` range.
    #[must_use]
    pub fn new(self_delivery_factor: Decimal) -> Option<Self> {
        (self_delivery_factor > Decimal::ZERO
            && self_delivery_factor <= Decimal::ONE)
            .then_some(Self {
                self_delivery_factor,
            })
    }

    /// Returns the self-delivery price multiplier.
    #[must_use]
    pub fn self_delivery_factor(&self) -> Decimal {
        self.self_delivery_factor
    }
}

/// Keywords describing what may be stored.
#[derive(Clone, Debug, Default)]
pub struct Keywords {
    /// Keywords of items forbidden for storage.
    pub prohibited: Vec<String>,

    /// Keywords of items explicitly allowed for storage.
    pub allowed: Vec<String>,
}

/// Result of [`Catalog::classify_item()`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ItemVerdict {
    /// Item matches the listed prohibited keywords.
    Prohibited(Vec<String>),

    /// Item matches the listed allowed keywords.
    Allowed(Vec<String>),

    /// Item matches no known keyword.
    Unknown,
}

/// Error of a [`Catalog`] construction.
#[derive(Clone, Debug, Display, StdError)]
pub enum Error {
    /// [`Catalog`] contains no [`Unit`]s.
    #[display("`Catalog` contains no units")]
    NoUnits,

    /// Several [`Unit`]s share the same ID.
    #[display("`Unit(id: {_0})` is listed more than once")]
    DuplicateUnit(#[error(not(source))] unit::Id),

    /// [`Unit`] is priced in a currency different from the first one.
    #[display("`Unit(id: {_0})` is priced in a different currency")]
    MixedCurrencies(#[error(not(source))] unit::Id),

    /// [`Unit`] has a negative price.
    #[display("`Unit(id: {_0})` has a negative price")]
    NegativePrice(#[error(not(source))] unit::Id),
}
