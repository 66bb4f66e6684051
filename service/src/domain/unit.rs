//! [`Unit`] definitions.

use common::Money;
use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Storage unit offered for rent.
#[derive(Clone, Debug)]
pub struct Unit {
    /// ID of this [`Unit`].
    pub id: Id,

    /// Human-readable name of this [`Unit`].
    pub name: String,

    /// Volume of this [`Unit`] (like `"3 m³"`).
    pub size: String,

    /// Dimensions of this [`Unit`] (like `"1.5 × 1 × 2 m"`).
    pub dimensions: String,

    /// Free-form description of this [`Unit`].
    pub description: String,

    /// Base monthly rent rate of this [`Unit`].
    pub price_per_month: Money,
}

/// ID of a [`Unit`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(String);

impl Id {
    /// Creates a new [`Id`] if the given `id` is valid.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        Self::check(&id).then_some(Self(id))
    }

    /// Checks whether the given `id` is a valid [`Id`].
    fn check(id: impl AsRef<str>) -> bool {
        let id = id.as_ref();
        !id.is_empty()
            && id.len() <= 64
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl std::str::FromStr for Id {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `unit::Id`")
    }
}
