//! [`Contact`] definitions of an [`Order`].

use std::{str::FromStr, sync::LazyLock};

use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;

#[cfg(doc)]
use crate::domain::Order;

/// Contact information left by a customer for an [`Order`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contact {
    /// [`Phone`] to call the customer back.
    pub phone: Phone,

    /// [`Email`] receiving the [`Order`] notifications.
    pub email: Email,

    /// [`Name`] of the customer, if provided.
    pub name: Option<Name>,
}

/// Phone number of a customer.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    ///
    /// Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        let number = number.trim();
        Self::check(number).then(|| Self(number.to_owned()))
    }

    /// Maximum number of characters in a [`Phone`], separators included.
    const MAX_LEN: usize = 32;

    /// Checks whether the given `number` is a valid [`Phone`].
    ///
    /// Spaces, dashes and parentheses are allowed as separators.
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Phone`] digits.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?\d{10,15}$").expect("valid regex")
        });

        let number = number.as_ref();
        if number.chars().count() > Self::MAX_LEN {
            return false;
        }

        let digits = number
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect::<String>();
        REGEX.is_match(&digits)
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// Email address of a customer.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        let address = address.trim();
        Self::check(address).then(|| Self(address.to_owned()))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 254 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Name of a customer.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let name = name.trim();
        (!name.is_empty() && name.chars().count() <= 128)
            .then(|| Self(name.to_owned()))
    }
}

/// Street address to collect goods from.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`] if the given `address` is not blank and not
    /// too long.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        let address = address.trim();
        (!address.is_empty() && address.chars().count() <= 255)
            .then(|| Self(address.to_owned()))
    }
}
