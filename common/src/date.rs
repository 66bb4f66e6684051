//! Calendar date utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, fmt, marker::PhantomData, str::FromStr};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{format_description::FormatItem, macros::format_description};

/// Untyped calendar date.
pub type Date = DateOf;

/// ISO 8601 calendar date format (`YYYY-MM-DD`).
const ISO_FORMAT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]");

/// Calendar date without a time zone.
///
/// "Today" is always evaluated in UTC.
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateOf<Of> {
    /// Returns the current [`Date`] in UTC.
    #[must_use]
    pub fn today() -> Self {
        Self::from(time::OffsetDateTime::now_utc().date())
    }

    /// Creates a new [`Date`] from the provided calendar components.
    ///
    /// [`None`] is returned if the components do not form a valid date.
    #[must_use]
    pub fn from_calendar(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self::from)
    }

    /// Returns this [`Date`] shifted by the provided number of days.
    ///
    /// [`None`] is returned on overflow of the supported date range.
    #[must_use]
    pub fn checked_add_days(self, days: i64) -> Option<Self> {
        self.inner
            .checked_add(time::Duration::days(days))
            .map(Self::from)
    }

    /// Returns this [`Date`] shifted by the provided number of days, clamping
    /// to the supported date range.
    #[must_use]
    pub fn saturating_add_days(self, days: i64) -> Self {
        self.inner
            .saturating_add(time::Duration::days(days))
            .into()
    }

    /// Returns the number of whole days from this [`Date`] until the
    /// `other` one.
    ///
    /// The result is negative if the `other` [`Date`] is in the past
    /// relatively to this one.
    #[must_use]
    pub fn days_until<Other: ?Sized>(self, other: DateOf<Other>) -> i64 {
        (other.inner - self.inner).whole_days()
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<DateOf<Of>> for time::Date {
    fn from(date: DateOf<Of>) -> Self {
        date.inner
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted =
            self.inner.format(ISO_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

/// Error of parsing [`Date`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid ISO 8601 date: {_0}")]
pub struct ParseError(time::error::Parse);

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, ISO_FORMAT)
            .map(Self::from)
            .map_err(ParseError)
    }
}

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Self::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{
        de::Error as _, Deserialize, Deserializer, Serialize, Serializer,
    };

    use super::DateOf;

    impl<Of: ?Sized> Serialize for DateOf<Of> {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de, Of: ?Sized> Deserialize<'de> for DateOf<Of> {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            Self::from_str(&s).map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Date;

    #[test]
    fn adds_days_across_months() {
        let date = Date::from_calendar(2025, 1, 1).unwrap();

        assert_eq!(
            date.checked_add_days(90).unwrap(),
            Date::from_calendar(2025, 4, 1).unwrap(),
        );
        assert_eq!(
            date.checked_add_days(-1).unwrap(),
            Date::from_calendar(2024, 12, 31).unwrap(),
        );
    }

    #[test]
    fn days_until() {
        let from = Date::from_calendar(2025, 1, 1).unwrap();
        let to = Date::from_calendar(2025, 1, 31).unwrap();

        assert_eq!(from.days_until(to), 30);
        assert_eq!(to.days_until(from), -30);
        assert_eq!(from.days_until(from), 0);
    }

    #[test]
    fn iso_format() {
        let date = Date::from_str("2025-03-09").unwrap();

        assert_eq!(date, Date::from_calendar(2025, 3, 9).unwrap());
        assert_eq!(date.to_string(), "2025-03-09");
        assert!(Date::from_str("09.03.2025").is_err());
        assert!(Date::from_calendar(2025, 2, 30).is_none());
    }
}
