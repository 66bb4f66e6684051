//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Floating-point percentage in the `[0, 100]` range.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Percent(Decimal);

impl Percent {
    /// Zero [`Percent`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Percent`] by checking the provided value is not less
    /// than `0` and not greater than `100`.
    #[must_use]
    pub fn new(val: impl Into<Decimal>) -> Option<Self> {
        let val = val.into();
        (Decimal::ZERO..=Decimal::ONE_HUNDRED)
            .contains(&val)
            .then_some(Self(val))
    }

    /// Returns the raw value of this [`Percent`].
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Returns the multiplier leaving the part not covered by this
    /// [`Percent`], i.e. `(100 - p) / 100`.
    #[must_use]
    pub fn complement_factor(self) -> Decimal {
        (Decimal::ONE_HUNDRED - self.0) / Decimal::ONE_HUNDRED
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{
        de::Error as _, Deserialize, Deserializer, Serialize, Serializer,
    };

    use super::Percent;

    impl Serialize for Percent {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Percent {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            Self::from_str(&s).map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Percent;

    #[test]
    fn bounds() {
        assert!(Percent::new(0).is_some());
        assert!(Percent::new(100).is_some());
        assert!(Percent::new(-1).is_none());
        assert!(Percent::new(101).is_none());

        assert!(Percent::from_str("15").is_ok());
        assert!(Percent::from_str("12.5").is_ok());
        assert!(Percent::from_str("100.01").is_err());
        assert!(Percent::from_str("abc").is_err());
    }

    #[test]
    fn complement_factor() {
        assert_eq!(
            Percent::new(15).unwrap().complement_factor(),
            Decimal::from_str("0.85").unwrap(),
        );
        assert_eq!(Percent::ZERO.complement_factor(), Decimal::ONE);
        assert_eq!(
            Percent::new(100).unwrap().complement_factor(),
            Decimal::ZERO,
        );
    }
}
