//! [`Money`]-related definitions.

use std::{fmt, ops, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
///
/// Arithmetic between two [`Money`] values keeps the [`Currency`] of the
/// left operand, so callers must not mix currencies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new [`Money`] of the provided `amount` in the provided
    /// [`Currency`].
    #[must_use]
    pub fn new(amount: impl Into<Decimal>, currency: Currency) -> Self {
        Self {
            amount: amount.into(),
            currency,
        }
    }

    /// Creates a zero [`Money`] in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Rounds the amount of this [`Money`] down to the nearest integer.
    #[must_use]
    pub fn floor(self) -> Self {
        Self {
            amount: self.amount.floor(),
            currency: self.currency,
        }
    }

    /// Indicates whether the amount of this [`Money`] is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

impl ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        Self {
            amount: self.amount + rhs.amount,
            currency: self.currency,
        }
    }
}

impl ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl ops::Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        Self {
            amount: self.amount - rhs.amount,
            currency: self.currency,
        }
    }
}

impl ops::Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self {
            amount: self.amount * rhs,
            currency: self.currency,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        match amount.is_integer().then(|| amount.to_i128()).flatten() {
            Some(int) => write!(f, "{int}{currency}"),
            None => write!(f, "{amount}{currency}"),
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Currency code is the last 3 characters.
        let at = match s.char_indices().nth_back(2) {
            Some((at, _)) if at > 0 => at,
            _ => return Err("too short"),
        };

        let (amount, currency) = s.split_at(at);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Russian Ruble."]
        Rub = 3,
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{
        de::Error as _, Deserialize, Deserializer, Serialize, Serializer,
    };

    use super::Money;

    impl Serialize for Money {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Money {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            Self::from_str(&s).map_err(|e| {
                D::Error::custom(format!("cannot parse `Money`: {e}"))
            })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45RUB").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Rub,
            },
        );
        assert_eq!(
            Money::from_str("3000EUR").unwrap(),
            Money::new(3000, Currency::Eur),
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Ru").is_err());
        assert!(Money::from_str("123.45Rubles").is_err());
        assert!(Money::from_str("RUB").is_err());
    }

    #[test]
    fn rejects_non_ascii() {
        for s in ["1ééé", "ééé", "12₽", "€100EUR", "100EUŔ"] {
            assert!(Money::from_str(s).is_err(), "{s}");
        }
    }

    #[test]
    fn to_string() {
        assert_eq!(Money::new(6120, Currency::Rub).to_string(), "6120RUB");
        assert_eq!(
            Money::new(decimal("6120.00"), Currency::Rub).to_string(),
            "6120RUB",
        );
        assert_eq!(
            Money::new(decimal("61.5"), Currency::Usd).to_string(),
            "61.5USD",
        );
    }

    #[test]
    fn arithmetic() {
        let rate = Money::new(3000, Currency::Rub);

        assert_eq!(rate * Decimal::from(3), Money::new(9000, Currency::Rub));
        assert_eq!(
            (rate * decimal("0.333")).floor(),
            Money::new(999, Currency::Rub),
        );
        assert_eq!(
            rate - Money::new(500, Currency::Rub),
            Money::new(2500, Currency::Rub),
        );

        let mut total = Money::zero(Currency::Rub);
        total += rate;
        assert_eq!(total, rate);
        assert!(!total.is_negative());
        assert!((Money::zero(Currency::Rub) - rate).is_negative());
    }
}
