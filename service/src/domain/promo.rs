//! [`PromoCode`] definitions.

use std::str::FromStr;

use common::{unit, Date, DateOf, DateTimeOf, Percent};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Named percentage discount applied once at [`Order`] creation.
///
/// [`Order`]: crate::domain::Order
#[derive(Clone, Debug)]
pub struct PromoCode {
    /// Canonical [`Code`] of this [`PromoCode`].
    pub code: Code,

    /// Discount granted by this [`PromoCode`].
    pub discount: Percent,

    /// First [`Date`] this [`PromoCode`] may be used at, if limited.
    pub active_from: Option<ActiveFromDate>,

    /// Last [`Date`] this [`PromoCode`] may be used at, if limited.
    pub active_to: Option<ActiveToDate>,

    /// Indicator whether this [`PromoCode`] is enabled by an operator.
    pub is_active: bool,

    /// Indicator whether this [`PromoCode`] is distributed via advertising.
    pub is_advertising: bool,

    /// Number of [`Order`]s this [`PromoCode`] was applied to.
    ///
    /// [`Order`]: crate::domain::Order
    pub usage_count: UsageCount,

    /// [`DateTime`] when this [`PromoCode`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl PromoCode {
    /// Maximum number of decimal places in a [`PromoCode::discount`].
    pub const DISCOUNT_SCALE: u32 = 2;

    /// Validates this [`PromoCode`] as of the provided [`Date`], returning the
    /// discount it grants.
    ///
    /// # Errors
    ///
    /// With a [`Rejection`] if this [`PromoCode`] cannot be applied at the
    /// provided [`Date`].
    pub fn validate(&self, as_of: Date) -> Result<Percent, Rejection> {
        if !self.is_active {
            return Err(Rejection::Deactivated);
        }
        if self.active_from.is_some_and(|from| as_of < from.coerce()) {
            return Err(Rejection::NotYetActive);
        }
        if self.active_to.is_some_and(|to| as_of > to.coerce()) {
            return Err(Rejection::Expired);
        }
        Ok(self.discount)
    }

    /// Records a single usage of this [`PromoCode`].
    pub fn record_usage(&mut self) {
        self.usage_count = UsageCount(self.usage_count.0.saturating_add(1));
    }
}

/// Canonical code of a [`PromoCode`].
///
/// Codes are compared case-insensitively, so they're always stored
/// upper-cased.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Code(String);

impl Code {
    /// Maximum length of a [`Code`].
    pub const MAX_LEN: usize = 50;

    /// Creates a new canonical [`Code`] out of the provided `code`, if it's
    /// valid.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let code = code.as_ref().trim().to_uppercase();
        Self::check(&code).then_some(Self(code))
    }

    /// Checks whether the given canonical `code` is a valid [`Code`].
    fn check(code: &str) -> bool {
        !code.is_empty()
            && code.chars().count() <= Self::MAX_LEN
            && !code.chars().any(char::is_whitespace)
    }
}

impl FromStr for Code {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `promo::Code`")
    }
}

/// Number of times a [`PromoCode`] was used.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct UsageCount(i32);

/// Reason of a [`PromoCode`] being rejected.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Rejection {
    /// No [`PromoCode`] with such [`Code`] exists.
    #[display("not-found")]
    NotFound,

    /// [`PromoCode`] is disabled by an operator.
    #[display("deactivated")]
    Deactivated,

    /// [`PromoCode`] validity window hasn't started yet.
    #[display("not-yet-active")]
    NotYetActive,

    /// [`PromoCode`] validity window is over.
    #[display("expired")]
    Expired,
}

/// Outcome of validating a [`Code`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Validation {
    /// Indicator whether the [`Code`] may be applied.
    pub is_valid: bool,

    /// Discount granted by the [`Code`], if valid.
    pub discount: Option<Percent>,

    /// [`Rejection`] reason, if invalid.
    pub reason: Option<Rejection>,
}

impl From<Result<Percent, Rejection>> for Validation {
    fn from(res: Result<Percent, Rejection>) -> Self {
        match res {
            Ok(discount) => Self {
                is_valid: true,
                discount: Some(discount),
                reason: None,
            },
            Err(reason) => Self {
                is_valid: false,
                discount: None,
                reason: Some(reason),
            },
        }
    }
}

/// [`Date`] since which a [`PromoCode`] is valid.
pub type ActiveFromDate = DateOf<(PromoCode, unit::Beginning)>;

/// [`Date`] until which a [`PromoCode`] is valid.
pub type ActiveToDate = DateOf<(PromoCode, unit::Ending)>;

/// [`DateTime`] when a [`PromoCode`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(PromoCode, unit::Creation)>;

#[cfg(test)]
pub(crate) mod spec {
    use common::{Date, DateTime, Percent};

    use super::{Code, PromoCode, Rejection, UsageCount, Validation};

    fn date(y: i32, m: u8, d: u8) -> Date {
        Date::from_calendar(y, m, d).unwrap()
    }

    /// Creates an active unbounded [`PromoCode`] with the provided `code` and
    /// `discount`.
    pub(crate) fn promo(code: &str, discount: u8) -> PromoCode {
        PromoCode {
            code: Code::new(code).unwrap(),
            discount: Percent::new(discount).unwrap(),
            active_from: None,
            active_to: None,
            is_active: true,
            is_advertising: false,
            usage_count: UsageCount::default(),
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn canonical_code() {
        assert_eq!(Code::new(" spring25 ").unwrap().as_ref(), "SPRING25");
        assert_eq!(Code::new("Spring25"), Code::new("SPRING25"));

        assert!(Code::new("").is_none());
        assert!(Code::new("   ").is_none());
        assert!(Code::new("TWO WORDS").is_none());
        assert!(Code::new("X".repeat(51)).is_none());
    }

    #[test]
    fn validity_window() {
        let mut p = promo("spring", 15);
        p.active_from = Some(date(2025, 3, 1).coerce());
        p.active_to = Some(date(2025, 5, 31).coerce());

        let granted = Ok(Percent::new(15).unwrap());
        assert_eq!(p.validate(date(2025, 2, 28)), Err(Rejection::NotYetActive));
        assert_eq!(p.validate(date(2025, 3, 1)), granted);
        assert_eq!(p.validate(date(2025, 5, 31)), granted);
        assert_eq!(p.validate(date(2025, 6, 1)), Err(Rejection::Expired));

        p.is_active = false;
        assert_eq!(p.validate(date(2025, 4, 1)), Err(Rejection::Deactivated));
    }

    #[test]
    fn open_ended_window() {
        let mut p = promo("forever", 5);
        assert!(p.validate(date(1999, 1, 1)).is_ok());

        p.active_to = Some(date(2025, 1, 1).coerce());
        assert!(p.validate(date(1999, 1, 1)).is_ok());
        assert_eq!(p.validate(date(2025, 1, 2)), Err(Rejection::Expired));
    }

    #[test]
    fn validation_is_pure() {
        let p = promo("pure", 10);

        let first = p.validate(date(2025, 1, 1));
        let second = p.validate(date(2025, 1, 1));

        assert_eq!(first, second);
        assert_eq!(p.usage_count, UsageCount::default());
    }

    #[test]
    fn validation_outcome() {
        let p = promo("ok", 20);

        assert_eq!(
            Validation::from(p.validate(date(2025, 1, 1))),
            Validation {
                is_valid: true,
                discount: Percent::new(20),
                reason: None,
            },
        );
        assert_eq!(
            Validation::from(Err(Rejection::NotYetActive)),
            Validation {
                is_valid: false,
                discount: None,
                reason: Some(Rejection::NotYetActive),
            },
        );
        assert_eq!(Rejection::NotYetActive.to_string(), "not-yet-active");
        assert_eq!(Rejection::NotFound.to_string(), "not-found");
    }

    #[test]
    fn records_usage() {
        let mut p = promo("used", 10);

        p.record_usage();
        p.record_usage();

        assert_eq!(p.usage_count, UsageCount::from(2));
    }
}
