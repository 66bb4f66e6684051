//! [`Order`] definitions.

pub mod contact;

use common::{define_kind, unit, Date, DateOf, DateTimeOf, Money, Percent};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    notification::REMINDER_THRESHOLDS, promo, unit as storage, user,
    Notification,
};

pub use self::contact::{Address, Contact, Email, Name, Phone};

/// Rental of a storage [`Unit`] by a customer.
///
/// [`Unit`]: crate::domain::Unit
#[derive(Clone, Debug)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Order`].
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// ID of the rented [`Unit`].
    ///
    /// [`Unit`]: crate::domain::Unit
    pub unit_id: storage::Id,

    /// Initially chosen rental [`Term`].
    pub term: Term,

    /// [`DeliveryMode`] of the goods.
    pub delivery_mode: DeliveryMode,

    /// [`Contact`] information of the customer.
    pub contact: Contact,

    /// [`Address`] to collect the goods from.
    ///
    /// Always present for [`DeliveryMode::PickupService`].
    pub address: Option<Address>,

    /// Free-form time the customer prefers the goods to be collected at.
    pub preferred_time: Option<String>,

    /// [`promo::Code`] applied to this [`Order`], if any.
    pub promo_code: Option<promo::Code>,

    /// Discount snapshotted from the [`promo::Code`] at creation.
    pub discount: Percent,

    /// Monthly rate of the rented [`Unit`] at creation.
    ///
    /// [`Unit`]: crate::domain::Unit
    pub base_price: Money,

    /// Cumulative price of this [`Order`], including extensions.
    pub final_price: Money,

    /// [`Date`] the rental started at.
    pub start_date: Option<StartDate>,

    /// [`Date`] the rental ends at.
    pub end_date: Option<EndDate>,

    /// Indicator whether the goods should be collected from the customer.
    pub is_delivery_required: bool,

    /// Indicator whether the goods were collected from the customer.
    pub is_delivered: bool,

    /// Current [`Status`] of this [`Order`].
    pub status: Status,

    /// [`Date`] the last expiry reminder was sent at.
    pub last_reminded_on: Option<ReminderDate>,

    /// [`DateTime`] when this [`Order`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Order {
    /// Marks this [`Order`] as paid, starting its rental `today`.
    ///
    /// Returns `false` if this [`Order`] is already [`Status::Paid`], leaving
    /// it untouched.
    ///
    /// # Errors
    ///
    /// If this [`Order`] is neither [`Status::Created`] nor
    /// [`Status::Paid`].
    pub fn confirm_payment(
        &mut self,
        today: Date,
    ) -> Result<bool, InvalidTransition> {
        match self.status {
            Status::Paid => Ok(false),
            Status::Created => {
                let start = today.coerce();
                self.start_date = Some(start);
                self.end_date =
                    Some(start.saturating_add_days(self.term.days()).coerce());
                self.status = Status::Paid;
                Ok(true)
            }
            Status::InStorage
            | Status::Completed
            | Status::Expired
            | Status::Cancelled => {
                Err(self.illegal(Event::PaymentConfirmation))
            }
        }
    }

    /// Ensures this [`Order`] is awaiting its payment.
    ///
    /// # Errors
    ///
    /// If this [`Order`] is not [`Status::Created`].
    pub fn ensure_awaiting_payment(&self) -> Result<(), InvalidTransition> {
        if self.status == Status::Created {
            Ok(())
        } else {
            Err(self.illegal(Event::PaymentInitiation))
        }
    }

    /// Marks the goods of this [`Order`] as received at the warehouse.
    ///
    /// # Errors
    ///
    /// If this [`Order`] is not [`Status::Paid`].
    pub fn receive(&mut self) -> Result<(), InvalidTransition> {
        if self.status != Status::Paid {
            return Err(self.illegal(Event::StorageReceipt));
        }
        if self.is_delivery_required {
            self.is_delivered = true;
        }
        self.status = Status::InStorage;
        Ok(())
    }

    /// Extends the rental of this [`Order`] by the provided [`Term`].
    ///
    /// If no end [`Date`] is known yet, the extension is counted from `today`.
    /// Returns the surcharge added to the [`Order::final_price`].
    ///
    /// # Errors
    ///
    /// If this [`Order`] is not [`Status::InStorage`].
    pub fn extend(
        &mut self,
        term: Term,
        today: Date,
    ) -> Result<Money, InvalidTransition> {
        if self.status != Status::InStorage {
            return Err(self.illegal(Event::Extension));
        }

        let from = self.end_date.map_or(today, DateOf::coerce);
        self.end_date = Some(from.saturating_add_days(term.days()).coerce());
        if self.start_date.is_none() {
            self.start_date = Some(today.coerce());
        }

        let surcharge = self.base_price * Decimal::from(term.months());
        self.final_price += surcharge;
        Ok(surcharge)
    }

    /// Marks this [`Order`] as expired if its end [`Date`] is before `today`.
    ///
    /// Returns `false` if this [`Order`] is not overdue yet, leaving it
    /// untouched.
    ///
    /// # Errors
    ///
    /// If this [`Order`] is not [`Status::InStorage`].
    pub fn expire(&mut self, today: Date) -> Result<bool, InvalidTransition> {
        if self.status != Status::InStorage {
            return Err(self.illegal(Event::Expiry));
        }
        if !self.is_overdue(today) {
            return Ok(false);
        }
        self.status = Status::Expired;
        Ok(true)
    }

    /// Marks the goods of this [`Order`] as picked up by the customer.
    ///
    /// # Errors
    ///
    /// If this [`Order`] is neither [`Status::InStorage`] nor
    /// [`Status::Expired`].
    pub fn complete_pickup(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            Status::InStorage | Status::Expired => {
                self.status = Status::Completed;
                Ok(())
            }
            Status::Created
            | Status::Paid
            | Status::Completed
            | Status::Cancelled => Err(self.illegal(Event::Pickup)),
        }
    }

    /// Cancels this [`Order`].
    ///
    /// # Errors
    ///
    /// If this [`Order`] is neither [`Status::Created`] nor [`Status::Paid`].
    pub fn cancel(&mut self) -> Result<(), InvalidTransition> {
        match self.status {
            Status::Created | Status::Paid => {
                self.status = Status::Cancelled;
                Ok(())
            }
            Status::InStorage
            | Status::Completed
            | Status::Expired
            | Status::Cancelled => Err(self.illegal(Event::Cancellation)),
        }
    }

    /// Forces the provided [`Status`] upon this [`Order`] bypassing the
    /// regular transitions.
    ///
    /// Rental dates are filled starting from `today` if the new [`Status`]
    /// implies a started rental while they are unknown.
    pub fn override_status(&mut self, status: Status, today: Date) {
        if status.is_rental_started() && self.start_date.is_none() {
            let start = today.coerce();
            self.start_date = Some(start);
            if self.end_date.is_none() {
                self.end_date =
                    Some(start.saturating_add_days(self.term.days()).coerce());
            }
        }
        self.status = status;
    }

    /// Records an expiry reminder being sent `today`, if it's due.
    ///
    /// A reminder is due for a [`Status::InStorage`] [`Order`] once a day
    /// when the number of days left matches one of the
    /// [`REMINDER_THRESHOLDS`]. Returns the matched threshold.
    pub fn remind(&mut self, today: Date) -> Option<u8> {
        if self.status != Status::InStorage
            || self.last_reminded_on.is_some_and(|d| d.coerce() == today)
        {
            return None;
        }
        let days_left = self.days_left(today)?;
        let threshold = REMINDER_THRESHOLDS
            .into_iter()
            .find(|&t| i64::from(t) == days_left)?;
        self.last_reminded_on = Some(today.coerce());
        Some(threshold)
    }

    /// Returns the number of days left until the end of this [`Order`]
    /// rental, if it's known.
    ///
    /// The result is negative for an overdue rental.
    #[must_use]
    pub fn days_left(&self, today: Date) -> Option<i64> {
        self.end_date.map(|end| today.days_until(end))
    }

    /// Indicates whether the rental of this [`Order`] ended before `today`.
    #[must_use]
    pub fn is_overdue(&self, today: Date) -> bool {
        self.days_left(today).is_some_and(|days| days < 0)
    }

    /// Creates an [`InvalidTransition`] of this [`Order`] on the provided
    /// [`Event`].
    fn illegal(&self, event: Event) -> InvalidTransition {
        InvalidTransition {
            id: self.id,
            status: self.status,
            event,
        }
    }
}

/// ID of an [`Order`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Status of an [`Order`]."]
    enum Status {
        #[doc = "[`Order`] is submitted and awaits its payment."]
        Created = 1,

        #[doc = "[`Order`] is paid and awaits the goods."]
        Paid = 2,

        #[doc = "Goods of the [`Order`] are stored at the warehouse."]
        InStorage = 3,

        #[doc = "Goods of the [`Order`] are returned to the customer."]
        Completed = 4,

        #[doc = "Rental of the [`Order`] is over, but goods are still stored."]
        Expired = 5,

        #[doc = "[`Order`] is cancelled before the goods were stored."]
        Cancelled = 6,
    }
}

impl Status {
    /// Indicates whether no regular transition leads out of this [`Status`].
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }

    /// Indicates whether an [`Order`] in this [`Status`] has its rental
    /// started.
    #[must_use]
    pub fn is_rental_started(self) -> bool {
        matches!(
            self,
            Self::Paid | Self::InStorage | Self::Expired | Self::Completed,
        )
    }
}

define_kind! {
    #[doc = "The way the goods of an [`Order`] reach the warehouse."]
    enum DeliveryMode {
        #[doc = "Customer brings the goods by themselves."]
        SelfDelivery = 1,

        #[doc = "Goods are collected from the customer's [`Address`]."]
        PickupService = 2,
    }
}

define_kind! {
    #[doc = "Rental term of an [`Order`] or its extension."]
    enum Term {
        #[doc = "One month."]
        OneMonth = 1,

        #[doc = "Three months."]
        ThreeMonths = 3,

        #[doc = "Six months."]
        SixMonths = 6,
    }
}

impl Term {
    /// Number of days in a single rental month.
    pub const DAYS_IN_MONTH: i64 = 30;

    /// Returns the [`Term`] of the provided number of `months`, if allowed.
    #[must_use]
    pub fn from_months(months: u8) -> Option<Self> {
        Self::from_u8(months)
    }

    /// Returns the number of months in this [`Term`].
    #[must_use]
    pub const fn months(self) -> u8 {
        self.u8()
    }

    /// Returns the number of days in this [`Term`].
    #[must_use]
    pub fn days(self) -> i64 {
        Self::DAYS_IN_MONTH * i64::from(self.months())
    }
}

/// Event changing the [`Status`] of an [`Order`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Event {
    /// Payment is initiated.
    #[display("payment initiation")]
    PaymentInitiation,

    /// Payment is confirmed.
    #[display("payment confirmation")]
    PaymentConfirmation,

    /// Goods are received at the warehouse.
    #[display("storage receipt")]
    StorageReceipt,

    /// Rental is extended.
    #[display("extension")]
    Extension,

    /// Rental is over.
    #[display("expiry")]
    Expiry,

    /// Goods are picked up.
    #[display("pickup")]
    Pickup,

    /// [`Order`] is cancelled.
    #[display("cancellation")]
    Cancellation,
}

/// Error of an [`Event`] not permitted in the current [`Status`] of an
/// [`Order`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`Order(id: {id})` in `{status}` status doesn't allow {event}")]
pub struct InvalidTransition {
    /// ID of the [`Order`].
    #[error(not(source))]
    pub id: Id,

    /// [`Status`] of the [`Order`] at the moment of the [`Event`].
    #[error(not(source))]
    pub status: Status,

    /// Rejected [`Event`].
    #[error(not(source))]
    pub event: Event,
}

/// [`Date`] when an [`Order`] rental starts.
pub type StartDate = DateOf<(Order, unit::Beginning)>;

/// [`Date`] when an [`Order`] rental ends.
pub type EndDate = DateOf<(Order, unit::Ending)>;

/// [`Date`] when an [`Order`] expiry reminder was sent.
pub type ReminderDate = DateOf<(Order, Notification)>;

/// [`DateTime`] when an [`Order`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Order, unit::Creation)>;

#[cfg(test)]
pub(crate) mod spec {
    use common::{money::Currency, Date, DateTime, Money, Percent};

    use crate::domain::{unit, user};

    use super::{
        Contact, DeliveryMode, Email, Event, Id, Order, Phone, Status, Term,
    };

    pub(crate) fn date(y: i32, m: u8, d: u8) -> Date {
        Date::from_calendar(y, m, d).unwrap()
    }

    /// Creates a fresh [`Status::Created`] [`Order`] of a single month with
    /// the provided monthly rate.
    pub(crate) fn order(rate: i64) -> Order {
        let base_price = Money::new(rate, Currency::Rub);
        Order {
            id: Id::new(),
            user_id: user::Id::new(),
            unit_id: unit::Id::new("small").unwrap(),
            term: Term::OneMonth,
            delivery_mode: DeliveryMode::SelfDelivery,
            contact: Contact {
                phone: Phone::new("+79991234567").unwrap(),
                email: Email::new("client@example.com").unwrap(),
                name: None,
            },
            address: None,
            preferred_time: None,
            promo_code: None,
            discount: Percent::ZERO,
            base_price,
            final_price: base_price,
            start_date: None,
            end_date: None,
            is_delivery_required: false,
            is_delivered: false,
            status: Status::Created,
            last_reminded_on: None,
            created_at: DateTime::now().coerce(),
        }
    }

    fn in_storage(rate: i64, paid_at: Date) -> Order {
        let mut o = order(rate);
        assert!(o.confirm_payment(paid_at).unwrap());
        o.receive().unwrap();
        o
    }

    #[test]
    fn term_from_months() {
        assert_eq!(Term::from_months(1), Some(Term::OneMonth));
        assert_eq!(Term::from_months(3), Some(Term::ThreeMonths));
        assert_eq!(Term::from_months(6), Some(Term::SixMonths));
        for m in [0, 2, 4, 12] {
            assert_eq!(Term::from_months(m), None, "{m}");
        }
        assert_eq!(Term::SixMonths.days(), 180);
    }

    #[test]
    fn payment_is_idempotent() {
        let mut o = order(1000);
        o.term = Term::ThreeMonths;

        assert!(o.confirm_payment(date(2025, 1, 1)).unwrap());
        assert_eq!(o.status, Status::Paid);
        assert_eq!(o.start_date.unwrap().coerce(), date(2025, 1, 1));
        assert_eq!(o.end_date.unwrap().coerce(), date(2025, 4, 1));

        assert!(!o.confirm_payment(date(2025, 1, 5)).unwrap());
        assert_eq!(o.status, Status::Paid);
        assert_eq!(o.start_date.unwrap().coerce(), date(2025, 1, 1));
    }

    #[test]
    fn receipt_marks_delivery() {
        let mut o = order(1000);
        o.is_delivery_required = true;

        let err = o.receive().unwrap_err();
        assert_eq!(err.event, Event::StorageReceipt);
        assert_eq!(err.status, Status::Created);

        _ = o.confirm_payment(date(2025, 1, 1)).unwrap();
        o.receive().unwrap();
        assert_eq!(o.status, Status::InStorage);
        assert!(o.is_delivered);
    }

    #[test]
    fn extends_end_date_and_price() {
        let mut o = in_storage(1000, date(2024, 12, 2));
        assert_eq!(o.end_date.unwrap().coerce(), date(2025, 1, 1));

        let surcharge =
            o.extend(Term::ThreeMonths, date(2024, 12, 20)).unwrap();

        assert_eq!(surcharge, Money::new(3000, Currency::Rub));
        assert_eq!(o.final_price, Money::new(4000, Currency::Rub));
        assert_eq!(o.end_date.unwrap().coerce(), date(2025, 4, 1));
        assert_eq!(o.status, Status::InStorage);
    }

    #[test]
    fn extension_requires_storage() {
        let mut o = order(1000);

        let err = o.extend(Term::OneMonth, date(2025, 1, 1)).unwrap_err();

        assert_eq!(err.event, Event::Extension);
        assert_eq!(o.final_price, Money::new(1000, Currency::Rub));
        assert!(o.end_date.is_none());
    }

    #[test]
    fn expires_only_overdue() {
        let mut o = in_storage(1000, date(2025, 1, 1));
        let end = date(2025, 1, 31);
        assert_eq!(o.end_date.unwrap().coerce(), end);

        assert!(!o.expire(end).unwrap());
        assert_eq!(o.status, Status::InStorage);

        assert!(o.expire(date(2025, 2, 1)).unwrap());
        assert_eq!(o.status, Status::Expired);

        let err = o.expire(date(2025, 2, 2)).unwrap_err();
        assert_eq!(err.event, Event::Expiry);
    }

    #[test]
    fn pickup_after_expiry() {
        let mut o = in_storage(1000, date(2025, 1, 1));
        assert!(o.expire(date(2025, 3, 1)).unwrap());

        o.complete_pickup().unwrap();
        assert_eq!(o.status, Status::Completed);

        assert!(o.complete_pickup().is_err());
        assert!(o.cancel().is_err());
        assert!(o.receive().is_err());
        assert!(o.confirm_payment(date(2025, 3, 1)).is_err());
    }

    #[test]
    fn cancellation() {
        let mut created = order(1000);
        created.cancel().unwrap();
        assert_eq!(created.status, Status::Cancelled);

        let mut paid = order(1000);
        _ = paid.confirm_payment(date(2025, 1, 1)).unwrap();
        paid.cancel().unwrap();
        assert_eq!(paid.status, Status::Cancelled);

        let mut stored = in_storage(1000, date(2025, 1, 1));
        let err = stored.cancel().unwrap_err();
        assert_eq!(err.status, Status::InStorage);
        assert_eq!(stored.status, Status::InStorage);
    }

    #[test]
    fn unlisted_transitions_are_rejected() {
        let today = date(2025, 1, 1);
        for &status in Status::ALL {
            let mut o = order(1000);
            o.override_status(status, today);

            let snapshot = (o.status, o.start_date, o.end_date, o.final_price);
            let results = [
                (o.clone().receive().is_ok(), status == Status::Paid),
                (
                    o.clone().extend(Term::OneMonth, today).is_ok(),
                    status == Status::InStorage,
                ),
                (
                    o.clone().complete_pickup().is_ok(),
                    matches!(status, Status::InStorage | Status::Expired),
                ),
                (
                    o.clone().cancel().is_ok(),
                    matches!(status, Status::Created | Status::Paid),
                ),
                (
                    o.clone().confirm_payment(today).is_ok(),
                    matches!(status, Status::Created | Status::Paid),
                ),
                (
                    o.clone().expire(today).is_ok(),
                    status == Status::InStorage,
                ),
            ];
            for (i, (actual, expected)) in results.into_iter().enumerate() {
                assert_eq!(actual, expected, "{status}: transition #{i}");
            }
            assert_eq!(
                snapshot,
                (o.status, o.start_date, o.end_date, o.final_price),
            );
        }
    }

    #[test]
    fn override_fills_dates() {
        let mut o = order(1000);

        o.override_status(Status::InStorage, date(2025, 1, 1));

        assert_eq!(o.status, Status::InStorage);
        assert_eq!(o.start_date.unwrap().coerce(), date(2025, 1, 1));
        assert_eq!(o.end_date.unwrap().coerce(), date(2025, 1, 31));
        assert!(o.end_date.unwrap().coerce::<()>()
            >= o.start_date.unwrap().coerce::<()>());
    }

    #[test]
    fn days_left() {
        let o = in_storage(1000, date(2025, 1, 1));

        assert_eq!(o.days_left(date(2025, 1, 1)), Some(30));
        assert_eq!(o.days_left(date(2025, 2, 1)), Some(-1));
        assert!(o.is_overdue(date(2025, 2, 1)));
        assert_eq!(order(1000).days_left(date(2025, 1, 1)), None);
    }

    #[test]
    fn reminds_once_a_day() {
        let mut o = in_storage(1000, date(2025, 1, 1));
        let today = date(2025, 1, 24);

        assert_eq!(o.remind(today), Some(7));
        assert_eq!(o.remind(today), None);
        assert_eq!(o.last_reminded_on.unwrap().coerce(), today);

        assert_eq!(o.remind(date(2025, 1, 25)), None);
        assert_eq!(o.remind(date(2025, 1, 28)), Some(3));
        assert_eq!(o.remind(date(2025, 1, 30)), Some(1));
    }

    #[test]
    fn reminds_only_stored() {
        let mut o = order(1000);
        _ = o.confirm_payment(date(2025, 1, 1)).unwrap();

        assert_eq!(o.remind(date(2025, 1, 24)), None);
        assert!(o.last_reminded_on.is_none());
    }

    #[test]
    fn invalid_transition_message() {
        let mut o = order(1000);

        let err = o.complete_pickup().unwrap_err();

        assert_eq!(
            err.to_string(),
            format!(
                "`Order(id: {})` in `CREATED` status doesn't allow pickup",
                o.id,
            ),
        );
    }
}
