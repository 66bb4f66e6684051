//! [`Notification`] definitions.

use common::Money;
use derive_more::Display;

use crate::domain::{order, Order, Unit};

/// Numbers of days left until a rental end at which a reminder is sent.
pub const REMINDER_THRESHOLDS: [u8; 5] = [30, 14, 7, 3, 1];

/// Message to be delivered to a customer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notification {
    /// [`order::Email`] of the recipient.
    pub recipient: order::Email,

    /// Subject of this [`Notification`].
    pub subject: String,

    /// Plain text body of this [`Notification`].
    pub body: String,

    /// ID of the [`Order`] this [`Notification`] is about.
    pub order_id: order::Id,

    /// [`Kind`] of this [`Notification`].
    pub kind: Kind,
}

/// Kind of a [`Notification`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Kind {
    /// Rental ends in the provided number of days.
    #[display("reminder ({_0} days)")]
    Reminder(u8),

    /// Rental is over.
    #[display("expired")]
    Expired,

    /// Payment is received.
    #[display("payment confirmed")]
    PaymentConfirmed,

    /// Rental is extended.
    #[display("extended")]
    Extended,
}

impl Notification {
    /// Creates a reminder [`Notification`] about the rental of the provided
    /// [`Order`] ending in `threshold` days.
    #[must_use]
    pub fn reminder(order: &Order, unit: Option<&Unit>, threshold: u8) -> Self {
        let end = order
            .end_date
            .map_or_else(|| "-".to_owned(), |d| d.to_string());

        let subject = match threshold {
            1 => "Your storage rental ends tomorrow".to_owned(),
            t => format!("Your storage rental ends in {t} days"),
        };
        let body = format!(
            "Dear customer,\n\n\
             the rental of your storage unit ends in {threshold} day(s), \
             on {end}.\n\n\
             Order: {id}\n\
             Unit: {unit}\n\
             End date: {end}\n\n\
             Extend the rental to keep your goods stored.",
            id = order.id,
            unit = unit_name(order, unit),
        );

        Self {
            recipient: order.contact.email.clone(),
            subject,
            body,
            order_id: order.id,
            kind: Kind::Reminder(threshold),
        }
    }

    /// Creates a [`Notification`] about the rental of the provided [`Order`]
    /// being over.
    ///
    /// The body mentions the price of a single month extension.
    #[must_use]
    pub fn expired(order: &Order, unit: Option<&Unit>) -> Self {
        let end = order
            .end_date
            .map_or_else(|| "-".to_owned(), |d| d.to_string());
        let body = format!(
            "Dear customer,\n\n\
             the rental of your storage unit ended on {end}.\n\n\
             Order: {id}\n\
             Unit: {unit}\n\n\
             Your goods are still kept at the warehouse. Extend the rental \
             for {price} per month or pick them up.",
            id = order.id,
            unit = unit_name(order, unit),
            price = order.base_price,
        );

        Self {
            recipient: order.contact.email.clone(),
            subject: "Your storage rental is over".to_owned(),
            body,
            order_id: order.id,
            kind: Kind::Expired,
        }
    }

    /// Creates a [`Notification`] about the payment of the provided [`Order`]
    /// being received.
    #[must_use]
    pub fn payment_confirmed(order: &Order) -> Self {
        let period = dates(order);
        let body = format!(
            "Dear customer,\n\n\
             the payment of {price} for order {id} is received.\n\
             Rental period: {period}.",
            id = order.id,
            price = order.final_price,
        );

        Self {
            recipient: order.contact.email.clone(),
            subject: "Payment received".to_owned(),
            body,
            order_id: order.id,
            kind: Kind::PaymentConfirmed,
        }
    }

    /// Creates a [`Notification`] about the rental of the provided [`Order`]
    /// being extended for the provided `surcharge`.
    #[must_use]
    pub fn extended(order: &Order, surcharge: Money) -> Self {
        let end = order
            .end_date
            .map_or_else(|| "-".to_owned(), |d| d.to_string());
        let body = format!(
            "Dear customer,\n\n\
             the rental of order {id} is extended until {end}.\n\
             Surcharge: {surcharge}.\n\
             A manager will contact you to confirm the payment.",
            id = order.id,
        );

        Self {
            recipient: order.contact.email.clone(),
            subject: "Rental extended".to_owned(),
            body,
            order_id: order.id,
            kind: Kind::Extended,
        }
    }
}

/// Returns a human-readable name of the [`Unit`] rented by the provided
/// [`Order`].
fn unit_name(order: &Order, unit: Option<&Unit>) -> String {
    unit.map_or_else(|| order.unit_id.to_string(), |u| u.name.clone())
}

/// Formats the rental period of the provided [`Order`].
fn dates(order: &Order) -> String {
    match (order.start_date, order.end_date) {
        (Some(start), Some(end)) => format!("{start} - {end}"),
        (Some(start), None) => format!("since {start}"),
        (None, _) => "not started".to_owned(),
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};

    use crate::domain::{
        order::spec::{date, order},
        unit, Unit,
    };

    use super::{Kind, Notification};

    #[test]
    fn reminder_addresses_contact() {
        let mut o = order(1000);
        _ = o.confirm_payment(date(2025, 1, 1)).unwrap();
        o.receive().unwrap();
        let threshold = o.remind(date(2025, 1, 24)).unwrap();

        let n = Notification::reminder(&o, None, threshold);

        assert_eq!(n.kind, Kind::Reminder(7));
        assert_eq!(n.recipient, o.contact.email);
        assert_eq!(n.order_id, o.id);
        assert!(n.subject.contains("7 days"));
        assert!(n.body.contains("2025-01-31"));
        assert!(n.body.contains("small"));
    }

    #[test]
    fn reminder_names_unit() {
        let mut o = order(1000);
        _ = o.confirm_payment(date(2025, 1, 1)).unwrap();
        let u = Unit {
            id: unit::Id::new("small").unwrap(),
            name: "Small box".to_owned(),
            size: "1 m³".to_owned(),
            dimensions: "1 × 1 × 1 m".to_owned(),
            description: String::new(),
            price_per_month: o.base_price,
        };

        let n = Notification::reminder(&o, Some(&u), 1);

        assert!(n.subject.contains("tomorrow"));
        assert!(n.body.contains("Small box"));
    }

    #[test]
    fn expired_mentions_extension_price() {
        let mut o = order(2500);
        _ = o.confirm_payment(date(2025, 1, 1)).unwrap();

        let n = Notification::expired(&o, None);

        assert_eq!(n.kind, Kind::Expired);
        assert!(n.body.contains(&Money::new(2500, Currency::Rub).to_string()));
    }

    #[test]
    fn payment_and_extension() {
        let mut o = order(1000);
        _ = o.confirm_payment(date(2025, 1, 1)).unwrap();

        let paid = Notification::payment_confirmed(&o);
        assert_eq!(paid.kind, Kind::PaymentConfirmed);
        assert!(paid.body.contains("2025-01-01 - 2025-01-31"));

        let extended =
            Notification::extended(&o, Money::new(3000, Currency::Rub));
        assert_eq!(extended.kind, Kind::Extended);
        assert!(extended.body.contains("3000RUB"));
    }
}
