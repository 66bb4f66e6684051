//! Pricing of [`Order`]s.
//!
//! [`Order`]: crate::domain::Order

use common::{Money, Percent};
use rust_decimal::Decimal;

use crate::domain::{
    catalog::Delivery,
    order::{DeliveryMode, Term},
};

/// Price breakdown of a storage rental.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Breakdown {
    /// Price of the whole [`Term`] before any discounts.
    pub base: Money,

    /// Amount deducted for the customer delivering the goods by themselves.
    pub self_delivery_deduction: Money,

    /// Amount deducted by the applied promo code.
    pub promo_deduction: Money,

    /// Final price to be paid.
    pub total: Money,
}

impl Breakdown {
    /// Computes the [`Breakdown`] of renting a unit with the provided monthly
    /// `rate` for the provided [`Term`].
    ///
    /// The self-delivery discount is always applied before the promo one, and
    /// each of them is rounded down to an integer amount. The `promo`
    /// discount is trusted to be validated already.
    #[must_use]
    pub fn compute(
        rate: Money,
        term: Term,
        mode: DeliveryMode,
        delivery: &Delivery,
        promo: Option<Percent>,
    ) -> Self {
        let base = rate * Decimal::from(term.months());

        let after_delivery = match mode {
            DeliveryMode::SelfDelivery => {
                (base * delivery.self_delivery_factor()).floor()
            }
            DeliveryMode::PickupService => base,
        };

        let total = match promo {
            Some(p) => (after_delivery * p.complement_factor()).floor(),
            None => after_delivery,
        };

        Self {
            base,
            self_delivery_deduction: base - after_delivery,
            promo_deduction: after_delivery - total,
            total,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{money::Currency, Money, Percent};
    use rust_decimal::Decimal;

    use crate::domain::{
        catalog::Delivery,
        order::{DeliveryMode, Term},
    };

    use super::Breakdown;

    fn rub(amount: i64) -> Money {
        Money::new(amount, Currency::Rub)
    }

    fn delivery() -> Delivery {
        Delivery::new(Decimal::from_str("0.8").unwrap()).unwrap()
    }

    #[test]
    fn self_delivery_with_promo() {
        let b = Breakdown::compute(
            rub(3000),
            Term::ThreeMonths,
            DeliveryMode::SelfDelivery,
            &delivery(),
            Percent::new(15),
        );

        assert_eq!(
            b,
            Breakdown {
                base: rub(9000),
                self_delivery_deduction: rub(1800),
                promo_deduction: rub(1080),
                total: rub(6120),
            },
        );
    }

    #[test]
    fn pickup_service_without_promo() {
        let b = Breakdown::compute(
            rub(3000),
            Term::SixMonths,
            DeliveryMode::PickupService,
            &delivery(),
            None,
        );

        assert_eq!(b.base, rub(18000));
        assert_eq!(b.self_delivery_deduction, rub(0));
        assert_eq!(b.promo_deduction, rub(0));
        assert_eq!(b.total, rub(18000));
    }

    #[test]
    fn rounds_down_each_step() {
        // 999 * 0.8 = 799.2 -> 799; 799 * 0.67 = 535.33 -> 535
        let b = Breakdown::compute(
            rub(999),
            Term::OneMonth,
            DeliveryMode::SelfDelivery,
            &delivery(),
            Percent::new(33),
        );

        assert_eq!(b.self_delivery_deduction, rub(200));
        assert_eq!(b.total, rub(535));
        assert_eq!(b.promo_deduction, rub(264));
    }

    #[test]
    fn total_is_integer_and_bounded() {
        for rate in [1, 7, 999, 1234, 3000, 4999] {
            for &term in Term::ALL {
                for &mode in DeliveryMode::ALL {
                    for promo in [
                        None,
                        Percent::new(0),
                        Percent::new(15),
                        Percent::new(99),
                        Percent::new(100),
                    ] {
                        let b = Breakdown::compute(
                            rub(rate),
                            term,
                            mode,
                            &delivery(),
                            promo,
                        );

                        assert!(b.total.amount.is_integer());
                        assert!(b.total.amount <= b.base.amount);
                        assert!(!b.total.is_negative());
                        assert_eq!(
                            b.base,
                            b.total + b.self_delivery_deduction
                                + b.promo_deduction,
                        );
                    }
                }
            }
        }
    }
}
