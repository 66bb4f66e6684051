//! [`User`] read model definition.
//!
//! [`User`]: crate::domain::User

use common::{money::Currency, Money};
use rust_decimal::Decimal;

use crate::domain::{order, Order};

/// Spending statistics of a [`User`].
///
/// [`User`]: crate::domain::User
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Stats {
    /// Number of [`Order`]s placed, including cancelled ones.
    pub total_orders: usize,

    /// Sum of final prices of the non-cancelled [`Order`]s.
    pub total_spent: Money,

    /// Average final price of the non-cancelled [`Order`]s.
    pub average_order_value: Money,
}

impl Stats {
    /// Computes [`Stats`] out of the provided [`Order`]s of a single
    /// [`User`], falling back to the provided [`Currency`] when there are
    /// none to be summed.
    ///
    /// [`User`]: crate::domain::User
    #[must_use]
    pub fn compute<'o>(
        orders: impl IntoIterator<Item = &'o Order>,
        currency: Currency,
    ) -> Self {
        let mut total_orders = 0;
        let mut paid = 0_u32;
        let mut total_spent = Money::zero(currency);
        for o in orders {
            total_orders += 1;
            if o.status != order::Status::Cancelled {
                paid += 1;
                total_spent += o.final_price;
            }
        }

        let average_order_value = if paid == 0 {
            Money::zero(total_spent.currency)
        } else {
            Money::new(
                (total_spent.amount / Decimal::from(paid)).round_dp(2),
                total_spent.currency,
            )
        };

        Self {
            total_orders,
            total_spent,
            average_order_value,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};

    use crate::domain::order::{self, spec::order};

    use super::Stats;

    #[test]
    fn sums_non_cancelled_orders() {
        let mut cancelled = order(5000);
        cancelled.status = order::Status::Cancelled;
        let orders = [order(1000), order(2000), cancelled];

        let stats = Stats::compute(&orders, Currency::Rub);

        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_spent, Money::new(3000, Currency::Rub));
        assert_eq!(stats.average_order_value, Money::new(1500, Currency::Rub));
    }

    #[test]
    fn empty() {
        let stats = Stats::compute(&[], Currency::Eur);

        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_spent, Money::zero(Currency::Eur));
        assert_eq!(stats.average_order_value, Money::zero(Currency::Eur));
    }
}
