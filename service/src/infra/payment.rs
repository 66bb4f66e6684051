//! Payment provider integration.

use common::Money;
use derive_more::{AsRef, Display};
use url::Url;

use crate::domain::order;

/// Builder of payment links to the provider's checkout page.
#[derive(Clone, Debug)]
pub struct Link {
    /// Base URL of the checkout page.
    base_url: Url,
}

impl Link {
    /// Creates a new [`Link`] builder with the provided checkout page
    /// `base_url`.
    ///
    /// [`None`] is returned unless `base_url` is an absolute HTTP(S) URL
    /// with a host and without a fragment.
    #[must_use]
    pub fn new(base_url: &str) -> Option<Self> {
        let base_url = Url::parse(base_url).ok()?;
        let valid = matches!(base_url.scheme(), "http" | "https")
            && base_url.host().is_some()
            && base_url.fragment().is_none();
        valid.then_some(Self { base_url })
    }

    /// Builds the [`Reference`] the customer should follow to pay the
    /// provided [`Invoice`].
    #[must_use]
    pub fn reference(&self, invoice: &Invoice) -> Reference {
        let Invoice { order_id, amount } = invoice;

        let mut url = self.base_url.clone();
        _ = url
            .query_pairs_mut()
            .append_pair("order", &order_id.to_string())
            .append_pair("amount", &amount.amount.normalize().to_string())
            .append_pair("currency", &amount.currency.to_string());
        Reference(url.into())
    }
}

/// Amount to be paid for an [`Order`].
///
/// [`Order`]: crate::domain::Order
#[derive(Clone, Copy, Debug)]
pub struct Invoice {
    /// ID of the paid [`Order`].
    ///
    /// [`Order`]: crate::domain::Order
    pub order_id: order::Id,

    /// Amount to be paid.
    pub amount: Money,
}

/// Link to the payment provider's checkout page.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
pub struct Reference(String);

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};

    use crate::domain::order;

    use super::{Invoice, Link};

    #[test]
    fn accepts_only_http_urls() {
        assert!(Link::new("https://pay.example.com/checkout").is_some());
        assert!(Link::new("http://localhost:8080").is_some());
        assert!(Link::new("ftp://pay.example.com").is_none());
        assert!(Link::new("pay.example.com").is_none());
        assert!(Link::new("https://pay example.com").is_none());
        assert!(Link::new("http://").is_none());
    }

    #[test]
    fn rejects_urls_with_fragment() {
        assert!(Link::new("https://pay.example.com/checkout#pay").is_none());
        assert!(Link::new("https://pay.example.com/#").is_none());
    }

    #[test]
    fn builds_reference() {
        let id = order::Id::new();
        let invoice = Invoice {
            order_id: id,
            amount: Money::new(6120, Currency::Rub),
        };

        let plain = Link::new("https://pay.example.com/checkout").unwrap();
        assert_eq!(
            plain.reference(&invoice).as_ref(),
            format!(
                "https://pay.example.com/checkout\
                 ?order={id}&amount=6120&currency=RUB",
            ),
        );

        let with_query = Link::new("https://pay.example.com/?shop=7").unwrap();
        assert_eq!(
            with_query.reference(&invoice).as_ref(),
            format!(
                "https://pay.example.com/?shop=7\
                 &order={id}&amount=6120&currency=RUB",
            ),
        );
    }
}
