//! Implements the `Bank` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without an Up Bank account. See `Mode::Test`.

use crate::api::{Bank, Links, Page, UpTransaction};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};

const PAGE_PREFIX: &str = "test://transactions?page=";
const DEFAULT_PAGE_SIZE: usize = 5;

/// Serves `transactions` newest first in pages of `page_size`, with `test://` next links.
pub(crate) struct TestBank {
    transactions: Vec<UpTransaction>,
    page_size: usize,
    /// The transactions selected by the last `first_page` call.
    selected: Vec<UpTransaction>,
}

impl TestBank {
    pub(crate) fn new(mut transactions: Vec<UpTransaction>) -> Self {
        transactions.sort_by(|a, b| b.attributes.created_at.cmp(&a.attributes.created_at));
        Self {
            transactions,
            page_size: DEFAULT_PAGE_SIZE,
            selected: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.transactions.len()
    }

    fn page(&self, index: usize) -> Page {
        let start = index * self.page_size;
        let data: Vec<UpTransaction> = self
            .selected
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();
        let next = if start + self.page_size < self.selected.len() {
            Some(format!("{PAGE_PREFIX}{}", index + 1))
        } else {
            None
        };
        let prev = index.checked_sub(1).map(|i| format!("{PAGE_PREFIX}{i}"));
        Page {
            data,
            links: Links { prev, next },
        }
    }
}

#[async_trait::async_trait]
impl Bank for TestBank {
    /// `since` is inclusive, like the real API's `filter[since]`.
    async fn first_page(&mut self, since: Option<DateTime<Utc>>) -> Result<Page> {
        self.selected = self
            .transactions
            .iter()
            .filter(|t| since.map_or(true, |s| t.attributes.created_at >= s))
            .cloned()
            .collect();
        Ok(self.page(0))
    }

    async fn next_page(&mut self, url: &str) -> Result<Page> {
        let Some(index) = url.strip_prefix(PAGE_PREFIX) else {
            bail!("Unexpected next link '{url}'");
        };
        let index: usize = index
            .parse()
            .with_context(|| format!("Bad page number in '{url}'"))?;
        Ok(self.page(index))
    }
}

impl Default for TestBank {
    /// Loads seed data from this module.
    fn default() -> Self {
        // The seed data is a compile-time constant that the tests below parse
        let transactions = serde_json::from_str(SEED_TRANSACTIONS).unwrap_or_default();
        Self::new(transactions)
    }
}

/// Seed transactions in the shape the Up API returns them. Five of them are not expenses: a
/// salary credit, a refund, a zero-value card check and two transfers.
const SEED_TRANSACTIONS: &str = r#"[
  {
    "id": "seed-0001",
    "attributes": {
      "description": "Woolworths Metro",
      "amount": { "currencyCode": "AUD", "value": "-45.10", "valueInBaseUnits": -4510 },
      "createdAt": "2025-01-06T09:12:00+11:00",
      "transactionType": "Purchase"
    },
    "relationships": { "category": { "data": { "type": "categories", "id": "groceries" } } }
  },
  {
    "id": "seed-0002",
    "attributes": {
      "description": "Salary",
      "amount": { "currencyCode": "AUD", "value": "2500.00", "valueInBaseUnits": 250000 },
      "createdAt": "2025-01-06T00:05:00+11:00",
      "transactionType": "Direct Credit"
    },
    "relationships": { "category": { "data": null } }
  },
  {
    "id": "seed-0003",
    "attributes": {
      "description": "Guzman y Gomez",
      "amount": { "currencyCode": "AUD", "value": "-18.50", "valueInBaseUnits": -1850 },
      "createdAt": "2025-01-07T12:30:00+11:00",
      "transactionType": "Purchase"
    },
    "relationships": { "category": { "data": { "type": "categories", "id": "takeaway" } } }
  },
  {
    "id": "seed-0004",
    "attributes": {
      "description": "Transfer to Savings",
      "amount": { "currencyCode": "AUD", "value": "-500.00", "valueInBaseUnits": -50000 },
      "createdAt": "2025-01-08T07:00:00+11:00",
      "transactionType": "Transfer"
    },
    "relationships": { "category": { "data": null } }
  },
  {
    "id": "seed-0005",
    "attributes": {
      "description": "Opal Travel",
      "amount": { "currencyCode": "AUD", "value": "-4.20", "valueInBaseUnits": -420 },
      "createdAt": "2025-01-08T08:01:00+11:00",
      "transactionType": "Purchase"
    },
    "relationships": { "category": { "data": { "type": "categories", "id": "public-transport" } } }
  },
  {
    "id": "seed-0006",
    "attributes": {
      "description": "Netflix",
      "amount": { "currencyCode": "AUD", "value": "-18.99", "valueInBaseUnits": -1899 },
      "createdAt": "2025-01-10T03:00:00+11:00",
      "transactionType": "Purchase"
    },
    "relationships": { "category": { "data": { "type": "categories", "id": "tv-and-music" } } }
  },
  {
    "id": "seed-0007",
    "attributes": {
      "description": "Cover to Rent",
      "amount": { "currencyCode": "AUD", "value": "-300.00", "valueInBaseUnits": -30000 },
      "createdAt": "2025-01-10T09:00:00+11:00",
      "transactionType": "Scheduled Transfer"
    },
    "relationships": { "category": { "data": null } }
  },
  {
    "id": "seed-0008",
    "attributes": {
      "description": "Uniqlo",
      "amount": { "currencyCode": "AUD", "value": "-59.90", "valueInBaseUnits": -5990 },
      "createdAt": "2025-01-11T14:45:00+11:00",
      "transactionType": "Purchase"
    },
    "relationships": { "category": { "data": { "type": "categories", "id": "clothing-and-accesories" } } }
  },
  {
    "id": "seed-0009",
    "attributes": {
      "description": "Bunnings Warehouse",
      "amount": { "currencyCode": "AUD", "value": "-32.00", "valueInBaseUnits": -3200 },
      "createdAt": "2025-01-13T10:20:00+11:00",
      "transactionType": "Purchase"
    },
    "relationships": { "category": { "data": { "type": "categories", "id": "home-maintenance-and-improvements" } } }
  },
  {
    "id": "seed-0010",
    "attributes": {
      "description": "ATM Withdrawal",
      "amount": { "currencyCode": "AUD", "value": "-50.00", "valueInBaseUnits": -5000 },
      "createdAt": "2025-01-14T17:30:00+11:00",
      "transactionType": "ATM Withdrawal"
    },
    "relationships": { "category": { "data": null } }
  },
  {
    "id": "seed-0011",
    "attributes": {
      "description": "Refund from Uniqlo",
      "amount": { "currencyCode": "AUD", "value": "12.00", "valueInBaseUnits": 1200 },
      "createdAt": "2025-01-15T11:00:00+11:00",
      "transactionType": "Refund"
    },
    "relationships": { "category": { "data": { "type": "categories", "id": "clothing-and-accesories" } } }
  },
  {
    "id": "seed-0012",
    "attributes": {
      "description": "Wilson Parking",
      "amount": { "currencyCode": "AUD", "value": "-9.00", "valueInBaseUnits": -900 },
      "createdAt": "2025-01-15T18:10:00+11:00",
      "transactionType": "Purchase"
    },
    "relationships": { "category": { "data": { "type": "categories", "id": "parking" } } }
  },
  {
    "id": "seed-0013",
    "attributes": {
      "description": "Coles",
      "amount": { "currencyCode": "AUD", "value": "-61.35", "valueInBaseUnits": -6135 },
      "createdAt": "2025-01-16T19:05:00+11:00",
      "transactionType": "Purchase"
    },
    "relationships": { "category": { "data": { "type": "categories", "id": "groceries" } } }
  },
  {
    "id": "seed-0014",
    "attributes": {
      "description": "Card Check",
      "amount": { "currencyCode": "AUD", "value": "0.00", "valueInBaseUnits": 0 },
      "createdAt": "2025-01-16T19:06:00+11:00",
      "transactionType": "Purchase"
    },
    "relationships": { "category": { "data": null } }
  }
]"#;
