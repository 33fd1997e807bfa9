//! The bank API client.
//!
//! The `Bank` trait is the seam between ingestion and the network. `UpBank` talks to the Up Bank
//! REST API; `TestBank` serves seeded pages from memory so that the whole program can be run
//! without credentials.

mod bank_test_client;
mod up;

use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub(crate) use bank_test_client::TestBank;
pub(crate) use up::UpBank;

/// When this environment variable is set and non-empty, `Mode::from_env` returns `Mode::Test`.
pub const TEST_MODE_ENV: &str = "PENNYPAL_IN_TEST_MODE";

/// Selects the `Bank` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Talk to the Up Bank API.
    #[default]
    Up,
    /// Serve seeded transactions from memory.
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Up,
        }
    }
}

/// A source of paginated bank transactions.
#[async_trait::async_trait]
pub(crate) trait Bank: Send {
    /// Requests the first page of transactions created at or after `since`, or of all
    /// transactions when `since` is `None`.
    async fn first_page(&mut self, since: Option<DateTime<Utc>>) -> Result<Page>;

    /// Requests the page at `url`, which came from a previous page's `links.next`.
    async fn next_page(&mut self, url: &str) -> Result<Page>;
}

/// Creates the `Bank` for `mode`. In `Mode::Up` the bearer token is read from the secrets file.
pub(crate) async fn bank(config: &Config, mode: Mode) -> Result<Box<dyn Bank>> {
    match mode {
        Mode::Up => {
            let token_path = config.token_path();
            let token = utils::read(&token_path)
                .await
                .context("Unable to read the API token, check the token file")?;
            Ok(Box::new(UpBank::new(
                config.api_url(),
                token.trim(),
                config.page_size(),
            )?))
        }
        Mode::Test => Ok(Box::new(TestBank::default())),
    }
}

/// Collects every transaction from `since` onwards by following `links.next` until it is absent.
pub(crate) async fn fetch_all(
    bank: &mut dyn Bank,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<UpTransaction>> {
    let mut page = bank.first_page(since).await?;
    let mut all = Vec::new();
    let mut count = 1;
    loop {
        debug!("Received page {count} with {} transactions", page.data.len());
        all.append(&mut page.data);
        match page.links.next.take() {
            Some(next) => {
                page = bank.next_page(&next).await?;
                count += 1;
            }
            None => break,
        }
    }
    Ok(all)
}

/// One page of the `/transactions` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Page {
    #[serde(default)]
    pub(crate) data: Vec<UpTransaction>,
    #[serde(default)]
    pub(crate) links: Links,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub(crate) prev: Option<String>,
    #[serde(default)]
    pub(crate) next: Option<String>,
}

/// A transaction resource as the bank returns it. Only the fields that are used are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UpTransaction {
    pub(crate) id: String,
    pub(crate) attributes: Attributes,
    #[serde(default)]
    pub(crate) relationships: Relationships,
}

impl UpTransaction {
    /// The bank's category id, e.g. `restaurants-and-cafes`.
    pub(crate) fn category_id(&self) -> Option<&str> {
        self.relationships
            .category
            .data
            .as_ref()
            .map(|r| r.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Attributes {
    pub(crate) description: String,
    pub(crate) amount: Money,
    pub(crate) created_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) transaction_type: Option<String>,
}

/// Negative for money leaving the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Money {
    #[serde(default)]
    pub(crate) currency_code: String,
    pub(crate) value: String,
    pub(crate) value_in_base_units: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Relationships {
    #[serde(default)]
    pub(crate) category: Relationship,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Relationship {
    #[serde(default)]
    pub(crate) data: Option<ResourceRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ResourceRef {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) id: String,
}
