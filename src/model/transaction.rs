use crate::model::{Amount, Category};
use crate::utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored expense. `amount` is always the positive magnitude of the debit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) id: i64,
    /// The bank's id for ingested transactions; `None` for manually entered ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) external_id: Option<String>,
    pub(crate) description: String,
    pub(crate) amount: Amount,
    pub(crate) category: Option<Category>,
    pub(crate) date: DateTime<Utc>,
    pub(crate) note: String,
}

impl Transaction {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// Set any of the fields on `self` that are set in `update`.
    pub fn merge_updates(&mut self, update: TransactionUpdates) {
        if let Some(x) = update.description {
            self.description = x;
        }
        if let Some(x) = update.amount {
            self.amount = x;
        }
        if update.clear_category {
            self.category = None;
        } else if let Some(x) = update.category {
            self.category = Some(x);
        }
        if let Some(x) = update.note {
            self.note = x;
        }
    }

    /// The cells used when this transaction is rendered as a table or CSV row.
    pub(crate) fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            utils::format_timestamp(&self.date),
            self.description.clone(),
            self.amount.to_string(),
            self.category.map(|c| c.to_string()).unwrap_or_default(),
            self.note.clone(),
        ]
    }

    pub(crate) const HEADERS: [&'static str; 6] =
        ["id", "date", "description", "amount", "category", "note"];
}

/// A transaction that has not been stored yet, either from the bank or entered by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NewTransaction {
    pub external_id: Option<String>,
    pub description: String,
    pub amount: Amount,
    pub category: Option<Category>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
}

/// The editable fields of a transaction. Fields left as `None` are not changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Moves the transaction back to uncategorised. Takes precedence over `category`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clear_category: bool,
}

impl TransactionUpdates {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.note.is_none()
            && !self.clear_category
    }
}

/// One edited row in a bulk save: the id of the row and the fields that changed.
///
/// ```json
/// { "id": 12, "category": "Groceries", "amount": "$45.10" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionEdit {
    pub id: i64,
    #[serde(flatten)]
    pub updates: TransactionUpdates,
}
