//! Pulls new transactions from the bank and stores the expenses among them.

use crate::api::{fetch_all, Bank, UpTransaction};
use crate::db::Db;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Category, NewTransaction};
use crate::Result;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Transaction types that move money between the owner's own accounts.
const TRANSFER_TYPES: [&str; 2] = ["Transfer", "Scheduled Transfer"];

/// What one ingestion run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// The cursor the bank was asked for, `None` for a full download.
    pub since: Option<DateTime<Utc>>,
    pub fetched: usize,
    /// Credits, zero amounts and transfers.
    pub skipped: usize,
    pub inserted: u64,
}

/// The bank cursor: one second after the newest stored transaction.
pub(crate) fn cursor(last_stored: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    last_stored.and_then(|t| t.checked_add_signed(TimeDelta::seconds(1)))
}

/// Maps a bank category id onto the budget categories.
pub(crate) fn recategorise(bank_category: &str) -> Category {
    match bank_category {
        "restaurants-and-cafes" | "pubs-and-bars" | "takeaway" => Category::RestaurantsAndTakeaway,
        "events-and-gigs" | "hobbies" | "holidays-and-travel" => {
            Category::EntertainmentAndRecreation
        }
        "clothing-and-accessories" | "clothing-and-accesories" => Category::ClothingAndAccessories,
        "hair-and-beauty" | "health-and-medical" => Category::HealthAndBeauty,
        "fitness-and-wellbeing" | "tv-and-music" | "technology" | "internet"
        | "games-and-software" => Category::SubscriptionsAndMemberships,
        "groceries" => Category::Groceries,
        "fuel" | "public-transport" | "cycling" => Category::Transportation,
        "homeware-and-appliances" | "home-maintenance-and-improvements" => Category::Shopping,
        "car-insurance-and-maintenance" => Category::LifeAdmin,
        _ => Category::Other,
    }
}

/// Converts a bank transaction into an expense, or `None` if it is money coming in or a transfer
/// between accounts.
pub(crate) fn extract(t: &UpTransaction) -> Option<NewTransaction> {
    let cents = t.attributes.amount.value_in_base_units;
    if cents >= 0 {
        return None;
    }
    if let Some(kind) = t.attributes.transaction_type.as_deref() {
        if TRANSFER_TYPES.contains(&kind) {
            return None;
        }
    }
    Some(NewTransaction {
        external_id: Some(t.id.clone()),
        description: t.attributes.description.clone(),
        amount: Amount::from_cents(-cents),
        category: t.category_id().map(recategorise),
        date: t.attributes.created_at,
        note: String::new(),
    })
}

/// Fetches everything newer than the last stored transaction and inserts the expenses. Running
/// it twice in a row inserts nothing the second time.
pub(crate) async fn ingest(db: &Db, bank: &mut dyn Bank) -> Result<IngestSummary> {
    let since = cursor(
        db.last_ingested_date()
            .await
            .pub_result(ErrorType::Database)?,
    );
    match since {
        Some(s) => debug!("Fetching transactions since {s}"),
        None => debug!("No stored transactions, fetching everything"),
    }

    let fetched = fetch_all(bank, since)
        .await
        .pub_result(ErrorType::Request)?;
    let expenses: Vec<NewTransaction> = fetched
        .iter()
        .filter_map(|t| {
            let expense = extract(t);
            if expense.is_none() {
                trace!("Skipping {} '{}'", t.id, t.attributes.description);
            }
            expense
        })
        .collect();
    let skipped = fetched.len() - expenses.len();
    let inserted = db
        .insert_ingested(&expenses)
        .await
        .pub_result(ErrorType::Database)?;

    Ok(IngestSummary {
        since,
        fetched: fetched.len(),
        skipped,
        inserted,
    })
}
