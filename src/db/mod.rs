//! This module is responsible for reading, writing and managing the SQLite database.
//!
//! Money is stored as integer cents and dates as UTC RFC 3339 text with a `Z` suffix, so ordering
//! and range comparisons on the `date` column are chronological.

mod migrations;

use crate::error::not_found;
use crate::model::{
    Amount, BudgetTargets, Category, NewTransaction, Transaction, TransactionEdit,
};
use crate::period::{sql_offset_modifier, Period, PeriodMode};
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

const SELECT_TRANSACTION: &str =
    "SELECT id, external_id, description, amount_cents, category, date, note FROM transactions";

/// The column that transaction listings are ordered by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Date,
    Amount,
    Description,
    Category,
}

serde_plain::derive_display_from_serialize!(SortBy);
serde_plain::derive_fromstr_from_deserialize!(SortBy);

impl SortBy {
    fn column(&self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::Amount => "amount_cents",
            SortBy::Description => "description COLLATE NOCASE",
            SortBy::Category => "category",
        }
    }
}

/// Which transactions to list and in what order.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionFilter {
    /// Half-open UTC range `[from, to)`. `None` lists every transaction.
    pub(crate) range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub(crate) category: Option<Category>,
    pub(crate) sort_by: SortBy,
    pub(crate) ascending: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the schema and seeds a zero budget row for every category
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            bail!("A database already exists at {}", path.display());
        }
        Self::open(path, true).await
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Updates the schema with migrations if it is out of date
    /// - Seeds any missing budget rows
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            bail!(
                "No database found at {}, run 'pennypal init' first",
                path.display()
            );
        }
        Self::open(path, false).await
    }

    async fn open(path: &Path, create: bool) -> Result<Self> {
        debug!("Opening SQLite database at {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Unable to open SQLite database at {}", path.display()))?;
        let db = Self { pool };
        db.bootstrap().await?;
        Ok(db)
    }

    /// Brings the schema to the current version and makes sure every category has a budget row.
    /// Safe to run on every open.
    async fn bootstrap(&self) -> Result<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await
            .context("Unable to create schema_version table")?;

        let (version,): (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .context("Unable to read schema version")?;
        let version = match version {
            Some(v) => v,
            None => {
                sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
                    .execute(&self.pool)
                    .await
                    .context("Unable to record initial schema version")?;
                0
            }
        };
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The database schema is version {version} but this program only understands \
                 up to version {}",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&self.pool, version, migrations::CURRENT_VERSION).await?;

        let mut tx = self.pool.begin().await?;
        for category in Category::ALL {
            sqlx::query("INSERT OR IGNORE INTO budget (name, budget_cents) VALUES (?, 0)")
                .bind(category.label())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Unable to seed budget row for {category}"))?;
        }
        tx.commit().await.context("Unable to seed budget rows")?;
        Ok(())
    }

    /// Inserts one transaction and returns its new id.
    pub(crate) async fn insert_transaction(&self, t: &NewTransaction) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO transactions (external_id, description, amount_cents, category, date, note) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(t.external_id.as_deref())
        .bind(&t.description)
        .bind(t.amount.cents()?)
        .bind(t.category.map(|c| c.label()))
        .bind(utils::format_timestamp(&t.date))
        .bind(&t.note)
        .execute(&self.pool)
        .await
        .context("Unable to insert transaction")?;
        Ok(result.last_insert_rowid())
    }

    /// Inserts transactions fetched from the bank in a single database transaction. Rows whose
    /// `external_id` is already stored are skipped. Returns the number of rows inserted.
    pub(crate) async fn insert_ingested(&self, transactions: &[NewTransaction]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for t in transactions {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO transactions \
                 (external_id, description, amount_cents, category, date, note) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(t.external_id.as_deref())
            .bind(&t.description)
            .bind(t.amount.cents()?)
            .bind(t.category.map(|c| c.label()))
            .bind(utils::format_timestamp(&t.date))
            .bind(&t.note)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Unable to insert transaction '{}'", t.description))?;
            if result.rows_affected() == 0 {
                trace!("Skipping already stored transaction {:?}", t.external_id);
            }
            inserted += result.rows_affected();
        }
        tx.commit()
            .await
            .context("Unable to commit ingested transactions")?;
        Ok(inserted)
    }

    /// Deletes every id in `ids`, or none of them if any id does not exist. Repeated ids are
    /// deleted once. Returns the distinct ids in the order given.
    pub(crate) async fn delete_transactions(&self, ids: &[i64]) -> Result<Vec<i64>> {
        let mut distinct = Vec::with_capacity(ids.len());
        for id in ids {
            if !distinct.contains(id) {
                distinct.push(*id);
            }
        }
        let mut tx = self.pool.begin().await?;
        for id in &distinct {
            let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Unable to delete transaction {id}"))?;
            if result.rows_affected() == 0 {
                return Err(not_found(format!("Transaction not found: {id}")));
            }
        }
        tx.commit().await.context("Unable to commit deletes")?;
        Ok(distinct)
    }

    /// Applies every edit, or none of them if any id does not exist. Returns the updated rows.
    pub(crate) async fn update_transactions(
        &self,
        edits: Vec<TransactionEdit>,
    ) -> Result<Vec<Transaction>> {
        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::with_capacity(edits.len());
        for edit in edits {
            let row = sqlx::query(&format!("{SELECT_TRANSACTION} WHERE id = ?"))
                .bind(edit.id)
                .fetch_optional(&mut *tx)
                .await
                .with_context(|| format!("Unable to read transaction {}", edit.id))?;
            let Some(row) = row else {
                return Err(not_found(format!("Transaction not found: {}", edit.id)));
            };
            let mut transaction = transaction_from_row(&row)?;
            transaction.merge_updates(edit.updates);
            transaction.amount = transaction.amount.rounded();
            ensure!(
                transaction.amount.is_positive(),
                "Transaction {} must have an amount greater than zero, got {}",
                transaction.id,
                transaction.amount
            );

            sqlx::query(
                "UPDATE transactions SET description = ?, amount_cents = ?, category = ?, note = ? \
                 WHERE id = ?",
            )
            .bind(&transaction.description)
            .bind(transaction.amount.cents()?)
            .bind(transaction.category.map(|c| c.label()))
            .bind(&transaction.note)
            .bind(transaction.id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Unable to update transaction {}", transaction.id))?;
            updated.push(transaction);
        }
        tx.commit().await.context("Unable to commit updates")?;
        Ok(updated)
    }

    pub(crate) async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!("{SELECT_TRANSACTION} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to read transaction {id}"))?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    pub(crate) async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_TRANSACTION);
        qb.push(" WHERE 1 = 1");
        if let Some((from, to)) = &filter.range {
            qb.push(" AND date >= ")
                .push_bind(utils::format_timestamp(from))
                .push(" AND date < ")
                .push_bind(utils::format_timestamp(to));
        }
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category.label());
        }
        let direction = if filter.ascending { "ASC" } else { "DESC" };
        qb.push(format!(
            " ORDER BY {} {direction}, id {direction}",
            filter.sort_by.column()
        ));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Unable to list transactions")?;
        rows.iter().map(transaction_from_row).collect()
    }

    /// Returns the number of rows in the transactions table.
    pub(crate) async fn count_transactions(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await
            .context("Unable to count transactions")?;
        Ok(u64::try_from(count)?)
    }

    /// The date of the newest transaction that came from the bank. Manual entries are ignored
    /// so that they cannot move the ingestion cursor.
    pub(crate) async fn last_ingested_date(&self) -> Result<Option<DateTime<Utc>>> {
        let (date,): (Option<String>,) = sqlx::query_as(
            "SELECT MAX(date) FROM transactions WHERE external_id IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await
        .context("Unable to read the latest transaction date")?;
        date.as_deref().map(utils::parse_stored_timestamp).transpose()
    }

    pub(crate) async fn budget_targets(&self) -> Result<BudgetTargets> {
        let rows = sqlx::query("SELECT name, budget_cents FROM budget")
            .fetch_all(&self.pool)
            .await
            .context("Unable to read budget")?;
        let mut targets = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let cents: i64 = row.try_get("budget_cents")?;
            let category = Category::from_str(&name)
                .with_context(|| format!("Unknown category '{name}' in budget table"))?;
            targets.push((category, Amount::from_cents(cents)));
        }
        Ok(BudgetTargets::new(targets))
    }

    /// Sets the weekly target of each listed category in one database transaction. Returns the
    /// full set of targets afterwards.
    pub(crate) async fn set_budget_targets(
        &self,
        targets: &[(Category, Amount)],
    ) -> Result<BudgetTargets> {
        let mut tx = self.pool.begin().await?;
        for (category, amount) in targets {
            ensure!(
                !amount.is_negative(),
                "The budget for {category} cannot be negative"
            );
            let result = sqlx::query("UPDATE budget SET budget_cents = ? WHERE name = ?")
                .bind(amount.cents()?)
                .bind(category.label())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Unable to update the budget for {category}"))?;
            if result.rows_affected() == 0 {
                return Err(not_found(format!("Budget category not found: {category}")));
            }
        }
        tx.commit().await.context("Unable to commit budget")?;
        self.budget_targets().await
    }

    /// Total spending per category for transactions in `[from, to)`. The `None` key holds
    /// uncategorised spending. Categories without spending are absent.
    pub(crate) async fn spending_by_category(
        &self,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> Result<BTreeMap<Option<Category>, Amount>> {
        let rows = sqlx::query(
            "SELECT category, SUM(amount_cents) AS total FROM transactions \
             WHERE date >= ? AND date < ? GROUP BY category",
        )
        .bind(utils::format_timestamp(from))
        .bind(utils::format_timestamp(to))
        .fetch_all(&self.pool)
        .await
        .context("Unable to sum spending by category")?;

        let mut totals = BTreeMap::new();
        for row in rows {
            let name: Option<String> = row.try_get("category")?;
            let cents: i64 = row.try_get("total")?;
            let category = name.as_deref().map(Category::from_str).transpose()?;
            totals.insert(category, Amount::from_cents(cents));
        }
        Ok(totals)
    }

    /// Total spending per period, with each transaction bucketed by its local date at
    /// `utc_offset_minutes`. Periods without spending are absent.
    pub(crate) async fn spending_by_period(
        &self,
        mode: PeriodMode,
        utc_offset_minutes: i32,
    ) -> Result<BTreeMap<Period, Amount>> {
        let rows = sqlx::query(
            "SELECT strftime(?, date, ?) AS period, SUM(amount_cents) AS total \
             FROM transactions GROUP BY period",
        )
        .bind(mode.sql_format())
        .bind(sql_offset_modifier(utc_offset_minutes))
        .fetch_all(&self.pool)
        .await
        .context("Unable to sum spending by period")?;

        let mut totals = BTreeMap::new();
        for row in rows {
            let key: Option<String> = row.try_get("period")?;
            let Some(key) = key else {
                bail!("A stored transaction has a date that SQLite cannot read");
            };
            let cents: i64 = row.try_get("total")?;
            let period = Period::from_str(&key)
                .with_context(|| format!("Unexpected period key '{key}' from the database"))?;
            totals.insert(period, Amount::from_cents(cents));
        }
        Ok(totals)
    }
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction> {
    let category: Option<String> = row.try_get("category")?;
    let date: String = row.try_get("date")?;
    Ok(Transaction {
        id: row.try_get("id")?,
        external_id: row.try_get("external_id")?,
        description: row.try_get("description")?,
        amount: Amount::from_cents(row.try_get("amount_cents")?),
        category: category.as_deref().map(Category::from_str).transpose()?,
        date: utils::parse_stored_timestamp(&date)?,
        note: row.try_get("note")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_not_found;
    use chrono::{FixedOffset, TimeZone};
    use tempfile::TempDir;

    async fn new_db() -> (TempDir, Db) {
        let dir = TempDir::new().unwrap();
        let db = Db::init(dir.path().join("pennypal.sqlite")).await.unwrap();
        (dir, db)
    }

    fn expense(
        external_id: Option<&str>,
        description: &str,
        amount: &str,
        category: Option<Category>,
        date: &str,
    ) -> NewTransaction {
        NewTransaction {
            external_id: external_id.map(String::from),
            description: description.to_string(),
            amount: Amount::from_str(amount).unwrap(),
            category,
            date: utils::parse_stored_timestamp(date).unwrap(),
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pennypal.sqlite");
        assert!(Db::load(&path).await.is_err());
        let db = Db::init(&path).await.unwrap();
        assert_eq!(db.count_transactions().await.unwrap(), 0);
        drop(db);
        assert!(Db::init(&path).await.is_err());

        let db = Db::load(&path).await.unwrap();
        let targets = db.budget_targets().await.unwrap();
        assert_eq!(targets.iter().count(), Category::ALL.len());
        assert!(targets.weekly_total().is_zero());
    }

    #[tokio::test]
    async fn test_reload_keeps_budget() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pennypal.sqlite");
        let db = Db::init(&path).await.unwrap();
        db.set_budget_targets(&[(Category::Groceries, Amount::from_str("150").unwrap())])
            .await
            .unwrap();
        drop(db);

        let db = Db::load(&path).await.unwrap();
        let targets = db.budget_targets().await.unwrap();
        assert_eq!(
            targets.weekly(Category::Groceries),
            Amount::from_str("150").unwrap()
        );
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (_dir, db) = new_db().await;
        let new = NewTransaction {
            note: "weekly shop".to_string(),
            ..expense(
                None,
                "Woolworths",
                "45.10",
                Some(Category::Groceries),
                "2025-01-14T03:15:00Z",
            )
        };
        let id = db.insert_transaction(&new).await.unwrap();
        let got = db.get_transaction(id).await.unwrap().unwrap();
        assert_eq!(got.description(), "Woolworths");
        assert_eq!(got.amount(), Amount::from_str("45.10").unwrap());
        assert_eq!(got.category(), Some(Category::Groceries));
        assert_eq!(got.note(), "weekly shop");
        assert_eq!(got.date(), new.date);
        assert!(db.get_transaction(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let (_dir, db) = new_db().await;
        let batch = vec![
            expense(Some("a"), "Coffee", "4.50", None, "2025-01-13T21:00:00Z"),
            expense(Some("b"), "Train", "3.20", None, "2025-01-14T08:00:00Z"),
        ];
        assert_eq!(db.insert_ingested(&batch).await.unwrap(), 2);
        assert_eq!(db.insert_ingested(&batch).await.unwrap(), 0);
        assert_eq!(db.count_transactions().await.unwrap(), 2);
        assert_eq!(
            db.last_ingested_date().await.unwrap().unwrap(),
            utils::parse_stored_timestamp("2025-01-14T08:00:00Z").unwrap()
        );

        // A later manual entry does not count
        db.insert_transaction(&expense(None, "Cash", "5", None, "2025-02-01T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(
            db.last_ingested_date().await.unwrap().unwrap(),
            utils::parse_stored_timestamp("2025-01-14T08:00:00Z").unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete_missing_id_changes_nothing() {
        let (_dir, db) = new_db().await;
        let id = db
            .insert_transaction(&expense(None, "Lunch", "12", None, "2025-01-14T02:00:00Z"))
            .await
            .unwrap();

        let err = db.delete_transactions(&[id, 999]).await.unwrap_err();
        assert!(is_not_found(&err));
        assert_eq!(db.count_transactions().await.unwrap(), 1);

        assert_eq!(db.delete_transactions(&[id]).await.unwrap(), vec![id]);
        assert_eq!(db.count_transactions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_repeated_id() {
        let (_dir, db) = new_db().await;
        let a = db
            .insert_transaction(&expense(None, "Lunch", "12", None, "2025-01-14T02:00:00Z"))
            .await
            .unwrap();
        let b = db
            .insert_transaction(&expense(None, "Dinner", "30", None, "2025-01-14T09:00:00Z"))
            .await
            .unwrap();

        assert_eq!(db.delete_transactions(&[a, b, a]).await.unwrap(), vec![a, b]);
        assert_eq!(db.count_transactions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_rounds_and_rejects_zero_amount() {
        let (_dir, db) = new_db().await;
        let id = db
            .insert_transaction(&expense(None, "Lunch", "12", None, "2025-01-14T02:00:00Z"))
            .await
            .unwrap();
        let edit = |amount: &str| TransactionEdit {
            id,
            updates: crate::model::TransactionUpdates {
                amount: Some(Amount::from_str(amount).unwrap()),
                ..Default::default()
            },
        };

        let updated = db.update_transactions(vec![edit("7.255")]).await.unwrap();
        assert_eq!(updated[0].amount(), Amount::from_str("7.26").unwrap());
        assert_eq!(
            db.get_transaction(id).await.unwrap().unwrap(),
            updated[0].clone()
        );

        for amount in ["0", "0.004", "-1"] {
            assert!(db.update_transactions(vec![edit(amount)]).await.is_err());
        }
        assert_eq!(
            db.get_transaction(id).await.unwrap().unwrap().amount(),
            Amount::from_str("7.26").unwrap()
        );
    }

    #[tokio::test]
    async fn test_update_is_atomic() {
        let (_dir, db) = new_db().await;
        let id = db
            .insert_transaction(&expense(None, "Lunch", "12", None, "2025-01-14T02:00:00Z"))
            .await
            .unwrap();

        let edit = |id: i64| TransactionEdit {
            id,
            updates: crate::model::TransactionUpdates {
                category: Some(Category::RestaurantsAndTakeaway),
                ..Default::default()
            },
        };
        let err = db
            .update_transactions(vec![edit(id), edit(404)])
            .await
            .unwrap_err();
        assert!(is_not_found(&err));
        assert_eq!(db.get_transaction(id).await.unwrap().unwrap().category(), None);

        let updated = db.update_transactions(vec![edit(id)]).await.unwrap();
        assert_eq!(updated[0].category(), Some(Category::RestaurantsAndTakeaway));
        assert_eq!(updated[0].description(), "Lunch");
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let (_dir, db) = new_db().await;
        let rows = vec![
            expense(None, "b", "5", Some(Category::Groceries), "2025-01-13T01:00:00Z"),
            expense(None, "a", "20", None, "2025-01-15T01:00:00Z"),
            expense(None, "c", "1", Some(Category::Groceries), "2025-01-20T01:00:00Z"),
        ];
        for r in &rows {
            db.insert_transaction(r).await.unwrap();
        }

        let all = db
            .list_transactions(&TransactionFilter::default())
            .await
            .unwrap();
        let descriptions: Vec<&str> = all.iter().map(|t| t.description()).collect();
        assert_eq!(descriptions, vec!["c", "a", "b"]);

        let week = Period::from_str("2025-W02").unwrap();
        let filter = TransactionFilter {
            range: Some(week.utc_bounds(FixedOffset::east_opt(0).unwrap()).unwrap()),
            sort_by: SortBy::Amount,
            ascending: true,
            ..Default::default()
        };
        let listed = db.list_transactions(&filter).await.unwrap();
        let descriptions: Vec<&str> = listed.iter().map(|t| t.description()).collect();
        assert_eq!(descriptions, vec!["b", "a"]);

        let filter = TransactionFilter {
            category: Some(Category::Groceries),
            sort_by: SortBy::Description,
            ascending: true,
            ..Default::default()
        };
        let listed = db.list_transactions(&filter).await.unwrap();
        let descriptions: Vec<&str> = listed.iter().map(|t| t.description()).collect();
        assert_eq!(descriptions, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_budget_rejects_negative() {
        let (_dir, db) = new_db().await;
        let result = db
            .set_budget_targets(&[
                (Category::Groceries, Amount::from_str("100").unwrap()),
                (Category::Shopping, Amount::from_str("-1").unwrap()),
            ])
            .await;
        assert!(result.is_err());
        assert!(db
            .budget_targets()
            .await
            .unwrap()
            .weekly(Category::Groceries)
            .is_zero());
    }

    #[tokio::test]
    async fn test_spending_by_category() {
        let (_dir, db) = new_db().await;
        for r in [
            expense(None, "x", "10", Some(Category::Groceries), "2025-01-13T01:00:00Z"),
            expense(None, "y", "2.5", Some(Category::Groceries), "2025-01-14T01:00:00Z"),
            expense(None, "z", "7", None, "2025-01-14T02:00:00Z"),
            expense(None, "old", "100", Some(Category::Groceries), "2025-01-01T01:00:00Z"),
        ] {
            db.insert_transaction(&r).await.unwrap();
        }
        let from = Utc.with_ymd_and_hms(2025, 1, 13, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        let totals = db.spending_by_category(&from, &to).await.unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(
            totals[&Some(Category::Groceries)],
            Amount::from_str("12.50").unwrap()
        );
        assert_eq!(totals[&None], Amount::from_str("7").unwrap());
    }

    /// SQLite's `strftime` grouping and `Period::containing` must put every transaction in the
    /// same bucket, including around year boundaries and with a non-zero offset.
    #[tokio::test]
    async fn test_sql_buckets_match_period() {
        let (_dir, db) = new_db().await;
        let dates = [
            "2024-12-29T23:30:00Z",
            "2024-12-30T10:00:00Z",
            "2024-12-31T14:30:00Z",
            "2025-01-01T00:00:00Z",
            "2025-01-05T13:59:59Z",
            "2025-01-05T14:00:00Z",
            "2025-06-30T23:59:59Z",
            "2025-12-31T23:59:59Z",
            "2026-01-04T12:00:00Z",
        ];
        for (i, d) in dates.iter().enumerate() {
            db.insert_transaction(&expense(None, &format!("t{i}"), "1", None, d))
                .await
                .unwrap();
        }

        for minutes in [0, 600, -300] {
            let offset = utils::offset_from_minutes(minutes).unwrap();
            for mode in [PeriodMode::Weekly, PeriodMode::Monthly] {
                let mut expected: BTreeMap<Period, Amount> = BTreeMap::new();
                for d in dates {
                    let t = utils::parse_stored_timestamp(d).unwrap();
                    let p = Period::containing(mode, &t, offset);
                    let total = expected.entry(p).or_default();
                    *total = *total + Amount::from_str("1").unwrap();
                }
                let actual = db.spending_by_period(mode, minutes).await.unwrap();
                assert_eq!(actual, expected, "mode {mode}, offset {minutes}");
            }
        }
    }
}
