//! Insert command handlers.

use crate::args::InsertTransactionArgs;
use crate::commands::Out;
use crate::error::{not_found, ErrorType, IntoResult};
use crate::model::{NewTransaction, Transaction};
use crate::{utils, Config, Result};
use anyhow::ensure;

/// Inserts an expense that did not come from the bank.
///
/// The description must not be empty and the amount must be greater than zero. A date without a
/// time means midnight at the configured UTC offset.
///
/// # Returns
///
/// On success, returns an `Out` containing the stored `Transaction` with its new id.
///
/// # Errors
///
/// - Returns an `Input` error if a field is missing or invalid.
/// - Returns a `Database` error if the insert fails.
pub async fn insert_transaction(
    config: Config,
    args: InsertTransactionArgs,
) -> Result<Out<Transaction>> {
    let new = new_transaction(&config, &args).pub_result(ErrorType::Input)?;
    let db = config.db();
    let id = db
        .insert_transaction(&new)
        .await
        .pub_result(ErrorType::Database)?;
    let stored = db
        .get_transaction(id)
        .await
        .pub_result(ErrorType::Database)?
        .ok_or_else(|| not_found(format!("Transaction not found: {id}")))?;
    Ok(Out::new(
        format!("Inserted transaction {id} '{}'", stored.description()),
        stored,
    ))
}

fn new_transaction(config: &Config, args: &InsertTransactionArgs) -> Result<NewTransaction> {
    let description = args.description().trim();
    ensure!(!description.is_empty(), "The description cannot be empty");
    let amount = args.amount().rounded();
    ensure!(
        amount.is_positive(),
        "The amount must be greater than zero, got {}",
        args.amount()
    );
    let date = utils::parse_user_timestamp(args.date(), config.offset()?)?;
    Ok(NewTransaction {
        external_id: None,
        description: description.to_string(),
        amount,
        category: args.category(),
        date,
        note: args.note().unwrap_or_default().to_string(),
    })
}
