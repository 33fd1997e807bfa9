//! Update command handlers.

use crate::args::{UpdateBudgetsArgs, UpdateTransactionsArgs};
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, BudgetTargets, Category, Transaction, TransactionEdit};
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use std::path::Path;
use tracing::debug;

/// Updates one or more transactions atomically.
///
/// The edits come either from an `--edits` JSON file, where each entry names an `id` and the
/// fields to change, or from a list of ids that all receive the same changes. If any id does not
/// exist nothing is changed and a `NotFound` error is returned.
///
/// # Errors
///
/// - Returns an `Input` error if there are no ids or no changes, if the edits file cannot be
///   read, or if a new amount is not greater than zero once rounded to cents.
/// - Returns a `NotFound` error if any id does not exist.
/// - Returns a `Database` error if the update fails.
pub async fn update_transactions(
    config: Config,
    args: UpdateTransactionsArgs,
) -> Result<Out<Vec<Transaction>>> {
    let edits = match args.edits() {
        Some(path) => read_edits(path).await,
        None => inline_edits(&args),
    }
    .and_then(check_amounts)
    .pub_result(ErrorType::Input)?;
    debug!("Applying {} transaction edits", edits.len());

    let updated = config
        .db()
        .update_transactions(edits)
        .await
        .pub_result(ErrorType::Database)?;
    let message = format!(
        "Updated {}",
        plural(updated.len(), "transaction", "transactions")
    );
    Ok(Out::new(message, updated))
}

/// Sets the weekly budget target of each listed category. Categories that are not listed keep
/// their targets. All assignments are saved together.
pub async fn update_budgets(config: Config, args: UpdateBudgetsArgs) -> Result<Out<BudgetTargets>> {
    let assignments = budget_assignments(&args).pub_result(ErrorType::Input)?;
    let targets = config
        .db()
        .set_budget_targets(&assignments)
        .await
        .pub_result(ErrorType::Database)?;
    let message = format!(
        "Updated {}, weekly total is now {}",
        plural(assignments.len(), "budget target", "budget targets"),
        targets.weekly_total()
    );
    Ok(Out::new(message, targets))
}

fn budget_assignments(args: &UpdateBudgetsArgs) -> Result<Vec<(Category, Amount)>> {
    if args.assignments().is_empty() {
        bail!("No budget targets were given");
    }
    let mut assignments = Vec::with_capacity(args.assignments().len());
    for a in args.assignments() {
        if a.amount.is_negative() {
            bail!("The budget for {} cannot be negative, got {}", a.category, a.amount);
        }
        assignments.push((a.category, a.amount.rounded()));
    }
    Ok(assignments)
}

async fn read_edits(path: &Path) -> Result<Vec<TransactionEdit>> {
    let content = utils::read(path).await?;
    let edits: Vec<TransactionEdit> = serde_json::from_str(&content)
        .with_context(|| format!("Unable to parse edits in {}", path.display()))?;
    if edits.is_empty() {
        bail!("The edits file {} is empty", path.display());
    }
    if let Some(edit) = edits.iter().find(|e| e.updates.is_empty()) {
        bail!("The edit for transaction {} changes nothing", edit.id);
    }
    Ok(edits)
}

fn check_amounts(edits: Vec<TransactionEdit>) -> Result<Vec<TransactionEdit>> {
    for edit in &edits {
        if let Some(amount) = edit.updates.amount {
            if !amount.rounded().is_positive() {
                bail!(
                    "The amount for transaction {} must be greater than zero, got {amount}",
                    edit.id
                );
            }
        }
    }
    Ok(edits)
}

fn inline_edits(args: &UpdateTransactionsArgs) -> Result<Vec<TransactionEdit>> {
    if args.ids().is_empty() {
        bail!("At least one --id is required");
    }
    let updates = args.updates();
    if updates.is_empty() {
        bail!("Nothing to update, pass --description, --amount, --category, --clear-category or --note");
    }
    Ok(args
        .ids()
        .iter()
        .map(|id| TransactionEdit {
            id: *id,
            updates: updates.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::BudgetAssignment;
    use crate::error::{error_type, is_not_found};
    use crate::model::TransactionUpdates;
    use crate::test::TestEnv;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_update_same_change_for_many_ids() {
        let env = TestEnv::new().await;
        let a = env.insert_test_transaction("Coffee", "4.50", "2025-01-15").await;
        let b = env.insert_test_transaction("Bagel", "6.00", "2025-01-15").await;

        let updates = TransactionUpdates {
            category: Some(Category::RestaurantsAndTakeaway),
            ..TransactionUpdates::default()
        };
        let out = update_transactions(env.config(), UpdateTransactionsArgs::new([a, b], updates))
            .await
            .unwrap();
        assert_eq!(out.message(), "Updated 2 transactions");
        for t in out.structure().unwrap() {
            assert_eq!(t.category(), Some(Category::RestaurantsAndTakeaway));
        }
        let stored = env.config().db().get_transaction(b).await.unwrap().unwrap();
        assert_eq!(stored.category(), Some(Category::RestaurantsAndTakeaway));
        assert_eq!(stored.description(), "Bagel");
    }

    #[tokio::test]
    async fn test_update_from_edits_file() {
        let env = TestEnv::new().await;
        let a = env.insert_test_transaction("Coffee", "4.50", "2025-01-15").await;
        let b = env.insert_test_transaction("Bagel", "6.00", "2025-01-15").await;
        let path = env.config().root().join("edits.json");
        let json = format!(
            r#"[{{"id": {a}, "note": "with Sam"}}, {{"id": {b}, "amount": "7.25", "category": "Groceries"}}]"#
        );
        utils::write(&path, json).await.unwrap();

        let out = update_transactions(env.config(), UpdateTransactionsArgs::from_edits_file(&path))
            .await
            .unwrap();
        let updated = out.structure().unwrap();
        assert_eq!(updated[0].note(), "with Sam");
        assert_eq!(updated[1].amount(), Amount::from_str("7.25").unwrap());
        assert_eq!(updated[1].category(), Some(Category::Groceries));
    }

    #[tokio::test]
    async fn test_update_missing_id_changes_nothing() {
        let env = TestEnv::new().await;
        let a = env.insert_test_transaction("Coffee", "4.50", "2025-01-15").await;
        let updates = TransactionUpdates {
            description: Some("Flat white".to_string()),
            ..TransactionUpdates::default()
        };
        let err = update_transactions(
            env.config(),
            UpdateTransactionsArgs::new([a, a + 1], updates),
        )
        .await
        .unwrap_err();
        assert!(is_not_found(&err));
        let stored = env.config().db().get_transaction(a).await.unwrap().unwrap();
        assert_eq!(stored.description(), "Coffee");
    }

    #[tokio::test]
    async fn test_update_without_changes_is_input_error() {
        let env = TestEnv::new().await;
        let a = env.insert_test_transaction("Coffee", "4.50", "2025-01-15").await;
        let err = update_transactions(
            env.config(),
            UpdateTransactionsArgs::new([a], TransactionUpdates::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Input));

        let err = update_transactions(
            env.config(),
            UpdateTransactionsArgs::from_edits_file(env.config().root().join("missing.json")),
        )
        .await
        .unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Input));
    }

    #[tokio::test]
    async fn test_update_rejects_amount_that_rounds_to_zero() {
        let env = TestEnv::new().await;
        let a = env.insert_test_transaction("Coffee", "4.50", "2025-01-15").await;
        for amount in ["0", "0.004", "-3"] {
            let updates = TransactionUpdates {
                amount: Some(Amount::from_str(amount).unwrap()),
                ..TransactionUpdates::default()
            };
            let err = update_transactions(env.config(), UpdateTransactionsArgs::new([a], updates))
                .await
                .unwrap_err();
            assert_eq!(error_type(&err), Some(ErrorType::Input), "{amount}");
        }

        let updates = TransactionUpdates {
            amount: Some(Amount::from_str("5.005").unwrap()),
            ..TransactionUpdates::default()
        };
        let out = update_transactions(env.config(), UpdateTransactionsArgs::new([a], updates))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap()[0].amount(), Amount::from_cents(501));
    }

    #[tokio::test]
    async fn test_update_clears_category() {
        let env = TestEnv::new().await;
        let a = env.insert_test_transaction("Coffee", "4.50", "2025-01-15").await;
        let set = TransactionUpdates {
            category: Some(Category::RestaurantsAndTakeaway),
            ..TransactionUpdates::default()
        };
        update_transactions(env.config(), UpdateTransactionsArgs::new([a], set))
            .await
            .unwrap();

        let clear = TransactionUpdates {
            clear_category: true,
            ..TransactionUpdates::default()
        };
        let out = update_transactions(env.config(), UpdateTransactionsArgs::new([a], clear))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap()[0].category(), None);
        let stored = env.config().db().get_transaction(a).await.unwrap().unwrap();
        assert_eq!(stored.category(), None);
        assert_eq!(stored.description(), "Coffee");
    }

    #[tokio::test]
    async fn test_update_budgets() {
        let env = TestEnv::new().await;
        let args = UpdateBudgetsArgs::new([
            BudgetAssignment::from_str("Groceries=150").unwrap(),
            BudgetAssignment::from_str("Transportation=40.50").unwrap(),
        ]);
        let out = update_budgets(env.config(), args).await.unwrap();
        let targets = out.structure().unwrap();
        assert_eq!(targets.weekly(Category::Groceries), Amount::from_str("150").unwrap());
        assert_eq!(targets.weekly_total(), Amount::from_str("190.50").unwrap());
        assert_eq!(
            env.config().db().budget_targets().await.unwrap(),
            targets.clone()
        );
    }

    #[tokio::test]
    async fn test_update_budgets_rejects_negative() {
        let env = TestEnv::new().await;
        let args = UpdateBudgetsArgs::new([
            BudgetAssignment::from_str("Groceries=150").unwrap(),
            BudgetAssignment::from_str("Shopping=-5").unwrap(),
        ]);
        let err = update_budgets(env.config(), args).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Input));
        let targets = env.config().db().budget_targets().await.unwrap();
        assert_eq!(targets.weekly(Category::Groceries), Amount::ZERO);
    }
}
