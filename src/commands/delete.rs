//! Delete command handlers.

use crate::args::DeleteTransactionsArgs;
use crate::commands::{plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};

/// Deletes one or more transactions by id atomically.
///
/// This operation is all-or-nothing: either all specified transactions are deleted, or none are.
/// If any id is not found, the entire operation is rolled back and a `NotFound` error is
/// returned.
pub async fn delete_transactions(
    config: Config,
    args: DeleteTransactionsArgs,
) -> Result<Out<Vec<i64>>> {
    let deleted = config
        .db()
        .delete_transactions(args.ids())
        .await
        .pub_result(ErrorType::Database)?;
    let message = format!(
        "Deleted {}",
        plural(deleted.len(), "transaction", "transactions")
    );
    Ok(Out::new(message, deleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_not_found;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_delete_transactions() {
        let env = TestEnv::new().await;
        let a = env.insert_test_transaction("Coffee", "4.50", "2025-01-15").await;
        let b = env.insert_test_transaction("Bagel", "6.00", "2025-01-15").await;

        let out = delete_transactions(env.config(), DeleteTransactionsArgs::new([a, b]))
            .await
            .unwrap();
        assert_eq!(out.message(), "Deleted 2 transactions");
        assert_eq!(out.structure().unwrap(), &vec![a, b]);
        assert_eq!(env.config().db().count_transactions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let env = TestEnv::new().await;
        let a = env.insert_test_transaction("Coffee", "4.50", "2025-01-15").await;

        let err = delete_transactions(env.config(), DeleteTransactionsArgs::new([a, a + 100]))
            .await
            .unwrap_err();
        assert!(is_not_found(&err));
        assert!(err.to_string().contains("Transaction not found"));
        assert_eq!(env.config().db().count_transactions().await.unwrap(), 1);
    }
}
