use crate::api::{self, Mode};
use crate::commands::{plural, IngestSummary, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{ingest, Config, Result};
use tracing::debug;

/// Downloads transactions newer than the newest stored one and stores the expenses among them.
///
/// Credits and transfers between accounts are skipped. Transactions that are already stored are
/// never inserted twice, so running this repeatedly is safe.
///
/// # Errors
/// - Returns an error if the token cannot be read, the bank cannot be reached or its response
///   cannot be parsed, or the database write fails. Nothing is stored in that case.
pub async fn sync(config: Config, mode: Mode) -> Result<Out<IngestSummary>> {
    let mut bank = api::bank(&config, mode)
        .await
        .pub_result(ErrorType::Config)?;
    let summary = ingest::ingest(config.db(), bank.as_mut())
        .await
        .pub_result(ErrorType::Request)?;
    let stored = config
        .db()
        .count_transactions()
        .await
        .pub_result(ErrorType::Database)?;
    debug!("The database now holds {stored} transactions");
    let message = format!(
        "Fetched {}, stored {} new, skipped {} credits and transfers",
        plural(summary.fetched, "transaction", "transactions"),
        summary.inserted,
        summary.skipped
    );
    Ok(Out::new(message, summary))
}
