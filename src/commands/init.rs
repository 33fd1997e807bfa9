use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its secrets directory and:
/// - Creates an initial `config.json` with `api_url` and `utc_offset_minutes`
/// - Copies `token_file` into `.secrets/token`
/// - Creates the SQLite database with a zero budget for every category
///
/// # Arguments
/// - `pennypal_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/pennypal`
/// - `token_file` - A file holding the Up Bank personal access token. It can be omitted when the
///   program will only be run in test mode, or added later at `.secrets/token`.
/// - `api_url` - Overrides the default Up Bank API URL.
/// - `utc_offset_minutes` - The local offset used to bucket transactions into weeks and months.
///
/// # Errors
/// - Returns an error if the directory is already initialized or any file operation fails.
pub async fn init(
    pennypal_home: &Path,
    token_file: Option<&Path>,
    api_url: Option<&str>,
    utc_offset_minutes: i32,
) -> Result<Out<()>> {
    let config = Config::create(pennypal_home, token_file, api_url, utc_offset_minutes)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the pennypal directory at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_twice() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let out = init(&home, None, None, 600).await.unwrap();
        assert!(out.message().contains("Successfully created"));

        let err = init(&home, None, None, 600).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Config));
    }
}
