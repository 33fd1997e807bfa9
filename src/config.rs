//! Configuration file handling for PennyPal.
//!
//! The configuration file is stored at `$PENNYPAL_HOME/config.json` and holds the bank API
//! location, the page size used when downloading, the local UTC offset used to bucket
//! transactions into weeks and months, and optionally where the API token is kept.

use crate::db::Db;
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "pennypal";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const TOKEN: &str = "token";
const CONFIG_JSON: &str = "config.json";
const PENNYPAL_SQLITE: &str = "pennypal.sqlite";
pub(crate) const DEFAULT_API_URL: &str = "https://api.up.com.au/api/v1";
const DEFAULT_PAGE_SIZE: u32 = 100;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$PENNYPAL_HOME` and from there it loads `$PENNYPAL_HOME/config.json` and opens
/// the database. It is passed to every command handler.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the data directory and its secrets directory, then:
    /// - writes an initial `config.json`
    /// - copies `token_file`, if given, to `.secrets/token`
    /// - creates and seeds the SQLite database
    ///
    /// # Errors
    /// - Returns an error if a database already exists in `dir` or any file operation fails.
    pub async fn create(
        dir: impl Into<PathBuf>,
        token_file: Option<&Path>,
        api_url: Option<&str>,
        utc_offset_minutes: i32,
    ) -> Result<Self> {
        // Fail before touching the filesystem
        utils::offset_from_minutes(utc_offset_minutes)?;
        let api_url = api_url.unwrap_or(DEFAULT_API_URL);
        url::Url::parse(api_url).with_context(|| format!("Invalid API URL '{api_url}'"))?;

        let maybe_relative = dir.into();
        if maybe_relative.join(PENNYPAL_SQLITE).exists() {
            bail!(
                "PennyPal is already initialized in {}",
                maybe_relative.display()
            );
        }
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the pennypal home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        if let Some(token_file) = token_file {
            utils::copy(token_file, secrets.join(TOKEN)).await?;
        }

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            utc_offset_minutes,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(PENNYPAL_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that `pennypal_home` exists and that the config file exists
    /// - load and validate the config file
    /// - open the database, migrating it if needed
    pub async fn load(pennypal_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = pennypal_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("PennyPal home is missing, run 'pennypal init' first")?;
        let _ = utils::read_dir(&root)
            .await
            .context("PennyPal home is not a directory")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = root.join(PENNYPAL_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn api_url(&self) -> &str {
        &self.config_file.api_url
    }

    pub fn page_size(&self) -> u32 {
        self.config_file.page_size
    }

    pub fn utc_offset_minutes(&self) -> i32 {
        self.config_file.utc_offset_minutes
    }

    /// The local offset used for period bucketing.
    pub fn offset(&self) -> Result<FixedOffset> {
        utils::offset_from_minutes(self.config_file.utc_offset_minutes)
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "pennypal",
///   "config_version": 1,
///   "api_url": "https://api.up.com.au/api/v1",
///   "page_size": 100,
///   "utc_offset_minutes": 600,
///   "token_path": ".secrets/token"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "pennypal"
    app_name: String,

    config_version: u8,

    /// Base URL of the Up Bank API
    #[serde(default = "default_api_url")]
    api_url: String,

    /// Transactions requested per page
    #[serde(default = "default_page_size")]
    page_size: u32,

    /// Minutes east of UTC, e.g. 600 for AEST
    #[serde(default)]
    utc_offset_minutes: i32,

    /// Path to the API token file (optional, relative to the home directory or absolute).
    /// Defaults to $PENNYPAL_HOME/.secrets/token if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: default_api_url(),
            page_size: DEFAULT_PAGE_SIZE,
            utc_offset_minutes: 0,
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads and validates the config file at `path`.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "The config file version {} is newer than this program understands",
            config.config_version
        );
        anyhow::ensure!(
            (1..=100).contains(&config.page_size),
            "page_size must be between 1 and 100, got {}",
            config.page_size
        );
        utils::offset_from_minutes(config.utc_offset_minutes)
            .context("Invalid utc_offset_minutes in config file")?;
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// If None, defaults to `.secrets/token`.
    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN))
    }
}
