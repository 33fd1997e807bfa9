//! PennyPal downloads spending from the Up Bank API into a local SQLite database, buckets it into
//! weeks or calendar months, and compares it with a weekly budget for each category.
//!
//! The `commands` module holds one handler per CLI subcommand. Each takes a loaded `Config` and
//! its parsed arguments, so the whole program can be driven without the CLI.

mod api;
pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
mod ingest;
pub mod model;
pub mod period;
pub mod report;
mod utils;


pub use api::{Mode, TEST_MODE_ENV};
pub use config::Config;
pub use db::SortBy;
pub use error::{error_type, is_not_found, Error, ErrorType, Result};
