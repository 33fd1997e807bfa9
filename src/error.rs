//! Error types shared by the library and the binary.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// A coarse classification attached to errors that leave a command handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory, config file or secrets are missing or invalid.
    Config,
    /// A SQLite operation failed.
    Database,
    /// The bank API could not be reached or returned something unreadable.
    Request,
    /// A row addressed by id or name does not exist.
    NotFound,
    /// The user supplied a value that cannot be used.
    Input,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// An error tagged with an `ErrorType`. The display output is the full `anyhow` chain so that
/// callers printing it see the underlying cause.
pub struct PubError {
    error_type: ErrorType,
    source: Error,
}

impl PubError {
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for PubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.source)
    }
}

impl Display for PubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.source)
    }
}

impl std::error::Error for PubError {}

/// Tags an error with its `ErrorType` as it crosses the command boundary. An error that has
/// already been tagged keeps its original type.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Result<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            if e.downcast_ref::<PubError>().is_some() {
                e
            } else {
                Error::new(PubError {
                    error_type,
                    source: e,
                })
            }
        })
    }
}

/// Returns the `ErrorType` of `e` if it was tagged with `pub_result`.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.downcast_ref::<PubError>().map(PubError::error_type)
}

/// Returns true when `e` signals that a row addressed by id or name does not exist.
pub fn is_not_found(e: &Error) -> bool {
    error_type(e) == Some(ErrorType::NotFound)
}

/// Creates an error already tagged as `ErrorType::NotFound`.
pub(crate) fn not_found(message: impl Into<String>) -> Error {
    Error::new(PubError {
        error_type: ErrorType::NotFound,
        source: anyhow::anyhow!(message.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_keeps_message_chain() {
        let result: Result<()> = Err(anyhow::anyhow!("disk full")).context("Unable to save");
        let err = result.pub_result(ErrorType::Database).unwrap_err();
        assert_eq!(err.to_string(), "Unable to save: disk full");
        assert_eq!(error_type(&err), Some(ErrorType::Database));
    }

    #[test]
    fn test_pub_result_does_not_retag() {
        let result: Result<()> = Err(not_found("Transaction not found: 7"));
        let err = result.pub_result(ErrorType::Database).unwrap_err();
        assert!(is_not_found(&err));
        assert!(err.to_string().contains("Transaction not found: 7"));
    }

    #[test]
    fn test_untagged_error_has_no_type() {
        let err = anyhow::anyhow!("plain");
        assert_eq!(error_type(&err), None);
        assert!(!is_not_found(&err));
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::NotFound.to_string(), "not_found");
        assert_eq!("database".parse::<ErrorType>().unwrap(), ErrorType::Database);
    }
}
