//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`MissingData`] thrown when a submission lacks a required field.
//! - [`InvalidReference`] thrown when a patch id does not resolve to a patch
//!   of the expected kind.
//! - [`KeyNotFound`] thrown when a member or other item is not found.
//!
//! Running out of unseen patches is not an error: it is reported as an
//! exhausted [`PairSelection`].
//!
//!  [`MissingData`]: EngineError::MissingData
//!  [`InvalidReference`]: EngineError::InvalidReference
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`PairSelection`]: crate::PairSelection
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Missing data")]
    MissingData,
    #[error("Invalid patch IDs: {0}")]
    InvalidReference(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid patch filename: {0}")]
    InvalidFilename(String),
    #[error("Password hash error: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MissingData, Self::MissingData) => true,
            (Self::InvalidReference(a), Self::InvalidReference(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidFilename(a), Self::InvalidFilename(b)) => a == b,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<argon2::password_hash::Error> for EngineError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(value.to_string())
    }
}
