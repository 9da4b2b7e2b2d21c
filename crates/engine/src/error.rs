//! The module contains the error the engine can throw.
//!
//! The errors a reservation can end with are:
//!
//! - [`Validation`] thrown when the input is malformed (e.g. a headcount of 0).
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`CapacityExceeded`] thrown when a booking would overshoot an expedition.
//! - [`Conflict`] thrown when the store kept rejecting the transaction.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`CapacityExceeded`]: EngineError::CapacityExceeded
//!  [`Conflict`]: EngineError::Conflict
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid data: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),
    #[error("Not bookable: {0}")]
    NotBookable(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl EngineError {
    /// Stable machine-readable code, used by the HTTP layer.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::KeyNotFound(_) => "NOT_FOUND",
            Self::ExistingKey(_) => "ALREADY_EXISTS",
            Self::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            Self::NotBookable(_) => "NOT_BOOKABLE",
            Self::Conflict(_) => "CONFLICT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Database(_) | Self::PasswordHash(_) => "INTERNAL",
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::CapacityExceeded(a), Self::CapacityExceeded(b)) => a == b,
            (Self::NotBookable(a), Self::NotBookable(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            _ => false,
        }
    }
}

/// Returns `true` when the database refused the transaction because of a
/// concurrent writer, so the whole attempt can be replayed.
///
/// Covers SQLite (`SQLITE_BUSY` / `database is locked`) and PostgreSQL
/// (`40001 could not serialize access`, `40P01 deadlock detected`).
pub(crate) fn is_serialization_conflict(err: &DbErr) -> bool {
    let message = err.to_string().to_ascii_lowercase();
    [
        "database is locked",
        "database table is locked",
        "sqlite_busy",
        "could not serialize access",
        "40001",
        "deadlock detected",
        "40p01",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}
