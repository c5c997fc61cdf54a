//! The module contains the error the engine can throw.
//!
//! The errors are grouped by who has to act on them:
//!
//! - [`Validation`] and [`ExistingKey`]: the caller sent bad input, never retried.
//! - [`KeyNotFound`]: a wallet, category or transaction is absent.
//! - [`Conflict`] and [`Unavailable`]: transient store trouble, retried by the
//!   engine for idempotent units of work.
//! - [`Consistency`]: a wallet aggregate disagrees with its own identity; the
//!   engine logs it and repairs the wallet with a recompute.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Conflict`]: EngineError::Conflict
//!  [`Unavailable`]: EngineError::Unavailable
//!  [`Consistency`]: EngineError::Consistency
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Wallet {0} is inconsistent: {1}")]
    Consistency(Uuid, String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Returns `true` for errors caused by store contention or a transient
    /// outage. Only these are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Unavailable(_))
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(inner) => Self::Unavailable(inner.to_string()),
            DbErr::RecordNotUpdated => Self::KeyNotFound("record not exists".to_string()),
            other => {
                let message = other.to_string().to_lowercase();
                if message.contains("database is locked")
                    || message.contains("database table is locked")
                    || message.contains("database is busy")
                {
                    Self::Conflict(other.to_string())
                } else {
                    Self::Database(other)
                }
            }
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Unavailable(a), Self::Unavailable(b)) => a == b,
            (Self::Consistency(a, x), Self::Consistency(b, y)) => a == b && x == y,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
