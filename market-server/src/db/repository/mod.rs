//! Repository Module
//!
//! Free-function CRUD over the SQLite tables. Functions that take a
//! `&mut Transaction` participate in the caller's transaction; functions
//! that take a `&SqlitePool` are standalone reads/writes.

// Buyer profile
pub mod user;

// Inventory
pub mod product;
pub mod reservation;

// Orders
pub mod order;
pub mod payment;

// Promotions
pub mod coupon;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Shorthand for a SQLite transaction handle.
pub type Tx<'a> = sqlx::Transaction<'a, sqlx::Sqlite>;
