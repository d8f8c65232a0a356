use common::AmountOverflow;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back onto the model.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// An order total does not fit in the money representation.
    #[error("Order total out of range: {0}")]
    AmountOverflow(#[from] AmountOverflow),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
