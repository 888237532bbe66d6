//! State database error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StateError {
    #[error("database error: {message}")]
    DatabaseError { message: String },

    #[error("unique constraint violated on {table}: {message}")]
    UniqueViolation { table: String, message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("nested set corrupted in {table}: {message}")]
    NestedSetCorrupted { table: String, message: String },

    #[error("transaction failed: {message}")]
    TransactionFailed { message: String },

    #[error("migration failed: {message}")]
    MigrationFailed { message: String },
}

impl StateError {
    /// Map an insert failure, recognising unique-key conflicts on `table`
    #[must_use]
    pub fn from_insert(table: &str, err: &sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = err {
            if db.is_unique_violation() {
                return Self::UniqueViolation {
                    table: table.to_string(),
                    message: db.message().to_string(),
                };
            }
        }
        Self::DatabaseError {
            message: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for StateError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError {
            message: err.to_string(),
        }
    }
}

impl UserFacingError for StateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MigrationFailed { .. } => {
                Some("The state database may be from a newer extman; back it up and retry.")
            }
            Self::NestedSetCorrupted { .. } => {
                Some("Rebuild the menu and asset trees before retrying.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DatabaseError { .. } => "state.database_error",
            Self::UniqueViolation { .. } => "state.unique_violation",
            Self::NotFound { .. } => "state.not_found",
            Self::NestedSetCorrupted { .. } => "state.nested_set_corrupted",
            Self::TransactionFailed { .. } => "state.transaction_failed",
            Self::MigrationFailed { .. } => "state.migration_failed",
        };
        Some(code)
    }
}
