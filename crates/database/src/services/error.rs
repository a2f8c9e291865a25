use models::validation::ValidationErrors;
use sea_orm::{DbErr, SqlErr};

/// Errors raised by the service layer.
///
/// Everything except [`ServiceError::Database`] carries a message meant for the user.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The referenced record does not exist (or is not visible to the actor)
    #[error("{0}")]
    NotFound(String),

    /// The actor lacks rights over the referenced record
    #[error("{0}")]
    PermissionDenied(String),

    /// One or more form fields failed validation
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// A uniqueness rule would be broken
    #[error("{message}")]
    Duplicate {
        field: &'static str,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn duplicate(field: &'static str, message: impl Into<String>) -> Self {
        Self::Duplicate {
            field,
            message: message.into(),
        }
    }

    /// Converts a unique index violation into [`ServiceError::Duplicate`]
    pub(crate) fn from_insert(err: DbErr, field: &'static str, message: impl Into<String>) -> Self {
        if is_unique_violation(&err) {
            Self::duplicate(field, message)
        } else {
            Self::Database(err)
        }
    }

    /// User-facing messages, one per problem
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(errors) => errors.messages().map(str::to_string).collect(),
            Self::Database(_) => vec!["Something went wrong. Please try again.".to_string()],
            other => vec![other.to_string()],
        }
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    unique_violation(err).is_some()
}

/// Driver detail of a unique violation: Postgres names the index, SQLite the column
pub(crate) fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => Some(detail),
        _ => None,
    }
}
