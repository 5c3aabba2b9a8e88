//! Definitions for error types used throughout core.

use crate::{
    DbError,
    utils::validation::{FieldError, ValidationErrors},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// database error
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// Generic validation error of one field of an entity
    #[error("field validation error: {0}")]
    Field(#[from] FieldError),

    /// Generic collected validation errors holding stringified field names.
    /// This works for ANY entity (Player, Tournament, PendingTournament, etc.)
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Unknown id or key
    #[error("{0} not found")]
    NotFound(String),

    /// Missing or insufficient session
    #[error("permission denied")]
    Unauthorized,

    /// Concurrent mutation detected (e.g. merge raced a finalize)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Scraper failure; the scraper-provided message is preserved verbatim
    #[error("{0}")]
    Upstream(String),

    /// Parsing error for enums of core
    #[error("parsing error: {0}")]
    Parsing(String),

    /// Unexpected error; the offending operation is not retried
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        CoreError::NotFound(entity.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        CoreError::Conflict(reason.into())
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, CoreError::Db(DbError::UniqueViolation(_)))
    }

    pub fn get_field_error(&self) -> Option<&FieldError> {
        if let CoreError::Field(field_error) = self {
            Some(field_error)
        } else {
            None
        }
    }
}
