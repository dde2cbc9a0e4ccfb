//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business rule failures raised before anything is stored.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Repository-level errors - the failure taxonomy of the post store.
///
/// `ZeroRowsAffected` is distinct from `NotFound`: the write reached a real
/// document but its precondition was false, e.g. setting a vote to the value
/// it already has, or pulling a comment id the post never held.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Entity not found")]
    NotFound,

    #[error("Write affected 0 rows")]
    ZeroRowsAffected,

    #[error("Invalid vote increment: {0}")]
    InvalidIncrement(i8),

    #[error("Duplicate id: {0}")]
    Duplicate(String),

    #[error("Score aggregation failed: {0}")]
    Aggregation(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Database connection failed: {0}")]
    Connection(String),
}
