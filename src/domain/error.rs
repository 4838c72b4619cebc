//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent input-shape and lookup violations.
///
/// Dirty record data (duplicates, orphans, cycles) is never an error here:
/// the validator reports it and the builder falls back deterministically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no employee records provided: expected an array of rows")]
    NotAnArray,

    #[error("dataset contains no employee records with an id")]
    EmptyDataset,

    #[error("employee not found in hierarchy: {0}")]
    UnknownEmployee(String),

    #[error("hierarchy is {depth} levels deep, views are limited to {limit}")]
    TooDeep { depth: usize, limit: usize },
}
