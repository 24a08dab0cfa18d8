//! Error types for preload operations with programmatic error codes.
//!
//! Error codes follow a pattern: S{category}{number}
//! - 1xxx: Relation specification errors (bad tag grammar, unknown entities)
//! - 5xxx: Query execution errors (collaborator failures)
//! - 6xxx: Data errors (row-to-struct mapping)
//!
//! ```rust
//! use strata_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::invalid_spec("user", "scores", "missing join-key pair");
//! assert_eq!(err.code, ErrorCode::InvalidRelationSpec);
//! assert_eq!(err.code.code(), "S1001");
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for preload operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Relation specification errors (1xxx)
    /// Malformed relation tag grammar (S1001).
    InvalidRelationSpec = 1001,
    /// Entity name not present in the registry (S1002).
    UnknownEntity = 1002,
    /// Relation field not declared on its entity (S1003).
    UnknownRelation = 1003,

    // Query execution errors (5xxx)
    /// Query executor collaborator failed (S5001).
    QueryExecution = 5001,

    // Data errors (6xxx)
    /// Row-to-struct mapping failed (S6001).
    ScanMapping = 6001,

    // Internal errors (9xxx)
    /// Internal error (S9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1001").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidRelationSpec => "Invalid relation specification",
            Self::UnknownEntity => "Unknown entity",
            Self::UnknownRelation => "Unknown relation",
            Self::QueryExecution => "Query execution failed",
            Self::ScanMapping => "Row mapping failed",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The entity involved.
    pub entity: Option<String>,
    /// The relation field involved.
    pub field: Option<String>,
    /// The table a query ran against.
    pub table: Option<String>,
}

impl ErrorContext {
    /// Set the entity name.
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Set the relation field name.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// An error from a preload operation.
#[derive(Debug, Clone, Error)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
}

impl QueryError {
    /// Create a new error with a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Attach context to the error.
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    /// Malformed relation tag on `entity.field`.
    pub fn invalid_spec(
        entity: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCode::InvalidRelationSpec, message).with_context(
            ErrorContext::default().entity(entity).field(field),
        )
    }

    /// Entity name missing from the registry.
    pub fn unknown_entity(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::UnknownEntity,
            format!("entity '{name}' is not registered"),
        )
        .with_context(ErrorContext::default().entity(name))
    }

    /// Relation field missing from its entity descriptor.
    pub fn unknown_relation(entity: impl Into<String>, field: impl Into<String>) -> Self {
        let entity = entity.into();
        let field = field.into();
        Self::new(
            ErrorCode::UnknownRelation,
            format!("entity '{entity}' declares no relation '{field}'"),
        )
        .with_context(ErrorContext::default().entity(entity).field(field))
    }

    /// Query executor collaborator failure against `table`.
    pub fn query_execution(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::QueryExecution, message)
            .with_context(ErrorContext::default().table(table))
    }

    /// Row-to-struct mapping failure.
    pub fn scan_mapping(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ScanMapping, message)
    }

    /// Internal invariant violation.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(entity) = &self.context.entity {
            write!(f, " (entity: {entity}")?;
            if let Some(field) = &self.context.field {
                write!(f, ", field: {field}")?;
            }
            write!(f, ")")?;
        } else if let Some(table) = &self.context.table {
            write!(f, " (table: {table})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_strings() {
        assert_eq!(ErrorCode::InvalidRelationSpec.code(), "S1001");
        assert_eq!(ErrorCode::QueryExecution.code(), "S5001");
        assert_eq!(ErrorCode::ScanMapping.code(), "S6001");
    }

    #[test]
    fn test_invalid_spec_carries_context() {
        let err = QueryError::invalid_spec("user", "scores", "missing join-key pair");
        assert_eq!(err.code, ErrorCode::InvalidRelationSpec);
        assert_eq!(err.context.entity.as_deref(), Some("user"));
        assert_eq!(err.context.field.as_deref(), Some("scores"));
        let display = err.to_string();
        assert!(display.contains("S1001"));
        assert!(display.contains("user"));
    }

    #[test]
    fn test_query_execution_carries_table() {
        let err = QueryError::query_execution("user_scores", "connection refused");
        assert_eq!(err.code, ErrorCode::QueryExecution);
        assert_eq!(err.context.table.as_deref(), Some("user_scores"));
        assert!(err.to_string().contains("user_scores"));
    }

    #[test]
    fn test_unknown_entity_message() {
        let err = QueryError::unknown_entity("ghost");
        assert_eq!(err.code, ErrorCode::UnknownEntity);
        assert!(err.message.contains("ghost"));
    }
}
