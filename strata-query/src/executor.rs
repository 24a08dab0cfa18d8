//! The query-execution collaborator boundary.
//!
//! The preload engine never builds SQL or talks to a driver itself. Every
//! fetch goes through [`QueryExecutor::select`] with a [`SelectRequest`]
//! describing the table, an optional `key IN (…)` restriction, raw
//! where/order clauses, and soft-delete visibility. Dialect handling,
//! placeholder styles, connection pooling, result caching, and sharding all
//! live behind this trait.

use std::future::Future;
use std::pin::Pin;

use crate::error::QueryResult;
use crate::value::{Record, Value};

/// A boxed future for async executor operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single SELECT handed to the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectRequest {
    /// Table to select from.
    pub table: String,
    /// Column restricted by `key_values` (`key IN (…)`), if any.
    pub key_column: Option<String>,
    /// Values for the key restriction. Empty with `key_column` set matches
    /// nothing; the engine never issues such a request.
    pub key_values: Vec<Value>,
    /// Raw predicate appended with AND, if any.
    pub where_clause: Option<String>,
    /// Raw ORDER BY clause, if any.
    pub order_clause: Option<String>,
    /// When false, the executor applies its default soft-delete filter;
    /// when true, soft-deleted rows are visible.
    pub include_soft_deleted: bool,
}

impl SelectRequest {
    /// Create a request with no key restriction (a root query).
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key_column: None,
            key_values: Vec::new(),
            where_clause: None,
            order_clause: None,
            include_soft_deleted: false,
        }
    }

    /// Restrict to rows whose `column` is in `values`.
    pub fn key_in(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.key_column = Some(column.into());
        self.key_values = values;
        self
    }

    /// Append a raw predicate.
    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Set the raw ORDER BY clause.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_clause = Some(clause.into());
        self
    }

    /// Make soft-deleted rows visible.
    pub fn unscoped(mut self, include: bool) -> Self {
        self.include_soft_deleted = include;
        self
    }
}

/// Executes SELECT queries on behalf of the preload engine.
///
/// Implementations decide how the request maps to their dialect and driver.
/// The engine issues requests strictly sequentially and aborts the whole
/// load on the first error; retries and timeouts, if any, belong here.
pub trait QueryExecutor: Send + Sync {
    /// Execute a SELECT and return the matching rows.
    fn select<'a>(&'a self, request: &'a SelectRequest) -> BoxFuture<'a, QueryResult<Vec<Record>>>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for std::sync::Arc<E> {
    fn select<'a>(&'a self, request: &'a SelectRequest) -> BoxFuture<'a, QueryResult<Vec<Record>>> {
        (**self).select(request)
    }
}
