//! Shared test support: an in-memory query executor.
//!
//! `MemoryExecutor` stores rows per table and answers `SelectRequest`s the
//! way a driver-backed executor would: it applies the key restriction, a
//! small predicate language (`col op value`, `like`, joined with `and`),
//! multi-column ordering, and a `deleted_at` soft-delete column that is
//! filtered out unless the request is unscoped. Every request is recorded
//! so scenarios can assert query counts.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::HashMap;

use parking_lot::Mutex;
use strata_query::{BoxFuture, QueryError, QueryExecutor, QueryResult, Record, SelectRequest, Value};

/// Column marking a row as soft-deleted when non-null.
pub const SOFT_DELETE_COLUMN: &str = "deleted_at";

#[derive(Default)]
pub struct MemoryExecutor {
    tables: HashMap<String, Vec<Record>>,
    requests: Mutex<Vec<SelectRequest>>,
    fail_on_table: Option<String>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows into a table, appending to existing rows.
    pub fn insert(&mut self, table: &str, rows: impl IntoIterator<Item = Record>) {
        self.tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Make every query against `table` fail.
    pub fn fail_on(&mut self, table: &str) {
        self.fail_on_table = Some(table.to_string());
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests_for(&self, table: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.table == table).count()
    }

    pub fn reset_requests(&self) {
        self.requests.lock().clear();
    }
}

impl QueryExecutor for MemoryExecutor {
    fn select<'a>(&'a self, request: &'a SelectRequest) -> BoxFuture<'a, QueryResult<Vec<Record>>> {
        Box::pin(async move {
            self.requests.lock().push(request.clone());
            if self.fail_on_table.as_deref() == Some(request.table.as_str()) {
                return Err(QueryError::query_execution(
                    request.table.clone(),
                    "injected failure",
                ));
            }

            let rows = self.tables.get(&request.table).cloned().unwrap_or_default();
            let mut rows: Vec<Record> = rows
                .into_iter()
                .filter(|row| {
                    if !request.include_soft_deleted {
                        if let Some(value) = row.get(SOFT_DELETE_COLUMN) {
                            if !value.is_null() {
                                return false;
                            }
                        }
                    }
                    if let Some(column) = &request.key_column {
                        let matches = row
                            .get(column)
                            .map(|v| {
                                request
                                    .key_values
                                    .iter()
                                    .any(|k| k.key_repr() == v.key_repr())
                            })
                            .unwrap_or(false);
                        if !matches {
                            return false;
                        }
                    }
                    if let Some(clause) = &request.where_clause {
                        if !eval_where(row, clause) {
                            return false;
                        }
                    }
                    true
                })
                .collect();

            if let Some(order) = &request.order_clause {
                sort_rows(&mut rows, order);
            }

            Ok(rows)
        })
    }
}

/// Evaluate a predicate of `and`-joined `column op value` conditions.
fn eval_where(row: &Record, clause: &str) -> bool {
    clause
        .split(" and ")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .all(|condition| eval_condition(row, condition))
}

fn eval_condition(row: &Record, condition: &str) -> bool {
    for op in ["<=", ">=", "!=", "<", ">", "="] {
        if let Some(position) = condition.find(op) {
            let column = condition[..position].trim();
            let literal = parse_literal(condition[position + op.len()..].trim());
            let Some(value) = row.get(column) else {
                return false;
            };
            let Some(ordering) = compare(value, &literal) else {
                return false;
            };
            return match op {
                "<=" => ordering != Ordering::Greater,
                ">=" => ordering != Ordering::Less,
                "!=" => ordering != Ordering::Equal,
                "<" => ordering == Ordering::Less,
                ">" => ordering == Ordering::Greater,
                _ => ordering == Ordering::Equal,
            };
        }
    }

    if let Some((column, pattern)) = condition.split_once(" like ") {
        let Some(Value::String(s)) = row.get(column.trim()) else {
            return false;
        };
        let pattern = pattern.trim().trim_matches('\'');
        return match (pattern.starts_with('%'), pattern.ends_with('%')) {
            (true, true) => s.contains(pattern.trim_matches('%')),
            (true, false) => s.ends_with(pattern.trim_start_matches('%')),
            (false, true) => s.starts_with(pattern.trim_end_matches('%')),
            (false, false) => s == pattern,
        };
    }

    panic!("unsupported test predicate: {condition}");
}

fn parse_literal(raw: &str) -> Value {
    let raw = raw.trim();
    if let Some(stripped) = raw.strip_prefix('\'') {
        return Value::String(stripped.trim_end_matches('\'').to_string());
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    Value::String(raw.to_string())
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        _ => Some(a.key_repr().cmp(&b.key_repr())),
    }
}

/// Sort rows by a comma-separated `col [asc|desc]` clause.
fn sort_rows(rows: &mut [Record], order: &str) {
    let keys: Vec<(String, bool)> = order
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|part| {
            let mut words = part.split_whitespace();
            let column = words.next().unwrap_or_default().to_string();
            let descending = words
                .next()
                .map(|d| d.eq_ignore_ascii_case("desc"))
                .unwrap_or(false);
            (column, descending)
        })
        .collect();

    rows.sort_by(|a, b| {
        for (column, descending) in &keys {
            let left = a.get(column).unwrap_or(&Value::Null);
            let right = b.get(column).unwrap_or(&Value::Null);
            let ordering = compare(left, right).unwrap_or(Ordering::Equal);
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
