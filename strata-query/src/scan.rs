//! Mapping assembled records into caller-owned structs.
//!
//! Preloaded records form an owned tree of [`Record`]s; scanning converts
//! that tree into the caller's types through serde. Scalar relations land in
//! `Option<T>` fields, collections in `Vec<T>` fields. A relation that was
//! never requested and a relation with no matching rows both scan to the
//! field's zero value (`None` / empty vec).

use serde::de::DeserializeOwned;

use crate::error::{QueryError, QueryResult};
use crate::value::Record;

/// Map a slice of assembled records into a vec of typed values.
pub fn scan_records<T: DeserializeOwned>(records: Vec<Record>) -> QueryResult<Vec<T>> {
    records.into_iter().map(scan_record).collect()
}

/// Map one assembled record into a typed value.
pub fn scan_record<T: DeserializeOwned>(record: Record) -> QueryResult<T> {
    let json = serde_json::to_value(&record)
        .map_err(|e| QueryError::scan_mapping(format!("record not representable: {e}")))?;
    serde_json::from_value(json).map_err(|e| QueryError::scan_mapping(e.to_string()))
}
