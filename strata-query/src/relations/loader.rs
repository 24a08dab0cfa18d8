//! Fetching child rows for one relation over a set of parent rows.
//!
//! The loader collects the distinct local-key values across the parents,
//! decides between grouped `key IN (…)` queries and per-key queries based
//! on the effective batch configuration, and optionally pages the parent
//! row set first when a chunk plan is resolved. All queries go through the
//! executor collaborator, strictly sequentially; the first error aborts.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::config::{ChunkPlan, EffectiveBatch};
use super::graph::RelationNode;
use crate::error::QueryResult;
use crate::executor::{QueryExecutor, SelectRequest};
use crate::value::{Record, Value};

/// Fetch all child rows of `node` for `parents`.
///
/// An empty parent set (or a parent set with only null keys) yields an
/// empty result without touching the executor.
pub(crate) async fn fetch_children<E>(
    executor: &E,
    node: &RelationNode,
    parents: &[Record],
    effective: EffectiveBatch,
    chunk: Option<ChunkPlan>,
) -> QueryResult<Vec<Record>>
where
    E: QueryExecutor + ?Sized,
{
    if parents.is_empty() {
        return Ok(Vec::new());
    }

    // Keys stay distinct across pages so the concatenated chunk results
    // equal the unchunked result even when parents share a key.
    let mut seen = HashSet::new();

    match chunk {
        Some(plan) if plan.engages(parents.len()) => {
            let pages = parents.len().div_ceil(plan.chunk_size);
            debug!(
                field = %node.field,
                parents = parents.len(),
                chunk_size = plan.chunk_size,
                pages,
                "chunking parent rows"
            );
            let mut rows = Vec::new();
            for (index, page) in parents.chunks(plan.chunk_size).enumerate() {
                trace!(field = %node.field, page = index, rows = page.len(), "chunk page");
                rows.extend(fetch_page(executor, node, page, effective, &mut seen).await?);
            }
            Ok(rows)
        }
        _ => fetch_page(executor, node, parents, effective, &mut seen).await,
    }
}

/// Fetch child rows for one page of parents.
async fn fetch_page<E>(
    executor: &E,
    node: &RelationNode,
    parents: &[Record],
    effective: EffectiveBatch,
    seen: &mut HashSet<String>,
) -> QueryResult<Vec<Record>>
where
    E: QueryExecutor + ?Sized,
{
    let keys = distinct_keys(parents, &node.spec.parent_key, seen);
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    if effective.engages(keys.len()) {
        debug!(
            field = %node.field,
            table = %node.child_table,
            distinct = keys.len(),
            batch_size = effective.batch_size,
            "batching relation load"
        );
        let values: Vec<Value> = keys.into_values().collect();
        for group in values.chunks(effective.batch_size) {
            let request = request_for(node, group.to_vec());
            rows.extend(executor.select(&request).await?);
        }
    } else {
        debug!(
            field = %node.field,
            table = %node.child_table,
            distinct = keys.len(),
            threshold = effective.threshold,
            "loading relation per key"
        );
        for (_, value) in keys {
            let request = request_for(node, vec![value]);
            rows.extend(executor.select(&request).await?);
        }
    }

    Ok(rows)
}

/// Distinct parent-key values in first-occurrence order, keyed by their
/// normalized representation. Null and absent keys are skipped (they can
/// never match a child row), as are keys already fetched by an earlier
/// chunk page.
fn distinct_keys(
    parents: &[Record],
    parent_key: &str,
    seen: &mut HashSet<String>,
) -> IndexMap<String, Value> {
    let mut keys = IndexMap::new();
    for parent in parents {
        let Some(value) = parent.get(parent_key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let repr = value.key_repr();
        if !seen.insert(repr.clone()) {
            continue;
        }
        keys.entry(repr).or_insert_with(|| value.clone());
    }
    keys
}

fn request_for(node: &RelationNode, key_values: Vec<Value>) -> SelectRequest {
    let mut request = SelectRequest::table(node.child_table.clone())
        .key_in(node.spec.child_key.clone(), key_values)
        .unscoped(node.spec.include_soft_deleted);
    if let Some(where_clause) = &node.spec.where_clause {
        request = request.filter(where_clause.clone());
    }
    if let Some(order_clause) = &node.spec.order_clause {
        request = request.order_by(order_clause.clone());
    }
    request
}
