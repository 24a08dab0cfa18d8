//! The preload entry points.
//!
//! A [`Preloader`] pairs a relation registry with a query executor. Each
//! load starts from a root entity, runs the root query, then resolves the
//! selected relations layer by layer: all relations of one parent set are
//! fetched before any deeper layer starts, sequentially, and assembly
//! happens bottom-up so the result is an owned record tree.
//!
//! ```rust,ignore
//! let users: Vec<User> = preloader
//!     .fetch("user")
//!     .filter("id <= 50")
//!     .with_all()
//!     .with_batch()
//!     .batch_option(LayerBatchOption { layer: 1, enabled: true, batch_threshold: 0, batch_size: 10 })
//!     .scan()
//!     .await?;
//! ```
//!
//! Three loading modes produce structurally identical graphs and differ
//! only in query count: the default per-key mode, grouped batching
//! (`with_batch`), and chunked preloading (`preload` + `preload_option`).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::assemble::{attach_children, group_rows};
use super::config::{
    ChunkOption, DEFAULT_MAX_DEPTH, LayerBatchOption, resolve_batch, resolve_chunk,
};
use super::graph::{RelationGraph, RelationNode, Selection};
use super::loader::fetch_children;
use super::registry::RelationRegistry;
use crate::error::QueryResult;
use crate::executor::{BoxFuture, QueryExecutor, SelectRequest};
use crate::scan::scan_records;
use crate::value::Record;

/// Preloads relation graphs through a query executor.
pub struct Preloader<E> {
    registry: Arc<RelationRegistry>,
    executor: E,
}

impl<E: QueryExecutor> Preloader<E> {
    /// Create a preloader over a registry and an executor.
    pub fn new(registry: Arc<RelationRegistry>, executor: E) -> Self {
        Self { registry, executor }
    }

    /// The relation registry this preloader reads.
    pub fn registry(&self) -> &RelationRegistry {
        &self.registry
    }

    /// Start a load rooted at `entity`.
    pub fn fetch(&self, entity: impl Into<String>) -> FetchBuilder<'_, E> {
        FetchBuilder {
            registry: &*self.registry,
            executor: &self.executor,
            entity: entity.into(),
            filter: None,
            order: None,
            unscoped: false,
            selection: Selection::Named(Default::default()),
            batch_mode: false,
            chunk_mode: false,
            batch_options: Vec::new(),
            chunk_options: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Per-invocation configuration resolved before the first query.
struct LoadContext {
    batch_mode: bool,
    chunk_mode: bool,
    batch_options: Vec<LayerBatchOption>,
    chunk_options: Vec<ChunkOption>,
}

/// Builder for one preloading invocation.
pub struct FetchBuilder<'a, E> {
    registry: &'a RelationRegistry,
    executor: &'a E,
    entity: String,
    filter: Option<String>,
    order: Option<String>,
    unscoped: bool,
    selection: Selection,
    batch_mode: bool,
    chunk_mode: bool,
    batch_options: Vec<LayerBatchOption>,
    chunk_options: Vec<ChunkOption>,
    max_depth: usize,
}

impl<'a, E: QueryExecutor> FetchBuilder<'a, E> {
    /// Append a raw predicate to the root query.
    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filter = Some(clause.into());
        self
    }

    /// Set the root query's ORDER BY clause.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order = Some(clause.into());
        self
    }

    /// Make soft-deleted root rows visible.
    pub fn unscoped(mut self) -> Self {
        self.unscoped = true;
        self
    }

    /// Select a relation by field name or child entity name. Applied at
    /// every layer; repeatable.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        match &mut self.selection {
            Selection::Named(names) => {
                names.insert(name.into());
            }
            Selection::All => {}
        }
        self
    }

    /// Select every declared relation at every layer.
    pub fn with_all(mut self) -> Self {
        self.selection = Selection::All;
        self
    }

    /// Use grouped `key IN (…)` queries instead of per-key loading.
    pub fn with_batch(mut self) -> Self {
        self.batch_mode = true;
        self
    }

    /// Add a per-layer batching option. Repeatable; for duplicate layers
    /// the last one wins.
    pub fn batch_option(mut self, option: LayerBatchOption) -> Self {
        self.batch_mode = true;
        self.batch_options.push(option);
        self
    }

    /// Enable chunked preloading: relations with chunk settings page their
    /// parent row sets. Implies batching.
    pub fn preload(mut self) -> Self {
        self.batch_mode = true;
        self.chunk_mode = true;
        self
    }

    /// Add a chunk override matched to relations by chunk name. Implies
    /// [`preload`](Self::preload); repeatable.
    pub fn preload_option(mut self, option: ChunkOption) -> Self {
        self.batch_mode = true;
        self.chunk_mode = true;
        self.chunk_options.push(option);
        self
    }

    /// Bound the relation traversal depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Run the load and return the assembled record tree.
    pub async fn records(self) -> QueryResult<Vec<Record>> {
        // The whole graph walks (and every tag parses) before any query.
        let graph = RelationGraph::build(self.registry, &self.entity, &self.selection, self.max_depth)?;
        let root = self.registry.entity(&self.entity)?;

        let mut request = SelectRequest::table(root.table.clone()).unscoped(self.unscoped);
        if let Some(filter) = &self.filter {
            request = request.filter(filter.clone());
        }
        if let Some(order) = &self.order {
            request = request.order_by(order.clone());
        }

        debug!(entity = %self.entity, table = %root.table, relations = graph.relation_count(), "root query");
        let mut rows = self.executor.select(&request).await?;

        let context = LoadContext {
            batch_mode: self.batch_mode,
            chunk_mode: self.chunk_mode,
            batch_options: self.batch_options,
            chunk_options: self.chunk_options,
        };
        load_level(self.executor, &graph.roots, &mut rows, &context).await?;
        Ok(rows)
    }

    /// Run the load and scan the assembled records into typed values.
    pub async fn scan<T: DeserializeOwned>(self) -> QueryResult<Vec<T>> {
        let records = self.records().await?;
        scan_records(records)
    }
}

/// Resolve one parent set's relations, then recurse into each child set.
///
/// Order mirrors the per-layer contract: every relation of this parent set
/// is fetched first, then deeper layers resolve, then assembly attaches
/// children bottom-up.
fn load_level<'a, E>(
    executor: &'a E,
    nodes: &'a [RelationNode],
    parents: &'a mut Vec<Record>,
    context: &'a LoadContext,
) -> BoxFuture<'a, QueryResult<()>>
where
    E: QueryExecutor + ?Sized,
{
    Box::pin(async move {
        if parents.is_empty() || nodes.is_empty() {
            return Ok(());
        }

        let mut fetched: Vec<Vec<Record>> = Vec::with_capacity(nodes.len());
        for node in nodes {
            let effective = resolve_batch(
                context.batch_mode,
                &context.batch_options,
                node.spec.batch.as_ref(),
                node.layer,
            );
            let chunk = if context.chunk_mode {
                resolve_chunk(&node.spec.chunk, &context.chunk_options, &node.sibling_chunks)
            } else {
                None
            };
            let rows = fetch_children(executor, node, parents, effective, chunk).await?;
            debug!(field = %node.field, layer = node.layer, rows = rows.len(), "relation loaded");
            fetched.push(rows);
        }

        for (node, rows) in nodes.iter().zip(fetched.iter_mut()) {
            load_level(executor, &node.children, rows, context).await?;
        }

        for (node, rows) in nodes.iter().zip(fetched.iter()) {
            let groups = group_rows(rows, &node.spec.child_key);
            attach_children(
                parents,
                &node.field,
                &node.spec.parent_key,
                node.cardinality,
                rows,
                &groups,
            );
        }

        Ok(())
    })
}
