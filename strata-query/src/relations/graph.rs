//! Relation graph discovery and layer assignment.
//!
//! Before any query is issued, the walker expands the declared relations of
//! the root entity into a tree of [`RelationNode`]s: relations declared on
//! the root form layer 1, relations declared on layer-1 child entities form
//! layer 2, and so on, breadth-first. Every tag parses during the walk, so
//! a malformed declaration aborts the load up front.
//!
//! Self-referential and mutually-referential chains are bounded by
//! backtracking over the entities on the current path: an entity already on
//! the path still gets a node (its rows load once more), but its own
//! relations are not expanded, so the branch ends silently. A `max_depth`
//! bound caps total depth as well.

use std::collections::HashSet;
use std::sync::Arc;

use super::registry::RelationRegistry;
use super::spec::{Cardinality, ChunkSettings, RelationSpec};
use crate::error::QueryResult;

/// Which declared relations a load resolves.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Every declared relation, at every layer.
    All,
    /// Only relations whose field name or child entity name is listed,
    /// checked at every layer.
    Named(HashSet<String>),
}

impl Selection {
    /// Build a named selection from field or entity names.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Named(names.into_iter().map(Into::into).collect())
    }

    fn selects(&self, field: &str, child_entity: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(names) => names.contains(field) || names.contains(child_entity),
        }
    }
}

/// One relation in the discovered graph.
#[derive(Debug, Clone)]
pub struct RelationNode {
    /// Field the assembled children attach under.
    pub field: String,
    /// Entity that declared the relation (embedded declarations keep their
    /// declaring entity).
    pub declaring_entity: String,
    /// Child entity name.
    pub child_entity: String,
    /// Child entity's table.
    pub child_table: String,
    /// Scalar or collection field.
    pub cardinality: Cardinality,
    /// BFS depth from the root (root rows are layer 0).
    pub layer: usize,
    /// The parsed descriptor.
    pub spec: Arc<RelationSpec>,
    /// Chunk settings of every relation sharing this node's parent, used
    /// for chunk-name group lookup.
    pub sibling_chunks: Vec<ChunkSettings>,
    /// Relations of the child entity (empty when the branch was bounded).
    pub children: Vec<RelationNode>,
}

/// The discovered relation graph for one root entity.
#[derive(Debug, Clone)]
pub struct RelationGraph {
    /// Layer-1 relations declared on the root entity.
    pub roots: Vec<RelationNode>,
}

impl RelationGraph {
    /// Discover the graph under `root_entity`.
    pub fn build(
        registry: &RelationRegistry,
        root_entity: &str,
        selection: &Selection,
        max_depth: usize,
    ) -> QueryResult<Self> {
        // Fails fast on an unknown root before walking.
        registry.entity(root_entity)?;
        let mut path = HashSet::new();
        path.insert(root_entity.to_string());
        let roots = walk(registry, root_entity, selection, 1, max_depth, &mut path)?;
        Ok(Self { roots })
    }

    /// The nodes grouped by layer, breadth-first. Layer 1 is index 0.
    pub fn layers(&self) -> Vec<Vec<&RelationNode>> {
        let mut layers: Vec<Vec<&RelationNode>> = Vec::new();
        let mut frontier: Vec<&RelationNode> = self.roots.iter().collect();
        while !frontier.is_empty() {
            let next = frontier
                .iter()
                .flat_map(|n| n.children.iter())
                .collect::<Vec<_>>();
            layers.push(frontier);
            frontier = next;
        }
        layers
    }

    /// Total number of relations in the graph.
    pub fn relation_count(&self) -> usize {
        fn count(nodes: &[RelationNode]) -> usize {
            nodes.len() + nodes.iter().map(|n| count(&n.children)).sum::<usize>()
        }
        count(&self.roots)
    }
}

fn walk(
    registry: &RelationRegistry,
    entity: &str,
    selection: &Selection,
    layer: usize,
    max_depth: usize,
    path: &mut HashSet<String>,
) -> QueryResult<Vec<RelationNode>> {
    if layer > max_depth {
        return Ok(Vec::new());
    }

    let declared = registry.visible_relations(entity)?;
    let mut selected = Vec::new();
    for (declaring, decl) in declared {
        if selection.selects(&decl.field, &decl.child_entity) {
            let spec = registry.spec_for(&declaring, &decl)?;
            selected.push((declaring, decl, spec));
        }
    }

    let sibling_chunks: Vec<ChunkSettings> =
        selected.iter().map(|(_, _, spec)| spec.chunk.clone()).collect();

    let mut nodes = Vec::with_capacity(selected.len());
    for (declaring, decl, spec) in selected {
        let child = registry.entity(&decl.child_entity)?;

        // An entity already on the path loads once more but is not
        // expanded further; this is the cycle bound, not an error.
        let children = if path.contains(&decl.child_entity) {
            Vec::new()
        } else {
            path.insert(decl.child_entity.clone());
            let children = walk(
                registry,
                &decl.child_entity,
                selection,
                layer + 1,
                max_depth,
                path,
            )?;
            path.remove(&decl.child_entity);
            children
        };

        nodes.push(RelationNode {
            field: decl.field,
            declaring_entity: declaring,
            child_entity: child.name.clone(),
            child_table: child.table.clone(),
            cardinality: decl.cardinality,
            layer,
            spec,
            sibling_chunks: sibling_chunks.clone(),
            children,
        });
    }

    Ok(nodes)
}
