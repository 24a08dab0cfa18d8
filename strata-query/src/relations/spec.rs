//! Relation descriptors and the declarative tag parser.
//!
//! A relation is declared with a tag string attached to the field at
//! registration time:
//!
//! ```text
//! with:<localKey>=<foreignKey>[, where:<predicate>][, order:<clause>][, unscoped:true]
//!     [, batch:threshold=<int>,batchSize=<int>]
//!     [, chunkName:<name>][, chunkSize:<int>][, chunkMinRows:<int>]
//! ```
//!
//! Clauses are comma-separated and order-independent. In `with:uid=id` the
//! left side is the foreign-key column on the **child** table and the right
//! side the local-key field on the **parent** row; a single identifier
//! (`with:uid`) declares the same name on both sides. `batchSize=<int>` may
//! appear as a bare continuation of a preceding `batch:` clause, matching
//! tags like `batch:threshold=100,batchSize=200`.

use crate::error::{QueryError, QueryResult};

/// How many children a relation field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// At most one child (scalar field).
    One,
    /// Any number of children (collection field).
    Many,
}

impl Cardinality {
    /// Check if this relation returns multiple records.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many)
    }
}

/// Per-relation batching override from a `batch:` tag clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOverride {
    /// Minimum distinct-key count before a grouped query is used.
    pub threshold: Option<usize>,
    /// Maximum keys per grouped query.
    pub batch_size: Option<usize>,
}

/// Per-relation chunk settings from `chunkName:`/`chunkSize:`/`chunkMinRows:`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSettings {
    /// Name used to match caller-supplied chunk options and to share
    /// settings across relations.
    pub name: Option<String>,
    /// Parent rows per chunk page.
    pub chunk_size: Option<usize>,
    /// Minimum parent-row count before chunking engages.
    pub chunk_min_rows: Option<usize>,
}

impl ChunkSettings {
    /// Chunking is configured in the tag only when both sizes are present
    /// and positive.
    pub fn is_configured(&self) -> bool {
        matches!((self.chunk_size, self.chunk_min_rows), (Some(s), Some(m)) if s > 0 && m > 0)
    }
}

/// A parsed relation descriptor.
///
/// Immutable once parsed; the registry memoizes one instance per
/// (entity, field) pair for reuse across queries.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationSpec {
    /// Foreign-key column on the child table.
    pub child_key: String,
    /// Local-key field on the parent row.
    pub parent_key: String,
    /// Raw predicate applied to child queries.
    pub where_clause: Option<String>,
    /// Raw ORDER BY clause applied to child queries.
    pub order_clause: Option<String>,
    /// Whether soft-deleted children are visible.
    pub include_soft_deleted: bool,
    /// Relation-local batching override.
    pub batch: Option<BatchOverride>,
    /// Relation-local chunk settings.
    pub chunk: ChunkSettings,
}

fn parse_int(entity: &str, field: &str, key: &str, raw: &str) -> QueryResult<usize> {
    raw.trim().parse::<usize>().map_err(|_| {
        QueryError::invalid_spec(
            entity,
            field,
            format!("{key} expects an integer, got '{raw}'"),
        )
    })
}

/// Parse a relation tag string into a [`RelationSpec`].
///
/// `entity` and `field` only feed error context. Fails with
/// `InvalidRelationSpec` when the `with:` join-key pair is missing or empty,
/// when `batch:`/`chunk*:` values are non-integer, or on an unknown clause.
pub fn parse_relation_tag(entity: &str, field: &str, tag: &str) -> QueryResult<RelationSpec> {
    let mut with: Option<(String, String)> = None;
    let mut where_clause = None;
    let mut order_clause = None;
    let mut include_soft_deleted = false;
    let mut batch: Option<BatchOverride> = None;
    let mut chunk = ChunkSettings::default();

    for segment in tag.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let (key, value) = match segment.split_once(':') {
            Some((k, v)) => (k.trim(), v.trim()),
            // Bare `k=v` segments continue a preceding `batch:` clause.
            None => match segment.split_once('=') {
                Some((k, v)) => {
                    let entry = batch.get_or_insert_with(BatchOverride::default);
                    match k.trim() {
                        "threshold" => {
                            entry.threshold = Some(parse_int(entity, field, "threshold", v)?);
                        }
                        "batchSize" => {
                            entry.batch_size = Some(parse_int(entity, field, "batchSize", v)?);
                        }
                        other => {
                            return Err(QueryError::invalid_spec(
                                entity,
                                field,
                                format!("unknown clause '{other}'"),
                            ));
                        }
                    }
                    continue;
                }
                None => {
                    return Err(QueryError::invalid_spec(
                        entity,
                        field,
                        format!("clause '{segment}' is not key:value"),
                    ));
                }
            },
        };

        match key {
            "with" => {
                let (child, parent) = match value.split_once('=') {
                    Some((c, p)) => (c.trim(), p.trim()),
                    None => (value, value),
                };
                if child.is_empty() || parent.is_empty() {
                    return Err(QueryError::invalid_spec(
                        entity,
                        field,
                        "with: is missing its join-key pair",
                    ));
                }
                with = Some((child.to_string(), parent.to_string()));
            }
            "where" => where_clause = Some(value.to_string()),
            "order" => order_clause = Some(value.to_string()),
            "unscoped" => include_soft_deleted = value == "true",
            "batch" => {
                let entry = batch.get_or_insert_with(BatchOverride::default);
                match value.split_once('=') {
                    Some((k, v)) => match k.trim() {
                        "threshold" => {
                            entry.threshold = Some(parse_int(entity, field, "threshold", v)?);
                        }
                        "batchSize" => {
                            entry.batch_size = Some(parse_int(entity, field, "batchSize", v)?);
                        }
                        other => {
                            return Err(QueryError::invalid_spec(
                                entity,
                                field,
                                format!("unknown batch parameter '{other}'"),
                            ));
                        }
                    },
                    None => {
                        return Err(QueryError::invalid_spec(
                            entity,
                            field,
                            "batch: expects threshold=<int>,batchSize=<int>",
                        ));
                    }
                }
            }
            "chunkName" => chunk.name = Some(value.to_string()),
            "chunkSize" => chunk.chunk_size = Some(parse_int(entity, field, "chunkSize", value)?),
            "chunkMinRows" => {
                chunk.chunk_min_rows = Some(parse_int(entity, field, "chunkMinRows", value)?);
            }
            other => {
                return Err(QueryError::invalid_spec(
                    entity,
                    field,
                    format!("unknown clause '{other}'"),
                ));
            }
        }
    }

    let Some((child_key, parent_key)) = with else {
        return Err(QueryError::invalid_spec(
            entity,
            field,
            "with: is missing its join-key pair",
        ));
    };

    Ok(RelationSpec {
        child_key,
        parent_key,
        where_clause,
        order_clause,
        include_soft_deleted,
        batch,
        chunk,
    })
}
