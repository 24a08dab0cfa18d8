//! Batch and chunk configuration resolution.
//!
//! Batching is configured per layer: a layer-0 option is the global
//! fallback, higher layers override it, and a relation-local `batch:` tag
//! clause overrides both for that relation only. Resolution is a pure
//! function so it is testable without any executor.

use super::spec::{BatchOverride, ChunkSettings};

/// Default keys per grouped query when batching is enabled without an
/// explicit size.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default traversal depth bound.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Per-layer batching configuration.
///
/// `layer: 0` is the global fallback applied when no layer-specific entry
/// exists. When the same layer is specified twice in one call, the
/// last-specified entry wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerBatchOption {
    /// Layer this entry applies to (0 = global default).
    pub layer: usize,
    /// Whether grouped queries are used at this layer at all. A disabled
    /// layer falls back to per-key loading regardless of threshold.
    pub enabled: bool,
    /// Minimum distinct-key count before a grouped query is worth it.
    /// 0 means "always batch once enabled".
    pub batch_threshold: usize,
    /// Maximum keys per grouped query.
    pub batch_size: usize,
}

impl Default for LayerBatchOption {
    fn default() -> Self {
        Self {
            layer: 0,
            enabled: true,
            batch_threshold: 0,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Caller-supplied chunk override, matched to relations by chunk name.
///
/// A `chunk_size` of 0 disables chunking for the matched relations even if
/// their tags configure it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOption {
    /// Chunk name this option applies to.
    pub name: String,
    /// Parent rows per chunk page.
    pub chunk_size: usize,
    /// Minimum parent-row count before chunking engages.
    pub chunk_min_rows: usize,
}

impl ChunkOption {
    /// Create a chunk option.
    pub fn new(name: impl Into<String>, chunk_size: usize, chunk_min_rows: usize) -> Self {
        Self {
            name: name.into(),
            chunk_size,
            chunk_min_rows,
        }
    }
}

/// The effective batching configuration for one relation at one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveBatch {
    /// Whether grouped queries may be used.
    pub enabled: bool,
    /// Minimum distinct-key count gate (inclusive).
    pub threshold: usize,
    /// Maximum keys per grouped query.
    pub batch_size: usize,
}

impl EffectiveBatch {
    /// Whether a grouped query is used for `distinct` parent keys.
    ///
    /// The threshold is an inclusive minimum-count gate: batching engages
    /// when `threshold <= distinct`.
    pub fn engages(&self, distinct: usize) -> bool {
        self.enabled && self.threshold <= distinct
    }
}

/// A resolved chunk plan for one relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Parent rows per page.
    pub chunk_size: usize,
    /// Minimum parent-row count before paging engages.
    pub chunk_min_rows: usize,
}

impl ChunkPlan {
    /// Whether paging engages for `parent_rows` parents.
    pub fn engages(&self, parent_rows: usize) -> bool {
        self.chunk_size > 0 && parent_rows >= self.chunk_min_rows
    }
}

/// Resolve the effective batching configuration for `layer`.
///
/// Resolution order: exact match on the layer number, else the layer-0
/// (global) entry, else defaults (enabled only when the caller requested
/// batch mode, threshold 0, [`DEFAULT_BATCH_SIZE`]). Layer entries switch
/// batching within batch mode; they do not turn it on when the caller never
/// requested it. A relation-local override replaces threshold and batch
/// size for that relation only.
pub fn resolve_batch(
    batch_mode: bool,
    options: &[LayerBatchOption],
    relation_override: Option<&BatchOverride>,
    layer: usize,
) -> EffectiveBatch {
    // Last-specified wins on duplicate layer declarations.
    let exact = options.iter().rev().find(|o| o.layer == layer);
    let global = options.iter().rev().find(|o| o.layer == 0);

    let mut effective = match exact.or(if layer == 0 { None } else { global }) {
        Some(option) => EffectiveBatch {
            enabled: batch_mode && option.enabled,
            threshold: option.batch_threshold,
            batch_size: option.batch_size.max(1),
        },
        None => EffectiveBatch {
            enabled: batch_mode,
            threshold: 0,
            batch_size: DEFAULT_BATCH_SIZE,
        },
    };

    if let Some(overrides) = relation_override {
        if let Some(threshold) = overrides.threshold {
            effective.threshold = threshold;
        }
        if let Some(batch_size) = overrides.batch_size {
            effective.batch_size = batch_size.max(1);
        }
    }

    effective
}

/// Resolve the chunk plan for one relation.
///
/// Priority: caller option matched by chunk name, else the relation's own
/// tag settings, else settings shared by a sibling relation with the same
/// chunk name. Returns `None` when chunking stays disabled (including an
/// explicit caller `chunk_size` of 0).
pub fn resolve_chunk(
    chunk: &ChunkSettings,
    options: &[ChunkOption],
    group: &[ChunkSettings],
) -> Option<ChunkPlan> {
    if let Some(name) = &chunk.name {
        if let Some(option) = options.iter().rev().find(|o| &o.name == name) {
            if option.chunk_size == 0 {
                return None;
            }
            return Some(ChunkPlan {
                chunk_size: option.chunk_size,
                chunk_min_rows: option.chunk_min_rows,
            });
        }
    }

    if chunk.is_configured() {
        return Some(ChunkPlan {
            chunk_size: chunk.chunk_size.unwrap_or(0),
            chunk_min_rows: chunk.chunk_min_rows.unwrap_or(0),
        });
    }

    // Another relation in the same walk may carry the sizes for this name.
    if let Some(name) = &chunk.name {
        for sibling in group {
            if sibling.name.as_ref() == Some(name) && sibling.is_configured() {
                return Some(ChunkPlan {
                    chunk_size: sibling.chunk_size.unwrap_or(0),
                    chunk_min_rows: sibling.chunk_min_rows.unwrap_or(0),
                });
            }
        }
    }

    None
}
