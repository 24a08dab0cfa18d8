//! Relation declaration, discovery, and preloading.
//!
//! This module is the heart of the engine:
//! - [`RelationRegistry`] holds entity descriptors and their declared
//!   relation fields (the tag DSL plus each field's container shape)
//! - [`RelationGraph`] discovers the layered relation tree for a root
//!   entity, bounding self-referential chains
//! - batch/chunk configuration resolves per layer and per relation
//! - [`Preloader`] runs a load: root query, then one loader + assembler
//!   pass per layer, recursively
//!
//! ## Example
//!
//! ```rust,ignore
//! let registry = RelationRegistry::new();
//! registry.register(
//!     EntityDescriptor::new("user", "users")
//!         .relation(RelationDecl::one("detail", "detail", "with:uid=id"))
//!         .relation(RelationDecl::many("scores", "score", "with:uid=id, order:score asc")),
//! );
//!
//! let preloader = Preloader::new(registry.into(), executor);
//! let users: Vec<User> = preloader
//!     .fetch("user")
//!     .with_all()
//!     .with_batch()
//!     .scan()
//!     .await?;
//! ```

mod assemble;
mod config;
mod graph;
mod loader;
mod preload;
mod registry;
mod spec;

pub use config::{
    ChunkOption, ChunkPlan, DEFAULT_BATCH_SIZE, DEFAULT_MAX_DEPTH, EffectiveBatch,
    LayerBatchOption, resolve_batch, resolve_chunk,
};
pub use graph::{RelationGraph, RelationNode, Selection};
pub use preload::{FetchBuilder, Preloader};
pub use registry::{EntityDescriptor, RelationDecl, RelationRegistry};
pub use spec::{BatchOverride, Cardinality, ChunkSettings, RelationSpec, parse_relation_tag};
