//! # strata-query
//!
//! Relation preloading and batch loading engine for the Strata ORM.
//!
//! Given a set of root rows returned by a primary query, the engine
//! recursively resolves declared one-to-one / one-to-many associations into
//! a populated object graph while avoiding the N+1 query explosion that
//! per-row association loading produces.
//!
//! This crate provides:
//! - A declarative relation tag DSL (`with:uid=id, order:score asc, …`)
//!   attached to statically registered entity descriptors
//! - Breadth-first relation graph discovery with cycle and depth bounds
//! - Grouped `key IN (…)` batch loading with per-layer thresholds and
//!   batch sizes, plus parent-row chunking for very large loads
//! - Bottom-up assembly into an owned record tree, scanned into caller
//!   types through serde
//!
//! ## Declaring relations
//!
//! ```rust
//! use strata_query::relations::{EntityDescriptor, RelationDecl, RelationRegistry};
//!
//! let registry = RelationRegistry::new();
//! registry.register(
//!     EntityDescriptor::new("user", "users")
//!         .relation(RelationDecl::one("detail", "detail", "with:uid=id"))
//!         .relation(RelationDecl::many("scores", "score", "with:uid=id, order:score asc")),
//! );
//! registry.register(EntityDescriptor::new("detail", "user_detail"));
//! registry.register(EntityDescriptor::new("score", "user_scores"));
//! ```
//!
//! ## Loading
//!
//! ```rust,ignore
//! use strata_query::relations::{LayerBatchOption, Preloader};
//!
//! let preloader = Preloader::new(registry.into(), executor);
//! let users: Vec<User> = preloader
//!     .fetch("user")
//!     .filter("id <= 50")
//!     .with_all()
//!     .with_batch()
//!     .scan()
//!     .await?;
//! ```
//!
//! The default mode loads every relation with one query per distinct
//! parent key; `with_batch()` switches to grouped queries; `preload()`
//! additionally pages very large parent sets. All three produce
//! structurally identical graphs.
//!
//! ## Error Handling
//!
//! ```rust
//! use strata_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::invalid_spec("user", "scores", "missing join-key pair");
//! assert_eq!(err.code, ErrorCode::InvalidRelationSpec);
//! ```

pub mod error;
pub mod executor;
pub mod logging;
pub mod relations;
pub mod scan;
pub mod value;

pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use executor::{BoxFuture, QueryExecutor, SelectRequest};
pub use relations::{
    Cardinality, ChunkOption, EntityDescriptor, LayerBatchOption, Preloader, RelationDecl,
    RelationGraph, RelationRegistry, RelationSpec, Selection,
};
pub use scan::{scan_record, scan_records};
pub use value::{Record, Value, record};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorCode, QueryError, QueryResult};
    pub use crate::executor::{BoxFuture, QueryExecutor, SelectRequest};
    pub use crate::relations::{
        Cardinality, ChunkOption, EntityDescriptor, LayerBatchOption, Preloader, RelationDecl,
        RelationRegistry, Selection,
    };
    pub use crate::value::{Record, Value, record};
}
