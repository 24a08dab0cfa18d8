//! # Strata
//!
//! Relation preloading and batch loading for Rust data access.
//!
//! Strata resolves declared one-to-one / one-to-many associations into a
//! populated object graph without the N+1 query explosion: one grouped
//! `key IN (…)` query per relation per layer instead of one query per
//! parent row.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! let registry = RelationRegistry::new();
//! registry.register(
//!     EntityDescriptor::new("user", "users")
//!         .relation(RelationDecl::one("detail", "detail", "with:uid=id"))
//!         .relation(RelationDecl::many("scores", "score", "with:uid=id, order:score asc")),
//! );
//! registry.register(EntityDescriptor::new("detail", "user_detail"));
//! registry.register(EntityDescriptor::new("score", "user_scores"));
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
//! The query executor is a collaborator: implement
//! [`query::QueryExecutor`] over your driver or pool and Strata handles
//! relation discovery, batching, chunking, and assembly.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Query engine: registry, graph discovery, batch loading, assembly.
pub mod query {
    pub use strata_query::*;
}

// Re-export key types at the crate root
pub use strata_query::{
    ChunkOption, EntityDescriptor, ErrorCode, LayerBatchOption, Preloader, QueryError,
    QueryExecutor, QueryResult, Record, RelationDecl, RelationRegistry, SelectRequest, Value,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use strata_query::prelude::*;
}
