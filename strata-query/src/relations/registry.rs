//! Entity descriptors and the relation registry.
//!
//! Relations are declared up front with a builder API instead of runtime
//! struct introspection: each entity registers its table, its relation
//! fields (tag DSL plus the field's container shape), and any embedded
//! descriptors whose relations it promotes.
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
//! The registry is the only state shared across top-level loads: it is
//! read-mostly, guarded by [`parking_lot::RwLock`], and safe for concurrent
//! readers. Parsed relation specs are memoized per (entity, field) so the
//! tag grammar is parsed once per declaration, not once per query.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use super::spec::{Cardinality, RelationSpec, parse_relation_tag};
use crate::error::{QueryError, QueryResult};

/// One declared relation field on an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDecl {
    /// Field name the assembled children are attached under.
    pub field: String,
    /// Registry name of the child entity.
    pub child_entity: String,
    /// The field's declared container shape. Cardinality comes from here,
    /// never from the tag string.
    pub cardinality: Cardinality,
    /// The declarative tag string (parsed lazily, memoized).
    pub tag: String,
}

impl RelationDecl {
    /// Declare a scalar (at-most-one child) relation field.
    pub fn one(
        field: impl Into<String>,
        child_entity: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            child_entity: child_entity.into(),
            cardinality: Cardinality::One,
            tag: tag.into(),
        }
    }

    /// Declare a collection relation field.
    pub fn many(
        field: impl Into<String>,
        child_entity: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            child_entity: child_entity.into(),
            cardinality: Cardinality::Many,
            tag: tag.into(),
        }
    }
}

/// Registered metadata for one entity.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// Registry name of the entity.
    pub name: String,
    /// Table the entity's rows live in.
    pub table: String,
    relations: Vec<RelationDecl>,
    embeds: Vec<String>,
}

impl EntityDescriptor {
    /// Create a descriptor for `name` backed by `table`.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            relations: Vec::new(),
            embeds: Vec::new(),
        }
    }

    /// Declare a relation field.
    pub fn relation(mut self, decl: RelationDecl) -> Self {
        self.relations.push(decl);
        self
    }

    /// Embed another entity's relations into this one. The embedded
    /// descriptor's relations are promoted to this entity's layer, the way
    /// anonymous struct fields promote their declarations.
    pub fn embed(mut self, entity: impl Into<String>) -> Self {
        self.embeds.push(entity.into());
        self
    }

    /// The relations declared directly on this entity.
    pub fn relations(&self) -> &[RelationDecl] {
        &self.relations
    }

    /// Embedded entity names.
    pub fn embeds(&self) -> &[String] {
        &self.embeds
    }
}

/// Registry of entity descriptors plus the memoized relation-spec cache.
#[derive(Default)]
pub struct RelationRegistry {
    entities: RwLock<HashMap<String, Arc<EntityDescriptor>>>,
    specs: RwLock<HashMap<(String, String), Arc<RelationSpec>>>,
}

impl RelationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity descriptor. Re-registering a name replaces the
    /// previous descriptor and drops its cached specs.
    pub fn register(&self, descriptor: EntityDescriptor) {
        let name = descriptor.name.clone();
        self.entities
            .write()
            .insert(name.clone(), Arc::new(descriptor));
        self.specs.write().retain(|(entity, _), _| *entity != name);
    }

    /// Look up an entity descriptor.
    pub fn get(&self, name: &str) -> Option<Arc<EntityDescriptor>> {
        self.entities.read().get(name).cloned()
    }

    /// Look up an entity descriptor, failing with `UnknownEntity`.
    pub fn entity(&self, name: &str) -> QueryResult<Arc<EntityDescriptor>> {
        self.get(name).ok_or_else(|| QueryError::unknown_entity(name))
    }

    /// All relations visible on `entity`: its own declarations plus the
    /// declarations promoted from embedded descriptors, transitively.
    /// Each item pairs the declaring entity's name (the memoization key)
    /// with the declaration.
    pub fn visible_relations(&self, entity: &str) -> QueryResult<Vec<(String, RelationDecl)>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_relations(entity, &mut seen, &mut out)?;
        Ok(out)
    }

    fn collect_relations(
        &self,
        entity: &str,
        seen: &mut HashSet<String>,
        out: &mut Vec<(String, RelationDecl)>,
    ) -> QueryResult<()> {
        if !seen.insert(entity.to_string()) {
            return Ok(());
        }
        let descriptor = self.entity(entity)?;
        for decl in descriptor.relations() {
            out.push((descriptor.name.clone(), decl.clone()));
        }
        for embedded in descriptor.embeds() {
            self.collect_relations(embedded, seen, out)?;
        }
        Ok(())
    }

    /// The parsed spec for a declaration, memoized per (entity, field).
    pub fn spec_for(&self, entity: &str, decl: &RelationDecl) -> QueryResult<Arc<RelationSpec>> {
        let key = (entity.to_string(), decl.field.clone());
        if let Some(spec) = self.specs.read().get(&key) {
            return Ok(spec.clone());
        }
        let spec = Arc::new(parse_relation_tag(entity, &decl.field, &decl.tag)?);
        self.specs
            .write()
            .entry(key)
            .or_insert_with(|| spec.clone());
        Ok(spec)
    }
}

impl std::fmt::Debug for RelationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entities = self.entities.read();
        f.debug_struct("RelationRegistry")
            .field("entities", &entities.keys().collect::<Vec<_>>())
            .field("cached_specs", &self.specs.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn sample_registry() -> RelationRegistry {
        let registry = RelationRegistry::new();
        registry.register(
            EntityDescriptor::new("user", "users")
                .relation(RelationDecl::one("detail", "detail", "with:uid=id"))
                .relation(RelationDecl::many("scores", "score", "with:uid=id")),
        );
        registry.register(EntityDescriptor::new("detail", "user_detail"));
        registry.register(EntityDescriptor::new("score", "user_scores"));
        registry
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = sample_registry();
        let user = registry.entity("user").unwrap();
        assert_eq!(user.table, "users");
        assert_eq!(user.relations().len(), 2);
    }

    #[test]
    fn test_unknown_entity_errors() {
        let registry = sample_registry();
        let err = registry.entity("ghost").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownEntity);
    }

    #[test]
    fn test_spec_memoized_per_field() {
        let registry = sample_registry();
        let user = registry.entity("user").unwrap();
        let decl = &user.relations()[0];

        let first = registry.spec_for("user", decl).unwrap();
        let second = registry.spec_for("user", decl).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reregister_drops_cached_specs() {
        let registry = sample_registry();
        let user = registry.entity("user").unwrap();
        let old = registry.spec_for("user", &user.relations()[0]).unwrap();

        registry.register(
            EntityDescriptor::new("user", "users")
                .relation(RelationDecl::one("detail", "detail", "with:user_id=id")),
        );
        let user = registry.entity("user").unwrap();
        let fresh = registry.spec_for("user", &user.relations()[0]).unwrap();
        assert_eq!(old.child_key, "uid");
        assert_eq!(fresh.child_key, "user_id");
    }

    #[test]
    fn test_embedded_relations_are_promoted() {
        let registry = RelationRegistry::new();
        registry.register(
            EntityDescriptor::new("base", "base_table")
                .relation(RelationDecl::many("audit", "audit", "with:subject_id=id")),
        );
        registry.register(
            EntityDescriptor::new("user", "users")
                .relation(RelationDecl::one("detail", "detail", "with:uid=id"))
                .embed("base"),
        );
        registry.register(EntityDescriptor::new("detail", "user_detail"));
        registry.register(EntityDescriptor::new("audit", "audit_log"));

        let visible = registry.visible_relations("user").unwrap();
        let fields: Vec<_> = visible.iter().map(|(_, d)| d.field.as_str()).collect();
        assert_eq!(fields, vec!["detail", "audit"]);
        // The promoted declaration memoizes under its declaring entity.
        assert_eq!(visible[1].0, "base");
    }

    #[test]
    fn test_embed_cycle_terminates() {
        let registry = RelationRegistry::new();
        registry.register(EntityDescriptor::new("a", "a_table").embed("b"));
        registry.register(EntityDescriptor::new("b", "b_table").embed("a"));
        let visible = registry.visible_relations("a").unwrap();
        assert!(visible.is_empty());
    }
}
