//! Metadata registry: one resolved [`EntityMetadata`] per entity type.

use std::any::{type_name, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use super::entity::{Entity, EntityMetadata};
use super::error::MappingError;
use super::introspect::introspect;

/// Cache of resolved entity metadata, keyed by Rust type.
///
/// The registry is an owned value: engines share one through an `Arc`, tests
/// build their own. Entries are never evicted.
///
/// Lookups for different types hit independent shards. Two threads resolving
/// the same unseen type may both introspect it; only the first insert is
/// kept and both callers get that instance, so nobody sees a partially built
/// entry or a duplicate. Failed resolutions are not cached.
#[derive(Debug, Default)]
pub struct Registry {
    entries: DashMap<TypeId, Arc<EntityMetadata>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve metadata for `T`, building it on first use.
    pub fn resolve<T: Entity>(&self) -> Result<Arc<EntityMetadata>, MappingError> {
        let key = TypeId::of::<T>();
        if let Some(found) = self.entries.get(&key) {
            return Ok(Arc::clone(found.value()));
        }

        trace!(entity = type_name::<T>(), "Building entity metadata");
        let mut schema = T::schema();
        if let Some(table) = T::table_name() {
            schema = schema.with_table(table);
        }
        let built = Arc::new(introspect(&schema)?);

        let entry = self.entries.entry(key).or_insert(built);
        Ok(Arc::clone(entry.value()))
    }

    /// Check whether `T` has been resolved.
    pub fn contains<T: Entity>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of resolved types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
