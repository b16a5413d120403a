//! Type Registry
//!
//! Holds the descriptors of every searchable object type. The registry is
//! read on every request and written only by administrative calls, so it is
//! stored as an immutable, versioned snapshot behind a read-mostly lock:
//! readers clone the `Arc` and release the lock immediately, writers build a
//! new snapshot and swap it in. A query compiled against an older snapshot
//! keeps using it until it completes.

use super::types::TypeDescriptor;
use crate::error::{SearchError, SearchResult};

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Immutable view of the registered types at one point in time.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    version: u64,
    types: BTreeMap<String, Arc<TypeDescriptor>>,
}

impl RegistrySnapshot {
    /// Monotonic counter bumped by every registry write.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(type_name)
    }

    /// Registered types in name order.
    pub fn types(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Registry of searchable object types.
pub struct TypeRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl TypeRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a registry pre-populated with `types`, validating each one.
    pub fn with_types(types: Vec<TypeDescriptor>) -> SearchResult<Arc<Self>> {
        let mut map = BTreeMap::new();
        for descriptor in types {
            descriptor.validate()?;
            map.insert(descriptor.type_name.clone(), Arc::new(descriptor));
        }

        let version = if map.is_empty() { 0 } else { 1 };
        Ok(Arc::new(Self {
            current: RwLock::new(Arc::new(RegistrySnapshot {
                version,
                types: map,
            })),
        }))
    }

    /// Returns the current snapshot.
    pub async fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.read().await.clone()
    }

    /// Lists registered types.
    ///
    /// # Returns
    /// * All types when `type_name` is `None` (an empty map if none are registered).
    /// * Only the named type when given.
    /// * `NotFound` if the named type is not registered.
    pub async fn list_types(
        &self,
        type_name: Option<&str>,
    ) -> SearchResult<BTreeMap<String, TypeDescriptor>> {
        let snapshot = self.snapshot().await;

        match type_name {
            Some(name) => {
                let descriptor = snapshot
                    .get(name)
                    .ok_or_else(|| SearchError::NotFound(format!("No type {} found", name)))?;
                Ok(BTreeMap::from([(name.to_string(), descriptor.as_ref().clone())]))
            }
            None => Ok(snapshot
                .types()
                .map(|d| (d.type_name.clone(), d.as_ref().clone()))
                .collect()),
        }
    }

    /// Registers (or replaces) a type. Returns the new snapshot version.
    pub async fn register(&self, descriptor: TypeDescriptor) -> SearchResult<u64> {
        descriptor.validate()?;

        let mut current = self.current.write().await;
        let mut types = current.types.clone();
        let type_name = descriptor.type_name.clone();
        let replaced = types
            .insert(type_name.clone(), Arc::new(descriptor))
            .is_some();
        let version = current.version + 1;
        *current = Arc::new(RegistrySnapshot { version, types });

        tracing::info!(
            "Registered type {} (replaced: {}, schema version {})",
            type_name,
            replaced,
            version
        );
        Ok(version)
    }

    /// Removes a type. Returns the new snapshot version.
    pub async fn remove(&self, type_name: &str) -> SearchResult<u64> {
        let mut current = self.current.write().await;
        if current.get(type_name).is_none() {
            return Err(SearchError::NotFound(format!("No type {} found", type_name)));
        }

        let mut types = current.types.clone();
        types.remove(type_name);
        let version = current.version + 1;
        *current = Arc::new(RegistrySnapshot { version, types });

        tracing::info!("Removed type {} (schema version {})", type_name, version);
        Ok(version)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(RegistrySnapshot::default())),
        }
    }
}
