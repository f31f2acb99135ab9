//! Resource registry
//!
//! Maps resource type names to factories. The RPC layer builds a fresh
//! resource value per request.

use super::resource::Resource;
use super::vault_secret;
use std::collections::BTreeMap;
use tracing::debug;

/// Builds a resource implementation
pub type ResourceFactory = fn() -> Box<dyn Resource>;

/// Registry of managed resource types
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    factories: BTreeMap<&'static str, ResourceFactory>,
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResourceRegistry {
    /// Create a registry with no resources
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every resource this provider serves
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(vault_secret::TYPE_NAME, vault_secret::factory);
        registry
    }

    /// Register a factory under a type name, replacing any previous one
    pub fn register(&mut self, type_name: &'static str, factory: ResourceFactory) {
        debug!(type_name = %type_name, "Registering resource type");
        self.factories.insert(type_name, factory);
    }

    /// Instantiate the resource registered under `type_name`
    pub fn get(&self, type_name: &str) -> Option<Box<dyn Resource>> {
        self.factories.get(type_name).map(|factory| factory())
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// One instance of every registered resource
    pub fn resources(&self) -> impl Iterator<Item = Box<dyn Resource>> + '_ {
        self.factories.values().map(|factory| factory())
    }
}
