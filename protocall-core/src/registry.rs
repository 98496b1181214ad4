//! # Descriptor Registry
//!
//! The per-invocation registry of everything the loaded bindings define: a
//! [`DescriptorPool`] for messages, enums and services, and a stub table mapping each
//! stub accessor name (see [`crate::resolver::stub_accessor_name`]) to the service it serves.
//!
//! Each invocation owns its own registry, so fully qualified names from different
//! invocations never collide. A registry only grows while bindings are loaded.
use crate::resolver::stub_accessor_name;
use prost_reflect::{DescriptorError, DescriptorPool, ServiceDescriptor};
use prost_types::FileDescriptorSet;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Invalid descriptors: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Stub accessor '{accessor}' is claimed by both '{first}' and '{second}'")]
    DuplicateStub {
        accessor: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    pool: DescriptorPool,
    stubs: BTreeMap<String, ServiceDescriptor>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Adds message bindings to the pool. Files already present are skipped.
    pub fn register_messages(&mut self, set: FileDescriptorSet) -> Result<(), RegisterError> {
        self.pool.add_file_descriptor_set(set)?;
        Ok(())
    }

    /// Adds service bindings to the pool and a stub for every service they declare.
    ///
    /// Returns the accessor names of the registered stubs.
    pub fn register_services(
        &mut self,
        set: FileDescriptorSet,
    ) -> Result<Vec<String>, RegisterError> {
        let file_names: Vec<String> = set.file.iter().map(|f| f.name().to_string()).collect();

        self.pool.add_file_descriptor_set(set)?;

        let services: Vec<ServiceDescriptor> = file_names
            .iter()
            .filter_map(|name| self.pool.get_file_by_name(name))
            .flat_map(|file| file.services().collect::<Vec<_>>())
            .collect();

        let mut accessors = Vec::with_capacity(services.len());
        for service in services {
            let accessor = stub_accessor_name(service.name());

            if let Some(existing) = self.stubs.get(&accessor)
                && existing.full_name() != service.full_name()
            {
                return Err(RegisterError::DuplicateStub {
                    accessor,
                    first: existing.full_name().to_string(),
                    second: service.full_name().to_string(),
                });
            }

            self.stubs.insert(accessor.clone(), service);
            accessors.push(accessor);
        }

        Ok(accessors)
    }

    /// Looks up the service served by the stub named `accessor`.
    pub fn stub(&self, accessor: &str) -> Option<&ServiceDescriptor> {
        self.stubs.get(accessor)
    }

    /// Iterates over `(accessor, service)` pairs in accessor order.
    pub fn stubs(&self) -> impl Iterator<Item = (&str, &ServiceDescriptor)> {
        self.stubs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fully qualified names of every service in the pool.
    pub fn list_services(&self) -> Vec<String> {
        self.pool
            .services()
            .map(|s| s.full_name().to_string())
            .collect()
    }
}
