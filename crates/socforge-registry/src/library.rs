//! A library pairs the core registry with the known systems.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::descriptor::SystemDescriptor;
use crate::error::{RegistryError, Result};
use crate::plan::{assemble, BuildPlan};
use crate::registry::CoreRegistry;
use crate::resolution::{resolve, BuildSet};

/// Every core and system known to one installation.
#[derive(Debug)]
pub struct Library {
    cores: CoreRegistry,
    systems: BTreeMap<String, PathBuf>,
}

impl Library {
    pub fn new(cores: CoreRegistry, systems: BTreeMap<String, PathBuf>) -> Self {
        Library { cores, systems }
    }

    pub fn cores(&self) -> &CoreRegistry {
        &self.cores
    }

    /// All known system identifiers, sorted.
    pub fn list_system_ids(&self) -> Vec<String> {
        self.systems.keys().cloned().collect()
    }

    pub fn system_path(&self, id: &str) -> Option<&Path> {
        self.systems.get(id).map(PathBuf::as_path)
    }

    /// Load the descriptor of system `id`.
    pub fn load_system(&self, id: &str) -> Result<SystemDescriptor> {
        let path = self
            .systems
            .get(id)
            .ok_or_else(|| RegistryError::UnknownSystem { id: id.to_string() })?;
        let system = SystemDescriptor::load(path)?;
        if system.id != id {
            return Err(RegistryError::DescriptorSyntax {
                path: path.clone(),
                cause: format!(
                    "declares name '{}' but is registered as '{id}'",
                    system.id
                ),
            });
        }
        Ok(system)
    }

    /// Resolve the build set of an already loaded system.
    pub fn resolve(&self, system: &SystemDescriptor) -> Result<BuildSet> {
        resolve(system, &self.cores)
    }

    /// Plan `system` for `strategy`.
    pub fn plan_for(&self, system: &SystemDescriptor, strategy: Option<&str>) -> Result<BuildPlan> {
        let build_set = self.resolve(system)?;
        assemble(system, &build_set, strategy)
    }

    /// Resolve and assemble system `id` for its declared backend.
    pub fn resolve_system(&self, id: &str) -> Result<BuildPlan> {
        let system = self.load_system(id)?;
        info!(system = id, "resolving system");
        self.plan_for(&system, system.backend_name())
    }
}
