//! Build plan assembly.
//!
//! Folds a [`BuildSet`] into one [`BuildPlan`]: files and include
//! directories are concatenated in build order, parameters are merged
//! with strict conflict detection, and system-level overrides are applied
//! last.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::descriptor::{ParamValue, SystemDescriptor};
use crate::error::{RegistryError, Result};
use crate::resolution::BuildSet;

/// Origin recorded for parameters set by the system itself.
pub const SYSTEM_ORIGIN: &str = "system";

/// A file in a build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanFile {
    /// Core (or system) that contributed the file.
    pub core: String,
    /// Path resolved against the contributor's directory.
    pub path: PathBuf,
    pub file_type: String,
}

/// Flattened, ordered, conflict-free input for one strategy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub system: String,
    /// Selected backend or simulator.
    pub strategy: Option<String>,
    /// Core identifiers in build order.
    pub cores: Vec<String>,
    pub files: Vec<PlanFile>,
    pub include_dirs: Vec<PathBuf>,
    pub parameters: BTreeMap<String, ParamValue>,
    /// Parameter name → core id or [`SYSTEM_ORIGIN`].
    pub origins: BTreeMap<String, String>,
}

impl BuildPlan {
    fn empty(system: &str, strategy: Option<&str>) -> Self {
        BuildPlan {
            system: system.to_string(),
            strategy: strategy.map(str::to_string),
            cores: Vec::new(),
            files: Vec::new(),
            include_dirs: Vec::new(),
            parameters: BTreeMap::new(),
            origins: BTreeMap::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Files whose type is one of `types`, in plan order.
    pub fn files_of_type<'a>(&'a self, types: &'a [&'a str]) -> impl Iterator<Item = &'a PlanFile> {
        self.files
            .iter()
            .filter(move |f| types.contains(&f.file_type.as_str()))
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    fn push_include_dir(&mut self, dir: PathBuf) {
        if !self.include_dirs.contains(&dir) {
            self.include_dirs.push(dir);
        }
    }
}

/// Assemble the plan for `system` from its resolved `build_set`, as built
/// with `strategy`.
///
/// Core-vs-core conflicts are fatal unless the system overrides the
/// parameter, in which case the system value is used and no conflict is
/// raised.
pub fn assemble(
    system: &SystemDescriptor,
    build_set: &BuildSet,
    strategy: Option<&str>,
) -> Result<BuildPlan> {
    let overrides = system.overrides_for(strategy);
    let mut plan = BuildPlan::empty(&system.id, strategy);

    for resolved in &build_set.cores {
        let core = &resolved.descriptor;
        plan.cores.push(core.id.clone());

        for entry in core.files_for(strategy) {
            plan.files.push(PlanFile {
                core: core.id.clone(),
                path: core.resolve_path(&entry.path),
                file_type: entry.file_type().to_string(),
            });
        }
        for dir in &core.include_dirs {
            plan.push_include_dir(core.resolve_path(dir));
        }

        for (name, value) in core.parameters_for(strategy) {
            if overrides.contains_key(&name) {
                continue;
            }
            match plan.parameters.get(&name) {
                None => {
                    plan.origins.insert(name.clone(), core.id.clone());
                    plan.parameters.insert(name, value);
                }
                Some(existing) if *existing == value => {}
                Some(existing) => {
                    return Err(RegistryError::ParameterConflict {
                        first_core: plan.origins.get(&name).cloned().unwrap_or_default(),
                        first_value: existing.clone(),
                        second_core: core.id.clone(),
                        second_value: value,
                        parameter: name,
                    });
                }
            }
        }
    }

    if let Some(backend) = system.backend_for(strategy) {
        for entry in &backend.files {
            plan.files.push(PlanFile {
                core: system.id.clone(),
                path: system.root().join(&entry.path),
                file_type: entry.file_type().to_string(),
            });
        }
    }

    for (name, value) in overrides {
        plan.origins.insert(name.clone(), SYSTEM_ORIGIN.to_string());
        plan.parameters.insert(name, value);
    }

    debug!(
        system = %plan.system,
        strategy = plan.strategy.as_deref().unwrap_or("-"),
        files = plan.files.len(),
        parameters = plan.parameters.len(),
        "assembled build plan"
    );

    Ok(plan)
}
