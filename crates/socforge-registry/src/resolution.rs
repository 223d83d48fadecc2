//! Dependency resolution.
//!
//! Turns a system's root dependency list into a [`BuildSet`]: a
//! depth-first, post-order walk over dependency edges in declared order.
//! Every core is emitted after everything it depends on, once, at the
//! position of its first completion.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheStatus;
use crate::descriptor::{CoreDescriptor, SystemDescriptor};
use crate::error::{RegistryError, Result};
use crate::registry::CoreRegistry;

/// A core placed in a build set.
#[derive(Debug, Clone)]
pub struct ResolvedCore {
    pub descriptor: Arc<CoreDescriptor>,
    /// Position in the build set.
    pub order: usize,
    /// Distance from the system at first discovery; roots are 0.
    pub depth: usize,
    pub cache: CacheStatus,
}

impl ResolvedCore {
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }
}

/// Topologically ordered, cycle-free set of cores for one system.
#[derive(Debug, Clone)]
pub struct BuildSet {
    pub system: String,
    pub cores: Vec<ResolvedCore>,
}

impl BuildSet {
    /// Core identifiers in build order.
    pub fn ids(&self) -> Vec<&str> {
        self.cores.iter().map(|c| c.id()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&ResolvedCore> {
        self.cores.iter().find(|c| c.id() == id)
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

struct Walk<'a> {
    registry: &'a CoreRegistry,
    states: HashMap<String, Visit>,
    /// Cores currently in progress, outermost first.
    stack: Vec<String>,
    out: Vec<(Arc<CoreDescriptor>, usize)>,
}

impl Walk<'_> {
    fn visit(&mut self, id: &str, referenced_by: &str, depth: usize) -> Result<()> {
        match self.states.get(id) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = self.stack.iter().position(|s| s == id).unwrap_or(0);
                let mut cycle = self.stack[start..].to_vec();
                cycle.push(id.to_string());
                return Err(RegistryError::CyclicDependency { cycle });
            }
            None => {}
        }

        let core = self.registry.get(id).map_err(|e| match e {
            RegistryError::UnknownCore { id, .. } => RegistryError::UnknownCore {
                id,
                referenced_by: Some(referenced_by.to_string()),
            },
            other => other,
        })?;

        self.states.insert(id.to_string(), Visit::InProgress);
        self.stack.push(id.to_string());

        for dep in &core.dependencies {
            self.visit(dep, &core.id, depth + 1)?;
        }

        self.stack.pop();
        self.states.insert(id.to_string(), Visit::Done);
        self.out.push((core, depth));
        Ok(())
    }
}

/// Resolve the full, ordered set of cores `system` needs.
pub fn resolve(system: &SystemDescriptor, registry: &CoreRegistry) -> Result<BuildSet> {
    let mut walk = Walk {
        registry,
        states: HashMap::new(),
        stack: Vec::new(),
        out: Vec::new(),
    };

    for root in &system.dependencies {
        walk.visit(root, &system.id, 0)?;
    }

    let cores: Vec<ResolvedCore> = walk
        .out
        .into_iter()
        .enumerate()
        .map(|(order, (descriptor, depth))| {
            let cache = registry.cache_status(&descriptor.id);
            ResolvedCore {
                descriptor,
                order,
                depth,
                cache,
            }
        })
        .collect();

    debug!(
        system = %system.id,
        cores = cores.len(),
        "resolved build set"
    );

    Ok(BuildSet {
        system: system.id.clone(),
        cores,
    })
}
