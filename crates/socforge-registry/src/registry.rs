//! Core registry: identifier → descriptor lookup with per-run memoization.
//!
//! The registry is built once from an explicit identifier → path mapping.
//! Every identifier owns a one-shot slot, so a descriptor is parsed at most
//! once per run even when several systems are resolved concurrently.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::cache::{ArtifactCache, CacheStatus};
use crate::descriptor::CoreDescriptor;
use crate::error::{RegistryError, Result};

/// Memoized outcome of a failed load.
#[derive(Debug, Clone)]
struct LoadFailure {
    path: PathBuf,
    cause: String,
}

type Loaded = std::result::Result<Arc<CoreDescriptor>, LoadFailure>;

#[derive(Debug)]
struct Slot {
    path: PathBuf,
    cell: OnceLock<Loaded>,
}

/// Registry of known cores.
#[derive(Debug)]
pub struct CoreRegistry {
    slots: BTreeMap<String, Slot>,
    cache: Option<ArtifactCache>,
    loads: AtomicUsize,
}

impl CoreRegistry {
    /// Build a registry from an identifier → descriptor path mapping.
    pub fn new(cores: BTreeMap<String, PathBuf>, cache: Option<ArtifactCache>) -> Self {
        let slots = cores
            .into_iter()
            .map(|(id, path)| {
                (
                    id,
                    Slot {
                        path,
                        cell: OnceLock::new(),
                    },
                )
            })
            .collect();
        CoreRegistry {
            slots,
            cache,
            loads: AtomicUsize::new(0),
        }
    }

    /// All registered identifiers, sorted.
    pub fn list_core_ids(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Descriptor location of `id`.
    pub fn path(&self, id: &str) -> Option<&Path> {
        self.slots.get(id).map(|s| s.path.as_path())
    }

    pub fn cache(&self) -> Option<&ArtifactCache> {
        self.cache.as_ref()
    }

    /// Number of descriptor loads performed so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// The descriptor for `id`, loaded on first access.
    pub fn get(&self, id: &str) -> Result<Arc<CoreDescriptor>> {
        let slot = self.slots.get(id).ok_or_else(|| RegistryError::UnknownCore {
            id: id.to_string(),
            referenced_by: None,
        })?;

        let loaded = slot.cell.get_or_init(|| {
            self.loads.fetch_add(1, Ordering::Relaxed);
            debug!(core = id, path = %slot.path.display(), "loading core descriptor");
            load_slot(id, &slot.path)
        });

        loaded
            .clone()
            .map_err(|f| RegistryError::DescriptorSyntax {
                path: f.path,
                cause: f.cause,
            })
    }

    /// Freshness of the artifacts for `id`. Never fails: unknown or
    /// unloadable cores report [`CacheStatus::Error`].
    pub fn cache_status(&self, id: &str) -> CacheStatus {
        match self.get(id) {
            Ok(core) => match &self.cache {
                Some(cache) => cache.status(&core),
                None => CacheStatus::Missing,
            },
            Err(_) => CacheStatus::Error,
        }
    }

    /// Stamp `id` in the artifact cache. Returns `None` without a cache.
    pub fn stamp(&self, id: &str) -> Result<Option<PathBuf>> {
        let core = self.get(id)?;
        match &self.cache {
            Some(cache) => cache.stamp(&core).map(Some),
            None => Ok(None),
        }
    }
}

fn load_slot(id: &str, path: &Path) -> Loaded {
    match CoreDescriptor::load(path) {
        Ok(core) if core.id != id => Err(LoadFailure {
            path: path.to_path_buf(),
            cause: format!(
                "declares name '{}' but is registered as '{id}'",
                core.id
            ),
        }),
        Ok(core) => Ok(Arc::new(core)),
        Err(RegistryError::DescriptorSyntax { path, cause }) => Err(LoadFailure { path, cause }),
        Err(other) => Err(LoadFailure {
            path: path.to_path_buf(),
            cause: other.to_string(),
        }),
    }
}
