//! Per-core artifact cache.
//!
//! After a successful build every core in the plan is stamped. The stamp
//! records the core's content fingerprint so later runs can tell whether
//! the generated artifacts still match the sources.
//!
//! Layout:
//! ```text
//! <cache_root>/
//!   <core-id>/          (":" and "/" replaced by "_")
//!     stamp.json        (id, version, fingerprint)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::descriptor::CoreDescriptor;
use crate::error::{RegistryError, Result};
use crate::integrity::fingerprint_core;

const STAMP_FILE: &str = "stamp.json";

/// Freshness of a core's generated artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Artifacts exist and are newer than every source.
    Fresh,
    /// Artifacts exist but a source changed since.
    Stale,
    /// No artifacts have been generated.
    Missing,
    /// The core could not be loaded or its stamp could not be read.
    Error,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheStatus::Fresh => "fresh",
            CacheStatus::Stale => "stale",
            CacheStatus::Missing => "missing",
            CacheStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Stamp {
    id: String,
    #[serde(default)]
    version: Option<String>,
    fingerprint: String,
}

/// A local artifact cache backed by the filesystem.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    /// Create a cache rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        ArtifactCache { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the artifacts of core `id`.
    pub fn core_dir(&self, id: &str) -> PathBuf {
        let sanitized: String = id
            .chars()
            .map(|c| if c == ':' || c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.root.join(sanitized)
    }

    /// Record that `core` was built from its current sources.
    pub fn stamp(&self, core: &CoreDescriptor) -> Result<PathBuf> {
        let dir = self.core_dir(&core.id);
        std::fs::create_dir_all(&dir).map_err(|e| RegistryError::CacheError {
            path: dir.clone(),
            detail: format!("creating cache dir: {e}"),
        })?;

        let stamp = Stamp {
            id: core.id.clone(),
            version: core.version.as_ref().map(|v| v.to_string()),
            fingerprint: fingerprint_core(core).0,
        };
        let path = dir.join(STAMP_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&stamp)?).map_err(|e| {
            RegistryError::CacheError {
                path: path.clone(),
                detail: format!("writing stamp: {e}"),
            }
        })?;
        Ok(path)
    }

    /// Compare the stamp for `core` against its current sources.
    pub fn status(&self, core: &CoreDescriptor) -> CacheStatus {
        let path = self.core_dir(&core.id).join(STAMP_FILE);
        if !path.is_file() {
            return CacheStatus::Missing;
        }

        let stamp: Stamp = match std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
        {
            Some(stamp) => stamp,
            None => return CacheStatus::Error,
        };

        if stamp.id != core.id || stamp.fingerprint != fingerprint_core(core).as_str() {
            return CacheStatus::Stale;
        }

        let stamped_at = match modified(&path) {
            Some(t) => t,
            None => return CacheStatus::Error,
        };
        let sources = std::iter::once(core.path.clone())
            .chain(core.all_files().map(|f| core.resolve_path(&f.path)));
        for source in sources {
            if modified(&source).is_some_and(|t| t > stamped_at) {
                return CacheStatus::Stale;
            }
        }
        CacheStatus::Fresh
    }

    /// Remove the artifacts of core `id`.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let dir = self.core_dir(id);
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir).map_err(|e| RegistryError::CacheError {
                path: dir,
                detail: format!("removing cache entry: {e}"),
            })?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remove the whole cache directory.
    pub fn clear(&self) -> Result<bool> {
        if !self.root.is_dir() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&self.root).map_err(|e| RegistryError::CacheError {
            path: self.root.clone(),
            detail: format!("removing cache: {e}"),
        })?;
        Ok(true)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_core(dir: &Path) -> CoreDescriptor {
        let path = dir.join("uart.core");
        std::fs::write(
            &path,
            "[core]\nname = \"opencores:uart\"\nversion = \"1.0.0\"\n[[files]]\npath = \"uart.v\"\n",
        )
        .unwrap();
        std::fs::write(dir.join("uart.v"), "module uart; endmodule\n").unwrap();
        CoreDescriptor::load(&path).unwrap()
    }

    #[test]
    fn unstamped_core_is_missing() {
        let lib = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(cache_dir.path().to_path_buf());
        let core = write_core(lib.path());

        assert_eq!(cache.status(&core), CacheStatus::Missing);
    }

    #[test]
    fn stamped_core_is_fresh() {
        let lib = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(cache_dir.path().to_path_buf());
        let core = write_core(lib.path());

        let stamp = cache.stamp(&core).unwrap();
        assert!(stamp.starts_with(cache_dir.path().join("opencores_uart")));
        assert_eq!(cache.status(&core), CacheStatus::Fresh);
    }

    #[test]
    fn edited_source_makes_core_stale() {
        let lib = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(cache_dir.path().to_path_buf());
        let core = write_core(lib.path());

        cache.stamp(&core).unwrap();
        std::fs::write(lib.path().join("uart.v"), "module uart(input clk); endmodule\n").unwrap();
        assert_eq!(cache.status(&core), CacheStatus::Stale);
    }

    #[test]
    fn corrupt_stamp_is_error() {
        let lib = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(cache_dir.path().to_path_buf());
        let core = write_core(lib.path());

        let stamp = cache.stamp(&core).unwrap();
        std::fs::write(&stamp, "not json").unwrap();
        assert_eq!(cache.status(&core), CacheStatus::Error);
    }

    #[test]
    fn remove_and_clear() {
        let lib = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let root = cache_dir.path().join("cache");
        let cache = ArtifactCache::new(root.clone());
        let core = write_core(lib.path());

        cache.stamp(&core).unwrap();
        assert!(cache.remove("opencores:uart").unwrap());
        assert!(!cache.remove("opencores:uart").unwrap());
        assert_eq!(cache.status(&core), CacheStatus::Missing);

        cache.stamp(&core).unwrap();
        assert!(cache.clear().unwrap());
        assert!(!root.exists());
        assert!(!cache.clear().unwrap());
    }

    #[test]
    fn status_display_is_lowercase() {
        assert_eq!(CacheStatus::Fresh.to_string(), "fresh");
        assert_eq!(CacheStatus::Error.to_string(), "error");
    }
}
