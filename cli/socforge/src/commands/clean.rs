//! `socforge clean`: remove work directories and build stamps.

use std::fs;

use anyhow::{Context, Result};
use socforge_registry::{ArtifactCache, Library, RegistryError};

use crate::config::Workspace;

/// Remove the build directory, and with `cache` the artifact cache too.
pub fn run(ws: &Workspace, cache: bool) -> Result<()> {
    let build_dir = ws.build_dir();
    if build_dir.exists() {
        fs::remove_dir_all(&build_dir)
            .with_context(|| format!("removing {}", build_dir.display()))?;
        println!("Removed {}", build_dir.display());
    } else {
        println!("Already clean: {} does not exist", build_dir.display());
    }

    if cache {
        let artifacts = ArtifactCache::new(ws.cache_dir());
        if artifacts.clear()? {
            println!("Removed {}", artifacts.root().display());
        } else {
            println!("Already clean: {} does not exist", artifacts.root().display());
        }
    }

    Ok(())
}

/// Remove the build stamp of core `id` so its next build is not fresh.
pub fn core(ws: &Workspace, library: &Library, id: &str) -> Result<()> {
    if !library.cores().contains(id) {
        return Err(RegistryError::UnknownCore {
            id: id.to_string(),
            referenced_by: None,
        }
        .into());
    }
    let artifacts = ArtifactCache::new(ws.cache_dir());
    if artifacts.remove(id)? {
        println!("Removed build stamp of {id}");
    } else {
        println!("Already clean: {id} has no build stamp");
    }
    Ok(())
}
