//! `socforge.toml` parsing and descriptor discovery.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use socforge_registry::{declared_name, ArtifactCache, CoreRegistry, Library};
use tracing::debug;

/// Name of the installation configuration file.
pub const CONFIG_FILE: &str = "socforge.toml";

/// Environment variable that overrides the cache directory.
pub const CACHE_ENV: &str = "SOCFORGE_CACHE";

/// The top-level configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocforgeConfig {
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Where descriptors and generated artifacts live. Relative paths resolve
/// against the directory holding `socforge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Directories scanned for `*.core` files.
    #[serde(default = "default_cores")]
    pub cores: Vec<PathBuf>,
    /// Directories scanned for `*.system` files.
    #[serde(default = "default_systems")]
    pub systems: Vec<PathBuf>,
    #[serde(default = "default_cache")]
    pub cache: PathBuf,
    #[serde(default = "default_build")]
    pub build: PathBuf,
}

fn default_cores() -> Vec<PathBuf> {
    vec![PathBuf::from("cores")]
}

fn default_systems() -> Vec<PathBuf> {
    vec![PathBuf::from("systems")]
}

fn default_cache() -> PathBuf {
    PathBuf::from(".socforge/cache")
}

fn default_build() -> PathBuf {
    PathBuf::from("build")
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            cores: default_cores(),
            systems: default_systems(),
            cache: default_cache(),
            build: default_build(),
        }
    }
}

/// A loaded configuration and the directory it was found in.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: SocforgeConfig,
}

impl SocforgeConfig {
    /// Parse a configuration from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing socforge.toml")
    }

    /// Search upward from `start_dir` for a `socforge.toml` file, parse
    /// and return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<Workspace>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config: SocforgeConfig = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                debug!(config = %candidate.display(), "loaded configuration");
                return Ok(Some(Workspace { root: dir, config }));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Generate the default template for `socforge init`.
    pub fn template() -> String {
        r#"[paths]
# Directories scanned (recursively) for *.core descriptors.
cores = ["cores"]
# Directories scanned (recursively) for *.system descriptors.
systems = ["systems"]
# Build stamps. Overridden by SOCFORGE_CACHE.
cache = ".socforge/cache"
# Work directories for simulators and backends.
build = "build"
"#
        .to_string()
    }
}

impl Workspace {
    /// Load the configuration above `cwd`, or fall back to defaults rooted
    /// at `cwd`.
    pub fn discover(cwd: &Path) -> Result<Self> {
        Ok(SocforgeConfig::find_and_load(cwd)?.unwrap_or_else(|| {
            debug!("no {CONFIG_FILE} found, using defaults");
            Workspace {
                root: cwd.to_path_buf(),
                config: SocforgeConfig::default(),
            }
        }))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn core_dirs(&self) -> Vec<PathBuf> {
        self.config.paths.cores.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn system_dirs(&self) -> Vec<PathBuf> {
        self.config.paths.systems.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn build_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.build)
    }

    /// Cache directory, honouring `SOCFORGE_CACHE`.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir_with(std::env::var_os(CACHE_ENV).map(PathBuf::from))
    }

    fn cache_dir_with(&self, env_override: Option<PathBuf>) -> PathBuf {
        match env_override {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => self.resolve(&self.config.paths.cache),
        }
    }

    /// Scan the configured roots and build the library.
    pub fn library(&self) -> Result<Library> {
        let cores = discover(&self.core_dirs(), "core")?;
        let systems = discover(&self.system_dirs(), "system")?;
        debug!(cores = cores.len(), systems = systems.len(), "discovered descriptors");
        let registry = CoreRegistry::new(cores, Some(ArtifactCache::new(self.cache_dir())));
        Ok(Library::new(registry, systems))
    }
}

/// Map identifier → path for every `*.<extension>` file below `roots`.
///
/// The identifier is the name declared in the descriptor's `[<extension>]`
/// table, or the file stem when the descriptor cannot be read, so broken
/// files still show up and fail on load. Missing roots are skipped; the
/// same identifier found twice is an error.
pub fn discover(roots: &[PathBuf], extension: &str) -> Result<BTreeMap<String, PathBuf>> {
    let mut found = Vec::new();
    for root in roots {
        if root.is_dir() {
            scan(root, extension, &mut found)?;
        } else {
            debug!(root = %root.display(), "descriptor root does not exist");
        }
    }
    found.sort();

    let mut map: BTreeMap<String, PathBuf> = BTreeMap::new();
    for path in found {
        let Some(id) = declared_name(&path, extension)
            .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        else {
            continue;
        };
        if let Some(previous) = map.get(&id) {
            bail!(
                "{extension} '{id}' is defined twice: {} and {}",
                previous.display(),
                path.display()
            );
        }
        map.insert(id, path);
    }
    Ok(map)
}

fn scan(dir: &Path, extension: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("reading {}", dir.display()))?
            .path();
        if path.is_dir() {
            scan(&path, extension, found)?;
        } else if path.extension().is_some_and(|e| e == extension) {
            found.push(path);
        }
    }
    Ok(())
}
