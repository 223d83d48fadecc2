//! Core and system descriptor parsing.
//!
//! Descriptors are TOML files. A core descriptor (`*.core`) names its
//! sources, its direct dependencies and the parameters it hands to
//! downstream tools:
//!
//! ```toml
//! [core]
//! name = "opencores:uart16550"
//! version = "1.5.0"
//! depends = ["wb_common"]
//! include_dirs = ["rtl/verilog"]
//!
//! [[files]]
//! path = "rtl/verilog/uart_top.v"
//!
//! [parameters]
//! freq = 50
//!
//! [tools.icarus]
//! files = [{ path = "bench/uart_tb.v" }]
//! ```
//!
//! A system descriptor (`*.system`) lists root cores, preferred simulators
//! and an optional backend section. Cross references are not validated
//! here; unknown dependency names are reported by the resolver.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// A tool parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Integer(i) => write!(f, "{i}"),
            ParamValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Integer(i)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

/// A source file declared by a core or a system backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    /// Path relative to the descriptor's directory (or absolute).
    pub path: PathBuf,
    /// Explicit file-type tag; inferred from the extension when absent.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileEntry {
            path: path.into(),
            file_type: None,
        }
    }

    /// The effective file-type tag.
    pub fn file_type(&self) -> &str {
        match &self.file_type {
            Some(t) => t,
            None => infer_file_type(&self.path),
        }
    }
}

/// Map a file extension to its default file-type tag.
pub fn infer_file_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("v") => "verilogSource",
        Some("sv") => "systemVerilogSource",
        Some("vh") | Some("svh") => "verilogInclude",
        Some("vhd") | Some("vhdl") => "vhdlSource",
        Some("tcl") => "tclSource",
        Some("sdc") => "sdc",
        _ => "user",
    }
}

/// Extra files and parameters a core contributes only when built with one
/// specific strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolOverride {
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

/// A parsed core descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreDescriptor {
    /// Namespaced identifier, unique within a library.
    pub id: String,
    pub version: Option<semver::Version>,
    pub description: Option<String>,
    /// Direct dependencies in declared order.
    pub dependencies: Vec<String>,
    pub files: Vec<FileEntry>,
    pub include_dirs: Vec<PathBuf>,
    pub parameters: BTreeMap<String, ParamValue>,
    /// Strategy name → override block.
    pub tools: BTreeMap<String, ToolOverride>,
    /// Location of the descriptor file.
    pub path: PathBuf,
}

/// Backend selection declared by a system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendSelection {
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// A parsed system descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemDescriptor {
    pub id: String,
    pub description: Option<String>,
    /// Root dependencies in declared order.
    pub dependencies: Vec<String>,
    /// Preferred simulators, most preferred first.
    pub simulators: Vec<String>,
    pub backend: Option<BackendSelection>,
    /// System-level overrides, applied after every core.
    pub parameters: BTreeMap<String, ParamValue>,
    pub path: PathBuf,
}

/// Either kind of descriptor, as returned by [`load_descriptor`].
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Core(CoreDescriptor),
    System(SystemDescriptor),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CoreFile {
    core: CoreSection,
    #[serde(default)]
    files: Vec<FileEntry>,
    #[serde(default)]
    parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    tools: BTreeMap<String, ToolOverride>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CoreSection {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    depends: Vec<String>,
    #[serde(default)]
    include_dirs: Vec<PathBuf>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SystemFile {
    system: SystemSection,
    #[serde(default)]
    parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    backend: Option<BackendSelection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SystemSection {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    depends: Vec<String>,
    #[serde(default)]
    simulators: Vec<String>,
}

fn syntax_error(path: &Path, cause: impl fmt::Display) -> RegistryError {
    RegistryError::DescriptorSyntax {
        path: path.to_path_buf(),
        cause: cause.to_string(),
    }
}

fn read_descriptor(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| syntax_error(path, format!("cannot read: {e}")))
}

fn check_name(path: &Path, section: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(syntax_error(path, format!("{section}.name is required")));
    }
    Ok(())
}

fn check_depends(path: &Path, depends: &[String]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for dep in depends {
        if dep.trim().is_empty() {
            return Err(syntax_error(path, "empty dependency name"));
        }
        if !seen.insert(dep.as_str()) {
            return Err(syntax_error(path, format!("dependency '{dep}' listed twice")));
        }
    }
    Ok(())
}

fn check_files<'a>(path: &Path, files: impl IntoIterator<Item = &'a FileEntry>) -> Result<()> {
    for file in files {
        if file.path.as_os_str().is_empty() {
            return Err(syntax_error(path, "file entry with empty path"));
        }
    }
    Ok(())
}

impl CoreDescriptor {
    /// Parse a core descriptor from TOML text. `path` is recorded as the
    /// descriptor's location and used in error messages.
    pub fn parse(input: &str, path: &Path) -> Result<Self> {
        let file: CoreFile = toml::from_str(input).map_err(|e| syntax_error(path, e))?;

        check_name(path, "core", &file.core.name)?;
        check_depends(path, &file.core.depends)?;
        check_files(path, &file.files)?;
        for tool in file.tools.values() {
            check_files(path, &tool.files)?;
        }

        let version = file
            .core
            .version
            .as_deref()
            .map(semver::Version::parse)
            .transpose()
            .map_err(|e| syntax_error(path, format!("invalid core.version: {e}")))?;

        Ok(CoreDescriptor {
            id: file.core.name,
            version,
            description: file.core.description,
            dependencies: file.core.depends,
            files: file.files,
            include_dirs: file.core.include_dirs,
            parameters: file.parameters,
            tools: file.tools,
            path: path.to_path_buf(),
        })
    }

    /// Load a core descriptor from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_descriptor(path)?;
        Self::parse(&content, path)
    }

    /// Directory the descriptor lives in.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Resolve a declared path against the core root.
    pub fn resolve_path(&self, declared: &Path) -> PathBuf {
        self.root().join(declared)
    }

    /// Files contributed when built with `strategy`: declared files first,
    /// then the strategy's override files.
    pub fn files_for<'a>(&'a self, strategy: Option<&str>) -> impl Iterator<Item = &'a FileEntry> {
        let extra = strategy
            .and_then(|name| self.tools.get(name))
            .map(|t| t.files.as_slice())
            .unwrap_or(&[]);
        self.files.iter().chain(extra.iter())
    }

    /// Parameters contributed when built with `strategy`. The strategy's
    /// override block replaces base values of the same name.
    pub fn parameters_for(&self, strategy: Option<&str>) -> BTreeMap<String, ParamValue> {
        let mut params = self.parameters.clone();
        if let Some(tool) = strategy.and_then(|name| self.tools.get(name)) {
            params.extend(tool.parameters.clone());
        }
        params
    }

    /// Every file the core references under any strategy.
    pub fn all_files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files
            .iter()
            .chain(self.tools.values().flat_map(|t| t.files.iter()))
    }
}

impl SystemDescriptor {
    /// Parse a system descriptor from TOML text.
    pub fn parse(input: &str, path: &Path) -> Result<Self> {
        let file: SystemFile =
            toml::from_str(input).map_err(|e| syntax_error(path, e))?;

        check_name(path, "system", &file.system.name)?;
        check_depends(path, &file.system.depends)?;
        if let Some(backend) = &file.backend {
            if backend.name.trim().is_empty() {
                return Err(syntax_error(path, "backend.name is required"));
            }
            check_files(path, &backend.files)?;
        }

        Ok(SystemDescriptor {
            id: file.system.name,
            description: file.system.description,
            dependencies: file.system.depends,
            simulators: file.system.simulators,
            backend: file.backend,
            parameters: file.parameters,
            path: path.to_path_buf(),
        })
    }

    /// Load a system descriptor from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_descriptor(path)?;
        Self::parse(&content, path)
    }

    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Name of the declared backend, if any.
    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.name.as_str())
    }

    /// The backend section, when `strategy` is the declared backend.
    pub fn backend_for(&self, strategy: Option<&str>) -> Option<&BackendSelection> {
        match (strategy, &self.backend) {
            (Some(name), Some(backend)) if backend.name == name => Some(backend),
            _ => None,
        }
    }

    /// System-level overrides in effect for `strategy`: the `[parameters]`
    /// table, then the backend parameters if `strategy` is the backend.
    pub fn overrides_for(&self, strategy: Option<&str>) -> BTreeMap<String, ParamValue> {
        let mut overrides = self.parameters.clone();
        if let Some(backend) = self.backend_for(strategy) {
            overrides.extend(backend.parameters.clone());
        }
        overrides
    }
}

/// The `name` declared in the `[section]` table of the descriptor at
/// `path`, read without validating the rest of the file. `None` when the
/// file is unreadable, is not TOML, or declares no name.
pub fn declared_name(path: &Path, section: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let table: toml::Table = content.parse().ok()?;
    let name = table.get(section)?.get("name")?.as_str()?;
    (!name.trim().is_empty()).then(|| name.to_string())
}

/// Load a descriptor of either kind, dispatching on its top-level table.
pub fn load_descriptor(path: &Path) -> Result<Descriptor> {
    let content = read_descriptor(path)?;
    let table: toml::Table = content
        .parse()
        .map_err(|e: toml::de::Error| syntax_error(path, e))?;

    match (table.contains_key("core"), table.contains_key("system")) {
        (true, false) => Ok(Descriptor::Core(CoreDescriptor::parse(&content, path)?)),
        (false, true) => Ok(Descriptor::System(SystemDescriptor::parse(&content, path)?)),
        (true, true) => Err(syntax_error(path, "both [core] and [system] tables present")),
        (false, false) => Err(syntax_error(path, "missing [core] or [system] table")),
    }
}
