//! Core descriptors, dependency resolution and build-plan assembly.
//!
//! A *system* names the cores it needs; each *core* names its sources, its
//! own dependencies and the parameters it hands to downstream tools. This
//! crate turns a system into a [`BuildPlan`]:
//!
//! - **Descriptor loading**: TOML `*.core` / `*.system` files
//! - **Core registry**: identifier lookup with one load per run
//! - **Resolution**: deterministic post-order walk with cycle detection
//! - **Assembly**: ordered files, include dirs and conflict-checked
//!   parameters, with system overrides applied last
//!
//! The plan is executed by a strategy from `socforge-tools`.

pub mod cache;
pub mod descriptor;
pub mod error;
pub mod integrity;
pub mod library;
pub mod plan;
pub mod registry;
pub mod resolution;
pub mod tree;

// Re-exports for convenience.
pub use cache::{ArtifactCache, CacheStatus};
pub use descriptor::{
    declared_name, load_descriptor, BackendSelection, CoreDescriptor, Descriptor, FileEntry,
    ParamValue, SystemDescriptor, ToolOverride,
};
pub use error::{RegistryError, Result};
pub use integrity::ContentHash;
pub use library::Library;
pub use plan::{assemble, BuildPlan, PlanFile, SYSTEM_ORIGIN};
pub use registry::CoreRegistry;
pub use resolution::{resolve, BuildSet, ResolvedCore};
pub use tree::format_tree;
