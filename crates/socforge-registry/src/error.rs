//! Registry error types.

use std::path::PathBuf;

use crate::descriptor::ParamValue;

/// Errors that can occur while loading, resolving or assembling cores.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A core or system descriptor could not be parsed.
    #[error("invalid descriptor {}: {cause}", .path.display())]
    DescriptorSyntax { path: PathBuf, cause: String },

    /// A core identifier is not registered.
    #[error("unknown core '{id}'{}", required_by(.referenced_by))]
    UnknownCore {
        id: String,
        referenced_by: Option<String>,
    },

    /// A system identifier is not registered.
    #[error("unknown system '{id}'")]
    UnknownSystem { id: String },

    /// The dependency graph contains a cycle.
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Two cores contribute different values for the same parameter.
    #[error(
        "parameter '{parameter}' conflicts: '{first_core}' sets {first_value}, '{second_core}' sets {second_value}"
    )]
    ParameterConflict {
        parameter: String,
        first_core: String,
        first_value: ParamValue,
        second_core: String,
        second_value: ParamValue,
    },

    /// Cache I/O error.
    #[error("cache error at {}: {detail}", .path.display())]
    CacheError { path: PathBuf, detail: String },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Process exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            RegistryError::DescriptorSyntax { .. } => 2,
            RegistryError::UnknownCore { .. } | RegistryError::UnknownSystem { .. } => 3,
            RegistryError::CyclicDependency { .. } => 4,
            RegistryError::ParameterConflict { .. } => 5,
            RegistryError::CacheError { .. } | RegistryError::Json(_) | RegistryError::Io(_) => 1,
        }
    }
}

fn required_by(referenced_by: &Option<String>) -> String {
    match referenced_by {
        Some(r) => format!(" (required by '{r}')"),
        None => String::new(),
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
