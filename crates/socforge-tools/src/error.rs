//! Strategy errors.

use std::path::PathBuf;

use socforge_registry::RegistryError;
use thiserror::Error;

use crate::catalogue::StrategyKind;
use crate::strategy::StrategyState;

/// Errors raised while selecting or driving a strategy.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("system '{system}' declares no {kind}; pass one explicitly")]
    NoStrategy { system: String, kind: StrategyKind },

    #[error("'{name}' is a {actual}, not a {expected}")]
    KindMismatch {
        name: String,
        expected: StrategyKind,
        actual: StrategyKind,
    },

    #[error("build plan for '{system}' contains no files")]
    EmptyPlan { system: String },

    #[error("{strategy} requires parameter '{parameter}'")]
    MissingParameter { strategy: String, parameter: String },

    #[error("cannot {operation}: strategy is {actual}, expected {expected}")]
    InvalidState {
        operation: &'static str,
        expected: StrategyState,
        actual: StrategyState,
    },

    #[error("'{name}' is not a simulator and cannot be run")]
    NotASimulator { name: String },

    #[error("{tool} failed {}", build_failure(.code, .signal, .output))]
    BuildFailed {
        tool: String,
        code: Option<i32>,
        signal: Option<i32>,
        output: String,
    },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("work directory error at {}: {detail}", .path.display())]
    WorkDir { path: PathBuf, detail: String },
}

impl ToolError {
    /// Process exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            ToolError::Registry(e) => e.exit_code(),
            ToolError::UnknownStrategy { .. }
            | ToolError::NoStrategy { .. }
            | ToolError::KindMismatch { .. } => 6,
            ToolError::EmptyPlan { .. } | ToolError::MissingParameter { .. } => 7,
            ToolError::InvalidState { .. } | ToolError::NotASimulator { .. } => 8,
            ToolError::BuildFailed { .. } => 9,
            ToolError::Spawn { .. } | ToolError::WorkDir { .. } => 1,
        }
    }
}

/// Describe how a process terminated.
pub fn describe_exit(code: Option<i32>, signal: Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("exit code {code}"),
        (None, Some(signal)) => format!("killed by signal {signal}"),
        (None, None) => "terminated abnormally".to_string(),
    }
}

fn build_failure(code: &Option<i32>, signal: &Option<i32>, output: &str) -> String {
    let status = describe_exit(*code, *signal);
    let trimmed = output.trim_end();
    if trimmed.is_empty() {
        format!("({status})")
    } else {
        format!("({status}):\n{trimmed}")
    }
}

/// Result type for strategy operations.
pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_failure_includes_output() {
        let err = ToolError::BuildFailed {
            tool: "iverilog".into(),
            code: Some(2),
            signal: None,
            output: "top.v:3: syntax error\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "iverilog failed (exit code 2):\ntop.v:3: syntax error"
        );
        assert_eq!(err.exit_code(), 9);
    }

    #[test]
    fn signal_is_reported() {
        assert_eq!(describe_exit(None, Some(9)), "killed by signal 9");
    }

    #[test]
    fn registry_errors_keep_their_exit_code() {
        let err = ToolError::from(RegistryError::CyclicDependency {
            cycle: vec!["a".into(), "a".into()],
        });
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.to_string(), "cyclic dependency: a -> a");
    }
}
