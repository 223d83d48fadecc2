//! CLI command implementations.

pub mod build;
pub mod clean;
pub mod init;
pub mod list;
pub mod plan;
pub mod sim;
pub mod tree;

use socforge_tools::{DryRunRunner, ProcessRunner, ToolRunner};

/// The process runner for a command: real, or logging only.
pub(crate) fn runner(dry_run: bool) -> Box<dyn ToolRunner> {
    if dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(ProcessRunner)
    }
}
