//! Simulator and synthesis strategies for socforge build plans.
//!
//! A strategy takes a [`BuildPlan`](socforge_registry::BuildPlan) and drives
//! one external tool through `configure → build → run`:
//!
//! - **Catalogue**: the fixed set of known simulators and backends
//! - **Runner**: the process seam, real or dry-run
//! - **Flow**: strategy selection, build, cache stamping and simulation

pub mod catalogue;
pub mod error;
pub mod flow;
pub mod runner;
mod simulators;
pub mod strategy;
mod synthesis;

pub use catalogue::{lookup, StrategyInfo, StrategyKind, Tool, CATALOGUE};
pub use error::{Result, ToolError};
pub use flow::{build_system, resolve_and_select_strategy, select_strategy_name, simulate};
pub use runner::{DryRunRunner, Invocation, ProcessRunner, ToolOutput, ToolRunner, ToolStatus};
pub use strategy::{StrategyHandle, StrategyState};
