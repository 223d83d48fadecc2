//! `socforge sim`: build and run a simulation.

use anyhow::Result;
use socforge_registry::Library;
use socforge_tools::{resolve_and_select_strategy, simulate, StrategyKind, ToolStatus};

use crate::config::Workspace;

/// Options for one simulation run.
#[derive(Debug, Default)]
pub struct SimOptions<'a> {
    /// Simulator to use instead of the system's first preference.
    pub simulator: Option<&'a str>,
    pub build_only: bool,
    pub dry_run: bool,
    /// Passed verbatim to the simulation.
    pub args: &'a [String],
}

/// Build and run `system`. Returns the simulation's exit status, or `None`
/// for build-only runs.
pub fn run(ws: &Workspace, system: &str, opts: &SimOptions<'_>) -> Result<Option<ToolStatus>> {
    let library = ws.library()?;
    sim(ws, &library, system, opts)
}

pub(crate) fn sim(
    ws: &Workspace,
    library: &Library,
    system: &str,
    opts: &SimOptions<'_>,
) -> Result<Option<ToolStatus>> {
    let (plan, mut handle) = resolve_and_select_strategy(
        library,
        system,
        opts.simulator,
        StrategyKind::Simulator,
        &ws.build_dir(),
        super::runner(opts.dry_run),
    )?;

    println!("Simulating {system} with {}", handle.name());
    let status = simulate(library, &mut handle, plan, opts.args, opts.build_only)?;
    if status.is_none() {
        println!("Built {system}: {}", handle.work_dir().display());
    }
    Ok(status)
}

/// Process exit code for a finished simulation: its own code, or
/// `128 + signal` when it was killed.
pub fn exit_code(status: &ToolStatus) -> i32 {
    match (status.code, status.signal) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}
