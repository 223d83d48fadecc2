//! `socforge build`: run a synthesis backend for a system.

use anyhow::Result;
use socforge_registry::Library;
use socforge_tools::{build_system, resolve_and_select_strategy, StrategyKind};

use crate::config::Workspace;

/// Build `system` with its declared backend, or with `backend` when given.
pub fn run(ws: &Workspace, system: &str, backend: Option<&str>, dry_run: bool) -> Result<()> {
    let library = ws.library()?;
    build(ws, &library, system, backend, dry_run)
}

pub(crate) fn build(
    ws: &Workspace,
    library: &Library,
    system: &str,
    backend: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let (plan, mut handle) = resolve_and_select_strategy(
        library,
        system,
        backend,
        StrategyKind::Backend,
        &ws.build_dir(),
        super::runner(dry_run),
    )?;

    println!(
        "Building {system} with {} ({} cores, {} files)",
        handle.name(),
        plan.cores.len(),
        plan.files.len()
    );
    build_system(library, &mut handle, plan)?;
    println!("Finished {system}: {}", handle.work_dir().display());
    Ok(())
}
