//! End-to-end flows: pick a strategy for a system, plan, build, run.

use std::path::Path;

use socforge_registry::{BuildPlan, Library, SystemDescriptor};
use tracing::{debug, info};

use crate::catalogue::{self, StrategyKind};
use crate::error::{Result, ToolError};
use crate::runner::{ToolRunner, ToolStatus};
use crate::strategy::StrategyHandle;

/// Choose the strategy name for `system`: an explicit override wins, then
/// the first preferred simulator (simulation) or the declared backend
/// (build).
pub fn select_strategy_name(
    system: &SystemDescriptor,
    kind: StrategyKind,
    requested: Option<&str>,
) -> Result<String> {
    if let Some(name) = requested {
        return Ok(name.to_string());
    }
    let declared = match kind {
        StrategyKind::Simulator => system.simulators.first().map(String::as_str),
        StrategyKind::Backend => system.backend_name(),
    };
    declared
        .map(str::to_string)
        .ok_or_else(|| ToolError::NoStrategy {
            system: system.id.clone(),
            kind,
        })
}

/// Load `system_id`, select its strategy of `kind`, and assemble the plan
/// for that strategy.
///
/// The handle works in `<work_root>/<system>/<sim|bld>-<strategy>`.
pub fn resolve_and_select_strategy(
    library: &Library,
    system_id: &str,
    requested: Option<&str>,
    kind: StrategyKind,
    work_root: &Path,
    runner: Box<dyn ToolRunner>,
) -> Result<(BuildPlan, StrategyHandle)> {
    let system = library.load_system(system_id)?;
    let name = select_strategy_name(&system, kind, requested)?;
    let info = catalogue::lookup(&name)?;
    if info.kind != kind {
        return Err(ToolError::KindMismatch {
            name,
            expected: kind,
            actual: info.kind,
        });
    }

    let plan = library.plan_for(&system, Some(info.name))?;
    let prefix = match kind {
        StrategyKind::Simulator => "sim",
        StrategyKind::Backend => "bld",
    };
    let work_dir = work_root
        .join(&system.id)
        .join(format!("{prefix}-{}", info.name));
    debug!(system = system_id, strategy = info.name, work_dir = %work_dir.display(), "selected strategy");

    Ok((plan, StrategyHandle::new(info, work_dir, runner)))
}

fn configure_and_build(
    library: &Library,
    handle: &mut StrategyHandle,
    plan: BuildPlan,
) -> Result<()> {
    let cores = plan.cores.clone();
    handle.configure(plan)?;
    handle.build()?;

    if handle.is_dry_run() {
        return Ok(());
    }
    for id in &cores {
        library.cores().stamp(id)?;
    }
    info!(cores = cores.len(), "stamped build artifacts");
    Ok(())
}

/// Configure and build `plan`, stamp its cores, and finish the handle.
pub fn build_system(library: &Library, handle: &mut StrategyHandle, plan: BuildPlan) -> Result<()> {
    configure_and_build(library, handle, plan)?;
    handle.finish()
}

/// Build `plan` with a simulator and run it. With `build_only` the handle
/// is finished instead and `None` is returned.
pub fn simulate(
    library: &Library,
    handle: &mut StrategyHandle,
    plan: BuildPlan,
    extra_args: &[String],
    build_only: bool,
) -> Result<Option<ToolStatus>> {
    if handle.kind() != StrategyKind::Simulator {
        return Err(ToolError::NotASimulator {
            name: handle.name().to_string(),
        });
    }
    configure_and_build(library, handle, plan)?;
    if build_only {
        handle.finish()?;
        return Ok(None);
    }
    handle.run(extra_args).map(Some)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use socforge_registry::{ArtifactCache, CacheStatus, CoreRegistry};

    use super::*;
    use crate::strategy::StrategyState;
    use crate::tests::RecordingRunner;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn library(dir: &Path) -> Library {
        write(dir, "cpu.v", "module cpu; endmodule\n");
        write(dir, "bus.v", "module bus; endmodule\n");
        let cores = BTreeMap::from([
            (
                "cpu".to_string(),
                write(
                    dir,
                    "cpu.core",
                    "[core]\nname = \"cpu\"\ndepends = [\"bus\"]\n[[files]]\npath = \"cpu.v\"\n\
                     [parameters]\ntoplevel = \"cpu\"\n",
                ),
            ),
            (
                "bus".to_string(),
                write(dir, "bus.core", "[core]\nname = \"bus\"\n[[files]]\npath = \"bus.v\"\n"),
            ),
        ]);
        let systems = BTreeMap::from([
            (
                "soc".to_string(),
                write(
                    dir,
                    "soc.system",
                    "[system]\nname = \"soc\"\ndepends = [\"cpu\"]\nsimulators = [\"verilator\", \"icarus\"]\n\
                     [backend]\nname = \"yosys\"\n",
                ),
            ),
            (
                "bare".to_string(),
                write(dir, "bare.system", "[system]\nname = \"bare\"\ndepends = [\"bus\"]\n"),
            ),
        ]);
        let cache = ArtifactCache::new(dir.join("cache"));
        Library::new(CoreRegistry::new(cores, Some(cache)), systems)
    }

    #[test]
    fn simulator_defaults_to_first_preference() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let (plan, handle) = resolve_and_select_strategy(
            &lib,
            "soc",
            None,
            StrategyKind::Simulator,
            &dir.path().join("build"),
            Box::new(RecordingRunner::default()),
        )
        .unwrap();

        assert_eq!(handle.name(), "verilator");
        assert_eq!(plan.strategy.as_deref(), Some("verilator"));
        assert_eq!(plan.cores, vec!["bus", "cpu"]);
        assert_eq!(handle.work_dir(), dir.path().join("build/soc/sim-verilator"));
    }

    #[test]
    fn explicit_strategy_overrides_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let (_, handle) = resolve_and_select_strategy(
            &lib,
            "soc",
            Some("icarus"),
            StrategyKind::Simulator,
            dir.path(),
            Box::new(RecordingRunner::default()),
        )
        .unwrap();
        assert_eq!(handle.name(), "icarus");
    }

    #[test]
    fn backend_defaults_to_declared_backend() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let (_, handle) = resolve_and_select_strategy(
            &lib,
            "soc",
            None,
            StrategyKind::Backend,
            dir.path(),
            Box::new(RecordingRunner::default()),
        )
        .unwrap();
        assert_eq!(handle.name(), "yosys");
        assert_eq!(handle.work_dir(), dir.path().join("soc/bld-yosys"));
    }

    #[test]
    fn no_declared_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let err = resolve_and_select_strategy(
            &lib,
            "bare",
            None,
            StrategyKind::Backend,
            dir.path(),
            Box::new(RecordingRunner::default()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ToolError::NoStrategy { ref system, kind: StrategyKind::Backend } if system == "bare"
        ));
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn kind_mismatch_and_unknown_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let mismatch = resolve_and_select_strategy(
            &lib,
            "soc",
            Some("quartus"),
            StrategyKind::Simulator,
            dir.path(),
            Box::new(RecordingRunner::default()),
        )
        .unwrap_err();
        assert!(matches!(mismatch, ToolError::KindMismatch { .. }));

        let unknown = resolve_and_select_strategy(
            &lib,
            "soc",
            Some("vivado"),
            StrategyKind::Backend,
            dir.path(),
            Box::new(RecordingRunner::default()),
        )
        .unwrap_err();
        assert!(matches!(unknown, ToolError::UnknownStrategy { .. }));
    }

    #[test]
    fn unknown_system_keeps_registry_error() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let err = resolve_and_select_strategy(
            &lib,
            "missing",
            None,
            StrategyKind::Simulator,
            dir.path(),
            Box::new(RecordingRunner::default()),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn simulate_builds_runs_and_stamps() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let runner = RecordingRunner::default();
        let log = runner.log();
        let (plan, mut handle) = resolve_and_select_strategy(
            &lib,
            "soc",
            Some("icarus"),
            StrategyKind::Simulator,
            &dir.path().join("build"),
            Box::new(runner),
        )
        .unwrap();

        assert_eq!(lib.cores().cache_status("cpu"), CacheStatus::Missing);
        let status = simulate(&lib, &mut handle, plan, &["+n=1".to_string()], false).unwrap();
        assert_eq!(status, Some(ToolStatus::success()));
        assert_eq!(handle.state(), StrategyState::Ran);
        assert_eq!(lib.cores().cache_status("cpu"), CacheStatus::Fresh);
        assert_eq!(lib.cores().cache_status("bus"), CacheStatus::Fresh);

        let programs: Vec<_> = log.borrow().iter().map(|i| i.program.clone()).collect();
        assert_eq!(programs, vec!["iverilog", "vvp"]);
    }

    #[test]
    fn build_only_simulation_finishes_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let runner = RecordingRunner::default();
        let log = runner.log();
        let (plan, mut handle) = resolve_and_select_strategy(
            &lib,
            "soc",
            Some("icarus"),
            StrategyKind::Simulator,
            dir.path(),
            Box::new(runner),
        )
        .unwrap();

        assert_eq!(simulate(&lib, &mut handle, plan, &[], true).unwrap(), None);
        assert_eq!(handle.state(), StrategyState::Done);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn failed_build_leaves_cache_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let runner = RecordingRunner::failing_at(0, ToolStatus::exited(1), "bad");
        let (plan, mut handle) = resolve_and_select_strategy(
            &lib,
            "soc",
            None,
            StrategyKind::Backend,
            dir.path(),
            Box::new(runner),
        )
        .unwrap();

        // yosys needs toplevel; cpu provides it
        let err = build_system(&lib, &mut handle, plan).unwrap_err();
        assert_eq!(err.exit_code(), 9);
        assert_eq!(lib.cores().cache_status("cpu"), CacheStatus::Missing);
    }

    #[test]
    fn dry_run_build_skips_stamping() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let (plan, mut handle) = resolve_and_select_strategy(
            &lib,
            "soc",
            None,
            StrategyKind::Backend,
            dir.path(),
            Box::new(crate::runner::DryRunRunner),
        )
        .unwrap();

        build_system(&lib, &mut handle, plan).unwrap();
        assert_eq!(handle.state(), StrategyState::Done);
        assert_eq!(lib.cores().cache_status("bus"), CacheStatus::Missing);
    }

    #[test]
    fn simulate_rejects_backends() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        let (plan, mut handle) = resolve_and_select_strategy(
            &lib,
            "soc",
            None,
            StrategyKind::Backend,
            dir.path(),
            Box::new(RecordingRunner::default()),
        )
        .unwrap();
        assert!(matches!(
            simulate(&lib, &mut handle, plan, &[], false),
            Err(ToolError::NotASimulator { .. })
        ));
    }
}
