//! Strategy handles.
//!
//! A [`StrategyHandle`] drives one catalogue entry through
//! `configure → build → run` (or `finish`), rejecting out-of-order calls.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use socforge_registry::BuildPlan;
use tracing::{debug, info, warn};

use crate::catalogue::{self, StrategyInfo, StrategyKind};
use crate::error::{Result, ToolError};
use crate::runner::{ToolRunner, ToolStatus};

/// Lifecycle of a strategy handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    Uninitialized,
    Configured,
    Built,
    /// A simulation has been run.
    Ran,
    /// Build completed without a run.
    Done,
}

impl fmt::Display for StrategyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyState::Uninitialized => "uninitialized",
            StrategyState::Configured => "configured",
            StrategyState::Built => "built",
            StrategyState::Ran => "ran",
            StrategyState::Done => "done",
        };
        f.write_str(name)
    }
}

/// One strategy bound to a work directory and a runner.
#[derive(Debug)]
pub struct StrategyHandle {
    info: &'static StrategyInfo,
    state: StrategyState,
    plan: Option<BuildPlan>,
    work_dir: PathBuf,
    runner: Box<dyn ToolRunner>,
}

impl StrategyHandle {
    pub fn new(info: &'static StrategyInfo, work_dir: PathBuf, runner: Box<dyn ToolRunner>) -> Self {
        StrategyHandle {
            info,
            state: StrategyState::Uninitialized,
            plan: None,
            work_dir,
            runner,
        }
    }

    /// Select a strategy from the catalogue by name.
    pub fn select(name: &str, work_dir: PathBuf, runner: Box<dyn ToolRunner>) -> Result<Self> {
        Ok(Self::new(catalogue::lookup(name)?, work_dir, runner))
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn kind(&self) -> StrategyKind {
        self.info.kind
    }

    pub fn info(&self) -> &'static StrategyInfo {
        self.info
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn plan(&self) -> Option<&BuildPlan> {
        self.plan.as_ref()
    }

    /// True when the runner only logs invocations.
    pub fn is_dry_run(&self) -> bool {
        !self.runner.executes()
    }

    fn expect_state(&self, operation: &'static str, expected: StrategyState) -> Result<()> {
        if self.state != expected {
            return Err(ToolError::InvalidState {
                operation,
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn configured_plan(&self) -> Result<&BuildPlan> {
        self.plan.as_ref().ok_or(ToolError::InvalidState {
            operation: "build",
            expected: StrategyState::Configured,
            actual: self.state,
        })
    }

    /// Validate `plan`, create the work directory and write any project
    /// files.
    pub fn configure(&mut self, plan: BuildPlan) -> Result<()> {
        self.expect_state("configure", StrategyState::Uninitialized)?;

        if !plan.has_files() {
            return Err(ToolError::EmptyPlan {
                system: plan.system.clone(),
            });
        }
        for parameter in self.info.required {
            if plan.parameter(parameter).is_none() {
                return Err(ToolError::MissingParameter {
                    strategy: self.info.name.to_string(),
                    parameter: parameter.to_string(),
                });
            }
        }
        if let Some(planned) = plan.strategy.as_deref() {
            if planned != self.info.name {
                warn!(
                    planned,
                    strategy = self.info.name,
                    "plan was assembled for a different strategy"
                );
            }
        }

        fs::create_dir_all(&self.work_dir).map_err(|e| ToolError::WorkDir {
            path: self.work_dir.clone(),
            detail: e.to_string(),
        })?;
        self.info.tool.prepare(&plan, &self.work_dir)?;

        info!(
            strategy = self.info.name,
            system = %plan.system,
            work_dir = %self.work_dir.display(),
            "configured"
        );
        self.plan = Some(plan);
        self.state = StrategyState::Configured;
        Ok(())
    }

    /// Run the build invocations in order, stopping at the first failure.
    pub fn build(&mut self) -> Result<()> {
        self.expect_state("build", StrategyState::Configured)?;
        let plan = self.configured_plan()?;
        let steps = self.info.tool.build_steps(plan, &self.work_dir);

        for step in &steps {
            info!(strategy = self.info.name, "{}", step.program);
            let output = self.runner.capture(step)?;
            if !output.status.is_success() {
                return Err(ToolError::BuildFailed {
                    tool: step.program.clone(),
                    code: output.status.code,
                    signal: output.status.signal,
                    output: output.combined(),
                });
            }
            debug!(command = %step, "step finished");
        }

        self.state = StrategyState::Built;
        Ok(())
    }

    /// Run the built simulation with `extra_args` appended verbatim and
    /// return how it exited.
    pub fn run(&mut self, extra_args: &[String]) -> Result<ToolStatus> {
        if self.info.kind != StrategyKind::Simulator {
            return Err(ToolError::NotASimulator {
                name: self.info.name.to_string(),
            });
        }
        self.expect_state("run", StrategyState::Built)?;
        let plan = self.configured_plan()?;
        let invocation = self
            .info
            .tool
            .run_step(plan, &self.work_dir, extra_args)
            .ok_or_else(|| ToolError::NotASimulator {
                name: self.info.name.to_string(),
            })?;

        info!(strategy = self.info.name, "running simulation");
        let status = self.runner.stream(&invocation)?;
        if !status.is_success() {
            warn!(
                strategy = self.info.name,
                "simulation {}",
                crate::error::describe_exit(status.code, status.signal)
            );
        }
        self.state = StrategyState::Ran;
        Ok(status)
    }

    /// Complete a build without running anything.
    pub fn finish(&mut self) -> Result<()> {
        self.expect_state("finish", StrategyState::Built)?;
        self.state = StrategyState::Done;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{plan_with, RecordingRunner};

    fn handle(name: &str, runner: RecordingRunner, work_dir: &Path) -> StrategyHandle {
        StrategyHandle::select(name, work_dir.join(name), Box::new(runner)).unwrap()
    }

    #[test]
    fn full_simulation_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::default();
        let log = runner.log();
        let mut sim = handle("icarus", runner, dir.path());

        assert_eq!(sim.state(), StrategyState::Uninitialized);
        sim.configure(plan_with(&[("/src/a.v", "verilogSource")])).unwrap();
        assert_eq!(sim.state(), StrategyState::Configured);
        assert!(sim.work_dir().is_dir());

        sim.build().unwrap();
        assert_eq!(sim.state(), StrategyState::Built);

        let status = sim.run(&["+trace".to_string()]).unwrap();
        assert!(status.is_success());
        assert_eq!(sim.state(), StrategyState::Ran);

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].program, "iverilog");
        assert_eq!(log[1].program, "vvp");
        assert_eq!(log[1].args.last().map(String::as_str), Some("+trace"));
    }

    #[test]
    fn build_before_configure_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::default();
        let log = runner.log();
        let mut sim = handle("icarus", runner, dir.path());

        let err = sim.build().unwrap_err();
        assert!(matches!(
            err,
            ToolError::InvalidState {
                operation: "build",
                expected: StrategyState::Configured,
                actual: StrategyState::Uninitialized,
            }
        ));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn run_before_build_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = handle("verilator", RecordingRunner::default(), dir.path());
        sim.configure(plan_with(&[("/src/a.v", "verilogSource")])).unwrap();

        assert!(matches!(
            sim.run(&[]),
            Err(ToolError::InvalidState {
                operation: "run",
                actual: StrategyState::Configured,
                ..
            })
        ));
    }

    #[test]
    fn configure_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = handle("icarus", RecordingRunner::default(), dir.path());
        sim.configure(plan_with(&[("/src/a.v", "verilogSource")])).unwrap();
        assert!(matches!(
            sim.configure(plan_with(&[("/src/a.v", "verilogSource")])),
            Err(ToolError::InvalidState { operation: "configure", .. })
        ));
    }

    #[test]
    fn missing_required_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let mut bld = handle("quartus", RecordingRunner::default(), dir.path());
        let mut plan = plan_with(&[("/src/a.v", "verilogSource")]);
        plan.parameters.insert("family".into(), "Cyclone V".into());

        let err = bld.configure(plan).unwrap_err();
        assert!(matches!(
            err,
            ToolError::MissingParameter { ref strategy, ref parameter }
                if strategy == "quartus" && parameter == "device"
        ));
        assert_eq!(bld.state(), StrategyState::Uninitialized);
    }

    #[test]
    fn empty_plan_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = handle("icarus", RecordingRunner::default(), dir.path());
        let err = sim.configure(plan_with(&[])).unwrap_err();
        assert!(matches!(err, ToolError::EmptyPlan { ref system } if system == "soc"));
    }

    #[test]
    fn build_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::failing_at(1, ToolStatus::exited(2), "vlog: syntax error");
        let log = runner.log();
        let mut sim = handle("modelsim", runner, dir.path());
        sim.configure(plan_with(&[
            ("/src/a.v", "verilogSource"),
            ("/src/b.vhd", "vhdlSource"),
        ]))
        .unwrap();

        let err = sim.build().unwrap_err();
        match err {
            ToolError::BuildFailed {
                ref tool,
                code,
                ref output,
                ..
            } => {
                assert_eq!(tool, "vlog");
                assert_eq!(code, Some(2));
                assert!(output.contains("syntax error"));
            }
            ref other => panic!("expected build failure, got {other}"),
        }
        assert_eq!(sim.state(), StrategyState::Configured);
        // vcom never ran
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn backend_cannot_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut bld = handle("yosys", RecordingRunner::default(), dir.path());
        bld.configure(plan_with(&[("/src/a.v", "verilogSource")])).unwrap();
        bld.build().unwrap();

        assert!(matches!(bld.run(&[]), Err(ToolError::NotASimulator { .. })));
        bld.finish().unwrap();
        assert_eq!(bld.state(), StrategyState::Done);
        assert!(dir.path().join("yosys").join("soc.ys").is_file());
    }

    #[test]
    fn finish_requires_a_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = handle("icarus", RecordingRunner::default(), dir.path());
        assert!(matches!(
            sim.finish(),
            Err(ToolError::InvalidState { operation: "finish", .. })
        ));
    }

    #[test]
    fn simulation_exit_status_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::failing_at(1, ToolStatus::exited(3), "");
        let mut sim = handle("icarus", runner, dir.path());
        sim.configure(plan_with(&[("/src/a.v", "verilogSource")])).unwrap();
        sim.build().unwrap();

        let status = sim.run(&[]).unwrap();
        assert_eq!(status, ToolStatus::exited(3));
        assert_eq!(sim.state(), StrategyState::Ran);
    }

    #[test]
    fn state_names() {
        assert_eq!(StrategyState::Uninitialized.to_string(), "uninitialized");
        assert_eq!(StrategyState::Ran.to_string(), "ran");
    }
}
