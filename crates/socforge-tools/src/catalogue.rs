//! The fixed set of known strategies.
//!
//! Strategies are a closed set: each [`Tool`] variant is one adapter, and
//! [`CATALOGUE`] is the static table the CLI selects from by name.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use socforge_registry::BuildPlan;

use crate::error::{Result, ToolError};
use crate::runner::Invocation;
use crate::{simulators, synthesis};

/// Whether a strategy produces a bitstream or a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Simulator,
    Backend,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Simulator => f.pad("simulator"),
            StrategyKind::Backend => f.pad("backend"),
        }
    }
}

/// Tool adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Icarus,
    Verilator,
    Modelsim,
    Quartus,
    Yosys,
}

/// Static description of one strategy.
#[derive(Debug)]
pub struct StrategyInfo {
    pub name: &'static str,
    pub tool: Tool,
    pub kind: StrategyKind,
    /// Parameters that must be present in the plan.
    pub required: &'static [&'static str],
    pub description: &'static str,
}

pub static CATALOGUE: &[StrategyInfo] = &[
    StrategyInfo {
        name: "icarus",
        tool: Tool::Icarus,
        kind: StrategyKind::Simulator,
        required: &["toplevel"],
        description: "Icarus Verilog (iverilog + vvp)",
    },
    StrategyInfo {
        name: "verilator",
        tool: Tool::Verilator,
        kind: StrategyKind::Simulator,
        required: &["toplevel"],
        description: "Verilator compiled simulation",
    },
    StrategyInfo {
        name: "modelsim",
        tool: Tool::Modelsim,
        kind: StrategyKind::Simulator,
        required: &["toplevel"],
        description: "ModelSim / Questa (vlog, vcom, vsim)",
    },
    StrategyInfo {
        name: "quartus",
        tool: Tool::Quartus,
        kind: StrategyKind::Backend,
        required: &["toplevel", "family", "device"],
        description: "Intel Quartus Prime project flow",
    },
    StrategyInfo {
        name: "yosys",
        tool: Tool::Yosys,
        kind: StrategyKind::Backend,
        required: &["toplevel"],
        description: "Yosys synthesis to a JSON netlist",
    },
];

/// Look up a strategy by name.
pub fn lookup(name: &str) -> Result<&'static StrategyInfo> {
    CATALOGUE
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| ToolError::UnknownStrategy {
            name: name.to_string(),
        })
}

/// Names of all strategies of `kind`, in catalogue order.
pub fn names(kind: StrategyKind) -> impl Iterator<Item = &'static str> {
    CATALOGUE
        .iter()
        .filter(move |s| s.kind == kind)
        .map(|s| s.name)
}

/// The plan's `toplevel` parameter. Presence is checked by `configure`.
pub(crate) fn toplevel(plan: &BuildPlan) -> String {
    plan.parameter("toplevel")
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// Whitespace-separated `<strategy>_options` from the plan, if set.
pub(crate) fn extra_options(plan: &BuildPlan, strategy: &str) -> Vec<String> {
    plan.parameter(&format!("{strategy}_options"))
        .map(|v| v.to_string().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

impl Tool {
    /// Write any project files the tool needs into `work_dir`.
    pub(crate) fn prepare(self, plan: &BuildPlan, work_dir: &Path) -> Result<()> {
        match self {
            Tool::Icarus | Tool::Verilator | Tool::Modelsim => Ok(()),
            Tool::Quartus => synthesis::quartus::prepare(plan, work_dir),
            Tool::Yosys => synthesis::yosys::prepare(plan, work_dir),
        }
    }

    /// Invocations that build the plan, in order.
    pub(crate) fn build_steps(self, plan: &BuildPlan, work_dir: &Path) -> Vec<Invocation> {
        match self {
            Tool::Icarus => simulators::icarus::build_steps(plan, work_dir),
            Tool::Verilator => simulators::verilator::build_steps(plan, work_dir),
            Tool::Modelsim => simulators::modelsim::build_steps(plan, work_dir),
            Tool::Quartus => synthesis::quartus::build_steps(plan, work_dir),
            Tool::Yosys => synthesis::yosys::build_steps(plan, work_dir),
        }
    }

    /// The invocation that runs a built simulation; `None` for backends.
    pub(crate) fn run_step(
        self,
        plan: &BuildPlan,
        work_dir: &Path,
        extra_args: &[String],
    ) -> Option<Invocation> {
        match self {
            Tool::Icarus => Some(simulators::icarus::run_step(plan, work_dir, extra_args)),
            Tool::Verilator => Some(simulators::verilator::run_step(plan, work_dir, extra_args)),
            Tool::Modelsim => Some(simulators::modelsim::run_step(plan, work_dir, extra_args)),
            Tool::Quartus | Tool::Yosys => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_strategies() {
        assert_eq!(lookup("icarus").unwrap().tool, Tool::Icarus);
        assert_eq!(lookup("quartus").unwrap().kind, StrategyKind::Backend);
    }

    #[test]
    fn lookup_unknown_strategy() {
        assert!(matches!(
            lookup("vivado"),
            Err(ToolError::UnknownStrategy { ref name }) if name == "vivado"
        ));
    }

    #[test]
    fn names_by_kind() {
        let sims: Vec<_> = names(StrategyKind::Simulator).collect();
        assert_eq!(sims, vec!["icarus", "verilator", "modelsim"]);
        let backends: Vec<_> = names(StrategyKind::Backend).collect();
        assert_eq!(backends, vec!["quartus", "yosys"]);
    }

    #[test]
    fn kind_display_respects_width() {
        assert_eq!(format!("{:<9}|", StrategyKind::Backend), "backend  |");
        assert_eq!(StrategyKind::Simulator.to_string(), "simulator");
    }

    #[test]
    fn options_are_split_on_whitespace() {
        let mut plan = crate::tests::plan_with(&[("a.v", "verilogSource")]);
        plan.parameters
            .insert("icarus_options".into(), "-Wall  -DSIM".into());
        assert_eq!(extra_options(&plan, "icarus"), vec!["-Wall", "-DSIM"]);
        assert!(extra_options(&plan, "verilator").is_empty());
        assert_eq!(toplevel(&plan), "top");
    }

    #[test]
    fn catalogue_names_are_unique() {
        let mut seen: Vec<_> = CATALOGUE.iter().map(|s| s.name).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), CATALOGUE.len());
    }
}
