//! Simulator adapters.
//!
//! Each adapter turns a plan into compile invocations and one run
//! invocation. All commands run inside the strategy's work directory.

use socforge_registry::{BuildPlan, PlanFile};

const VERILOG: &[&str] = &["verilogSource", "systemVerilogSource"];
const VHDL: &[&str] = &["vhdlSource"];

fn paths<'a>(files: impl Iterator<Item = &'a PlanFile>) -> Vec<String> {
    files.map(|f| f.path.display().to_string()).collect()
}

pub(crate) mod icarus {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::catalogue::{extra_options, toplevel};
    use crate::runner::Invocation;

    fn image(plan: &BuildPlan, work_dir: &Path) -> PathBuf {
        work_dir.join(format!("{}.vvp", plan.system))
    }

    pub(crate) fn build_steps(plan: &BuildPlan, work_dir: &Path) -> Vec<Invocation> {
        let mut compile = Invocation::new("iverilog", work_dir)
            .arg("-s")
            .arg(toplevel(plan))
            .arg("-o")
            .path_arg(&image(plan, work_dir));
        if plan.files_of_type(&["systemVerilogSource"]).next().is_some() {
            compile = compile.arg("-g2012");
        }
        let compile = compile
            .args(plan.include_dirs.iter().map(|d| format!("-I{}", d.display())))
            .args(extra_options(plan, "icarus"))
            .args(paths(plan.files_of_type(VERILOG)));
        vec![compile]
    }

    pub(crate) fn run_step(plan: &BuildPlan, work_dir: &Path, extra_args: &[String]) -> Invocation {
        Invocation::new("vvp", work_dir)
            .arg("-n")
            .path_arg(&image(plan, work_dir))
            .args(extra_args.iter().cloned())
    }
}

pub(crate) mod verilator {
    use std::path::Path;

    use super::*;
    use crate::catalogue::{extra_options, toplevel};
    use crate::runner::Invocation;

    const OBJ_DIR: &str = "obj_dir";

    pub(crate) fn build_steps(plan: &BuildPlan, work_dir: &Path) -> Vec<Invocation> {
        let compile = Invocation::new("verilator", work_dir)
            .arg("--binary")
            .arg("--top-module")
            .arg(toplevel(plan))
            .arg("--Mdir")
            .arg(OBJ_DIR)
            .args(plan.include_dirs.iter().map(|d| format!("-I{}", d.display())))
            .args(extra_options(plan, "verilator"))
            .args(paths(plan.files_of_type(VERILOG)))
            .args(paths(plan.files_of_type(&["cppSource", "cSource"])));
        vec![compile]
    }

    pub(crate) fn run_step(plan: &BuildPlan, work_dir: &Path, extra_args: &[String]) -> Invocation {
        let binary = work_dir
            .join(OBJ_DIR)
            .join(format!("V{}", toplevel(plan)));
        Invocation::new(binary.display().to_string(), work_dir).args(extra_args.iter().cloned())
    }
}

pub(crate) mod modelsim {
    use std::path::Path;

    use super::*;
    use crate::catalogue::{extra_options, toplevel};
    use crate::runner::Invocation;

    const LIBRARY: &str = "work";

    pub(crate) fn build_steps(plan: &BuildPlan, work_dir: &Path) -> Vec<Invocation> {
        let mut steps = vec![Invocation::new("vlib", work_dir).arg(LIBRARY)];

        let verilog = paths(plan.files_of_type(VERILOG));
        if !verilog.is_empty() {
            steps.push(
                Invocation::new("vlog", work_dir)
                    .args(["-quiet", "-work", LIBRARY])
                    .args(
                        plan.include_dirs
                            .iter()
                            .map(|d| format!("+incdir+{}", d.display())),
                    )
                    .args(extra_options(plan, "modelsim"))
                    .args(verilog),
            );
        }

        let vhdl = paths(plan.files_of_type(VHDL));
        if !vhdl.is_empty() {
            steps.push(
                Invocation::new("vcom", work_dir)
                    .args(["-quiet", "-work", LIBRARY])
                    .args(vhdl),
            );
        }
        steps
    }

    pub(crate) fn run_step(plan: &BuildPlan, work_dir: &Path, extra_args: &[String]) -> Invocation {
        Invocation::new("vsim", work_dir)
            .args(["-c", "-do", "run -all; quit -f"])
            .arg(format!("{LIBRARY}.{}", toplevel(plan)))
            .args(extra_args.iter().cloned())
    }
}
