//! Synthesis backend adapters.
//!
//! Backends write a project script into the work directory during
//! `configure` and drive the vendor tool from it.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, ToolError};

fn write_script(path: &Path, lines: &[String]) -> Result<()> {
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(path, body).map_err(|e| ToolError::WorkDir {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    debug!(script = %path.display(), "wrote project script");
    Ok(())
}

pub(crate) mod quartus {
    use std::path::{Path, PathBuf};

    use socforge_registry::BuildPlan;

    use super::write_script;
    use crate::catalogue::{extra_options, toplevel};
    use crate::error::Result;
    use crate::runner::Invocation;

    fn script(plan: &BuildPlan, work_dir: &Path) -> PathBuf {
        work_dir.join(format!("{}_project.tcl", plan.system))
    }

    fn assignment(name: &str, value: impl std::fmt::Display) -> String {
        format!("set_global_assignment -name {name} \"{value}\"")
    }

    pub(crate) fn project_script(plan: &BuildPlan) -> Vec<String> {
        let param = |name: &str| {
            plan.parameter(name)
                .map(|v| v.to_string())
                .unwrap_or_default()
        };

        let mut lines = vec![
            format!("project_new {} -overwrite", plan.system),
            assignment("FAMILY", param("family")),
            assignment("DEVICE", param("device")),
            assignment("TOP_LEVEL_ENTITY", toplevel(plan)),
        ];
        for dir in &plan.include_dirs {
            lines.push(assignment("SEARCH_PATH", dir.display()));
        }
        for file in &plan.files {
            let path = file.path.display();
            match file.file_type.as_str() {
                "verilogSource" => lines.push(assignment("VERILOG_FILE", path)),
                "systemVerilogSource" => lines.push(assignment("SYSTEMVERILOG_FILE", path)),
                "vhdlSource" => lines.push(assignment("VHDL_FILE", path)),
                "sdc" => lines.push(assignment("SDC_FILE", path)),
                "tclSource" => lines.push(format!("source \"{path}\"")),
                _ => {}
            }
        }
        lines.push("project_close".to_string());
        lines
    }

    pub(crate) fn prepare(plan: &BuildPlan, work_dir: &Path) -> Result<()> {
        write_script(&script(plan, work_dir), &project_script(plan))
    }

    pub(crate) fn build_steps(plan: &BuildPlan, work_dir: &Path) -> Vec<Invocation> {
        vec![
            Invocation::new("quartus_sh", work_dir)
                .arg("-t")
                .path_arg(&script(plan, work_dir)),
            Invocation::new("quartus_sh", work_dir)
                .args(["--flow", "compile"])
                .arg(plan.system.clone())
                .args(extra_options(plan, "quartus")),
        ]
    }
}

pub(crate) mod yosys {
    use std::path::{Path, PathBuf};

    use socforge_registry::BuildPlan;

    use super::write_script;
    use crate::catalogue::{extra_options, toplevel};
    use crate::error::Result;
    use crate::runner::Invocation;

    fn script(plan: &BuildPlan, work_dir: &Path) -> PathBuf {
        work_dir.join(format!("{}.ys", plan.system))
    }

    pub(crate) fn synthesis_script(plan: &BuildPlan) -> Vec<String> {
        let includes: String = plan
            .include_dirs
            .iter()
            .map(|d| format!(" -I{}", d.display()))
            .collect();

        let mut lines = Vec::new();
        for file in &plan.files {
            let flag = match file.file_type.as_str() {
                "verilogSource" => "",
                "systemVerilogSource" => " -sv",
                _ => continue,
            };
            lines.push(format!(
                "read_verilog{flag}{includes} {}",
                file.path.display()
            ));
        }
        lines.push(format!("synth -top {}", toplevel(plan)));
        lines.push(format!("write_json {}.json", plan.system));
        lines
    }

    pub(crate) fn prepare(plan: &BuildPlan, work_dir: &Path) -> Result<()> {
        write_script(&script(plan, work_dir), &synthesis_script(plan))
    }

    pub(crate) fn build_steps(plan: &BuildPlan, work_dir: &Path) -> Vec<Invocation> {
        vec![Invocation::new("yosys", work_dir)
            .arg("-q")
            .args(extra_options(plan, "yosys"))
            .arg("-s")
            .path_arg(&script(plan, work_dir))]
    }
}
