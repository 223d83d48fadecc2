//! `socforge plan`: show the assembled build plan without running a tool.

use anyhow::{Context, Result};
use socforge_registry::{BuildPlan, Library};

/// Assemble the plan for `system`. Without `strategy` the system's
/// declared backend is used.
pub fn assemble(library: &Library, system: &str, strategy: Option<&str>) -> Result<BuildPlan> {
    match strategy {
        Some(name) => {
            socforge_tools::lookup(name)?;
            let descriptor = library.load_system(system)?;
            Ok(library.plan_for(&descriptor, Some(name))?)
        }
        None => Ok(library.resolve_system(system)?),
    }
}

/// Human-readable rendering of a plan.
pub fn format_plan(plan: &BuildPlan) -> String {
    let mut out = format!("System:   {}\n", plan.system);
    out.push_str(&format!(
        "Strategy: {}\n",
        plan.strategy.as_deref().unwrap_or("(none)")
    ));

    out.push_str("\nCores (build order):\n");
    for (i, core) in plan.cores.iter().enumerate() {
        out.push_str(&format!("  {}. {core}\n", i + 1));
    }

    out.push_str("\nFiles:\n");
    for file in &plan.files {
        out.push_str(&format!(
            "  {} [{}] ({})\n",
            file.path.display(),
            file.file_type,
            file.core
        ));
    }

    if !plan.include_dirs.is_empty() {
        out.push_str("\nInclude directories:\n");
        for dir in &plan.include_dirs {
            out.push_str(&format!("  {}\n", dir.display()));
        }
    }

    out.push_str("\nParameters:\n");
    for (name, value) in &plan.parameters {
        let origin = plan.origins.get(name).map(String::as_str).unwrap_or("?");
        out.push_str(&format!("  {name} = {value} ({origin})\n"));
    }
    out
}

pub fn run(library: &Library, system: &str, strategy: Option<&str>, json: bool) -> Result<()> {
    let plan = assemble(library, system, strategy)?;
    if json {
        let rendered = serde_json::to_string_pretty(&plan).context("serializing build plan")?;
        println!("{rendered}");
    } else {
        print!("{}", format_plan(&plan));
    }
    Ok(())
}
