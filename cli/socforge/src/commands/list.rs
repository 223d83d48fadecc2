//! `socforge list-cores` and `socforge list-systems`.

use socforge_registry::Library;
use socforge_tools::catalogue::names;
use socforge_tools::{lookup, StrategyKind};

/// Table of every known core with its version and cache status. Cores
/// that fail to load are listed with the error instead.
pub fn format_cores(library: &Library) -> String {
    let registry = library.cores();
    let ids = registry.list_core_ids();
    if ids.is_empty() {
        return "No cores found\n".to_string();
    }

    let width = ids.iter().map(String::len).max().unwrap_or(0).max("Core".len());
    let mut out = format!("{:<width$}  {:<10}  Cache status\n", "Core", "Version");
    out.push_str(&format!("{}\n", "=".repeat(width + 26)));

    for id in &ids {
        match registry.get(id) {
            Ok(core) => {
                let version = core
                    .version
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string());
                out.push_str(&format!(
                    "{id:<width$}  {version:<10}  {}\n",
                    registry.cache_status(id)
                ));
            }
            Err(e) => out.push_str(&format!("{id:<width$}  error: {}\n", one_line(&e))),
        }
    }
    out
}

/// An error message folded onto a single table row.
fn one_line(err: &impl std::fmt::Display) -> String {
    err.to_string().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every known system, with its description when it loads.
pub fn format_systems(library: &Library) -> String {
    let ids = library.list_system_ids();
    if ids.is_empty() {
        return "No systems found\n".to_string();
    }

    let width = ids.iter().map(String::len).max().unwrap_or(0);
    let mut out = String::new();
    for id in &ids {
        match library.load_system(id) {
            Ok(system) => match system.description.as_deref() {
                Some(desc) => out.push_str(&format!("{id:<width$}  {desc}\n")),
                None => out.push_str(&format!("{id}\n")),
            },
            Err(e) => out.push_str(&format!("{id:<width$}  error: {}\n", one_line(&e))),
        }
    }
    out
}

/// Every strategy in the catalogue, simulators first.
pub fn format_strategies() -> String {
    let mut out = String::new();
    for kind in [StrategyKind::Simulator, StrategyKind::Backend] {
        for name in names(kind) {
            let description = lookup(name).map(|s| s.description).unwrap_or_default();
            out.push_str(&format!("{name:<10}  {kind:<9}  {description}\n"));
        }
    }
    out
}

pub fn cores(library: &Library) {
    println!("Available cores:");
    print!("{}", format_cores(library));
}

pub fn systems(library: &Library) {
    println!("Available systems:");
    print!("{}", format_systems(library));
}

pub fn strategies() {
    println!("Available strategies:");
    print!("{}", format_strategies());
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use socforge_registry::{ArtifactCache, CoreRegistry};

    use super::*;

    fn library(dir: &Path) -> Library {
        let write = |name: &str, body: &str| {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            path
        };
        let cores = BTreeMap::from([
            (
                "uart16550".to_string(),
                write("uart16550.core", "[core]\nname = \"uart16550\"\nversion = \"1.5.0\"\n"),
            ),
            ("broken".to_string(), write("broken.core", "[core\n")),
        ]);
        let systems = BTreeMap::from([(
            "de0_nano".to_string(),
            write(
                "de0_nano.system",
                "[system]\nname = \"de0_nano\"\ndescription = \"Terasic DE0 Nano\"\n",
            ),
        )]);
        Library::new(
            CoreRegistry::new(cores, Some(ArtifactCache::new(dir.join("cache")))),
            systems,
        )
    }

    #[test]
    fn cores_table_shows_version_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let out = format_cores(&library(dir.path()));
        let lines: Vec<_> = out.lines().collect();

        assert!(lines[0].starts_with("Core"));
        assert!(lines[2].starts_with("broken"));
        assert!(lines[2].contains("error:"));
        assert!(lines[3].starts_with("uart16550"));
        assert!(lines[3].contains("1.5.0"));
        assert!(lines[3].ends_with("missing"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn broken_core_error_fits_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let out = format_cores(&library(dir.path()));
        let row = out.lines().find(|l| l.starts_with("broken")).unwrap();
        assert!(row.contains("TOML parse error"));
        assert!(row.contains("invalid table header"));
    }

    #[test]
    fn strategies_list_simulators_then_backends() {
        let out = format_strategies();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("icarus"));
        assert!(lines[0].contains("simulator"));
        assert!(lines[0].ends_with("Icarus Verilog (iverilog + vvp)"));
        assert!(lines[3].starts_with("quartus"));
        assert!(lines[3].contains("backend"));
    }

    #[test]
    fn systems_show_description() {
        let dir = tempfile::tempdir().unwrap();
        let out = format_systems(&library(dir.path()));
        assert_eq!(out, "de0_nano  Terasic DE0 Nano\n");
    }

    #[test]
    fn empty_library() {
        let lib = Library::new(CoreRegistry::new(BTreeMap::new(), None), BTreeMap::new());
        assert_eq!(format_cores(&lib), "No cores found\n");
        assert_eq!(format_systems(&lib), "No systems found\n");
    }
}
