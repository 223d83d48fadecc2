//! Dependency tree display.
//!
//! Formats a system's resolved dependencies as an ASCII tree. A core
//! already expanded earlier in the tree is shown once more with `(*)` and
//! not expanded again:
//! ```text
//! de0_nano
//! ├── or1200 v1.0.0
//! │   └── wb_common
//! └── uart16550 v1.5.0
//!     └── wb_common (*)
//! ```

use std::collections::{BTreeSet, HashMap};

use crate::descriptor::CoreDescriptor;
use crate::resolution::BuildSet;

/// Format the dependency tree of `build_set`, rooted at `roots`.
pub fn format_tree(system: &str, roots: &[String], build_set: &BuildSet) -> String {
    let by_id: HashMap<&str, &CoreDescriptor> = build_set
        .cores
        .iter()
        .map(|c| (c.id(), c.descriptor.as_ref()))
        .collect();

    let mut out = format!("{system}\n");
    let mut expanded = BTreeSet::new();
    let mut shown = 0usize;

    for (i, root) in roots.iter().enumerate() {
        let is_last = i + 1 == roots.len();
        format_node(&mut out, root, &by_id, "", is_last, &mut expanded, &mut shown);
    }

    out.push_str(&format!(
        "\n{shown} dependencies ({} unique)\n",
        build_set.len()
    ));
    out
}

fn format_node<'a>(
    out: &mut String,
    id: &'a str,
    by_id: &HashMap<&'a str, &'a CoreDescriptor>,
    prefix: &str,
    is_last: bool,
    expanded: &mut BTreeSet<&'a str>,
    shown: &mut usize,
) {
    let connector = if is_last { "└── " } else { "├── " };
    let core = by_id.get(id).copied();
    let version = core
        .and_then(|c| c.version.as_ref())
        .map(|v| format!(" v{v}"))
        .unwrap_or_default();
    let repeated = !expanded.insert(id);
    let marker = if repeated { " (*)" } else { "" };

    *shown += 1;
    out.push_str(&format!("{prefix}{connector}{id}{version}{marker}\n"));

    let Some(core) = core else { return };
    if repeated {
        return;
    }

    let child_prefix = if is_last {
        format!("{prefix}    ")
    } else {
        format!("{prefix}│   ")
    };
    let count = core.dependencies.len();
    for (i, dep) in core.dependencies.iter().enumerate() {
        format_node(
            out,
            dep,
            by_id,
            &child_prefix,
            i + 1 == count,
            expanded,
            shown,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::resolve;
    use crate::resolution::tests::{registry_with, system};

    #[test]
    fn format_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_with(
            dir.path(),
            &[
                ("or1200", &["wb_common"]),
                ("uart16550", &["wb_common"]),
                ("wb_common", &[]),
            ],
        );
        let sys = system(&["or1200", "uart16550"]);
        let set = resolve(&sys, &reg).unwrap();

        let output = format_tree("de0_nano", &sys.dependencies, &set);
        assert!(output.starts_with("de0_nano\n"));
        assert!(output.contains("├── or1200\n"));
        assert!(output.contains("│   └── wb_common\n"));
        assert!(output.contains("└── uart16550\n"));
        assert!(output.contains("    └── wb_common (*)\n"));
        assert!(output.contains("4 dependencies (3 unique)"));
    }

    #[test]
    fn version_is_shown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uart.core");
        std::fs::write(&path, "[core]\nname = \"uart\"\nversion = \"1.5.0\"\n").unwrap();
        let reg = crate::registry::CoreRegistry::new(
            std::collections::BTreeMap::from([("uart".to_string(), path)]),
            None,
        );
        let sys = system(&["uart"]);
        let set = resolve(&sys, &reg).unwrap();

        let output = format_tree("sys", &sys.dependencies, &set);
        assert!(output.contains("└── uart v1.5.0\n"));
    }

    #[test]
    fn empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry_with(dir.path(), &[]);
        let sys = system(&[]);
        let set = resolve(&sys, &reg).unwrap();

        let output = format_tree("empty", &sys.dependencies, &set);
        assert!(output.contains("empty\n"));
        assert!(output.contains("0 dependencies (0 unique)"));
    }
}
