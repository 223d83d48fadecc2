//! `socforge tree`: show a system's dependency tree.

use anyhow::Result;
use socforge_registry::{format_tree, Library};

/// Render the resolved dependency tree of `system`.
pub fn render(library: &Library, system: &str) -> Result<String> {
    let descriptor = library.load_system(system)?;
    let build_set = library.resolve(&descriptor)?;
    Ok(format_tree(
        &descriptor.id,
        &descriptor.dependencies,
        &build_set,
    ))
}

pub fn run(library: &Library, system: &str) -> Result<()> {
    print!("{}", render(library, system)?);
    Ok(())
}
