//! `socforge init`: installation scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::{SocforgeConfig, CONFIG_FILE};

/// Create `socforge.toml` plus empty `cores/` and `systems/` in `dir`.
pub fn run(dir: &Path) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    fs::create_dir_all(dir.join("cores")).context("creating cores/ directory")?;
    fs::create_dir_all(dir.join("systems")).context("creating systems/ directory")?;
    fs::write(&config_path, SocforgeConfig::template())
        .with_context(|| format!("writing {}", config_path.display()))?;

    let gitignore = dir.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, "build/\n.socforge/\n").context("writing .gitignore")?;
    }

    println!("Initialized socforge in {}", dir.display());
    println!("  {CONFIG_FILE}");
    println!("  cores/");
    println!("  systems/");
    Ok(())
}
