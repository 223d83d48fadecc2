//! Logging setup for the CLI.

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter for a verbosity level: `-q` → warn, none → info,
/// `-v` → debug for socforge crates, `-vv` → trace.
pub fn default_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => "info",
        1 => "info,socforge=debug,socforge_registry=debug,socforge_tools=debug",
        _ => "trace",
    }
}

/// Initialize logging to stderr.
///
/// `RUST_LOG` overrides the filter chosen from the verbosity flags.
pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
