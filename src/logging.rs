//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`; stage progress and results go
//! to stdout through the driver. `RUST_LOG` wins over `--verbose` when set.

use tracing_subscriber::EnvFilter;

/// Map the CLI verbosity level onto a `tracing` filter directive.
pub fn level_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "off",
        1 => "error",
        2 => "warn",
        3 | 4 => "info",
        _ => "debug",
    }
}

/// Install the global fmt subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dnsdeps={}", level_directive(verbose))));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_directive(0), "off");
        assert_eq!(level_directive(1), "error");
        assert_eq!(level_directive(2), "warn");
        assert_eq!(level_directive(3), "info");
        assert_eq!(level_directive(5), "debug");
        assert_eq!(level_directive(9), "debug");
    }
}
