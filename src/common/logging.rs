//! Logging and tracing configuration
//!
//! All diagnostics go to stderr; stdout is reserved for the summary or the
//! JSON report.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "vtycheck=debug,info"
    } else {
        "warn"
    }
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable, falling back
/// to warnings only, or info and crate debug output with `--verbose`.
pub fn init_cli(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
