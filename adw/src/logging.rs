//! Development-time tracing for debugging workflows.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not persisted, and never mixed into the step output echoed on stdout.
//!
//! - **Run logs (`io/log_store`)**: Product artifacts under the configured log
//!   directory. Always written, unaffected by `RUST_LOG` or `--verbose`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "adw=debug,warn" } else { "warn" }
}

/// Initialize the stderr tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output for
/// this crate.
///
/// # Example
/// ```bash
/// RUST_LOG=adw::pipeline=trace adw build "add dark mode"
/// ```
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
