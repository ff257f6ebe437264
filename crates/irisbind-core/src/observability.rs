//! Observability: tracing init.
//!
//! Uses config::ObservabilityConfig for IRISBIND_QUIET, IRISBIND_LOG_LEVEL, IRISBIND_LOG_JSON.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing. Call at process startup.
/// When IRISBIND_QUIET=1 only WARN and above are logged. `RUST_LOG` overrides everything.
pub fn init_tracing() {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level: String = if cfg.quiet {
        "irisbind=warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    // Logs go to stderr so `status --json` keeps stdout clean.
    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}

/// Quiet mode: suppress informational user output (not errors).
pub fn is_quiet() -> bool {
    crate::config::ObservabilityConfig::from_env().quiet
}
