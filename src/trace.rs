//! Logging setup on top of the `tracing` crate.

use std::sync::Once;

use tracing_subscriber::Layer;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installing a global subscriber twice panics, which happens easily in tests.
static INIT_TRACING_ONCE: Once = Once::new();

/// Environment variable holding an `EnvFilter` directive, e.g. `callgrapher=trace`.
pub const LOG_ENV_VAR: &str = "CALLGRAPHER_LOG";

/// Sends log output to stderr so stdout stays free for the call graph.
///
/// Without `CALLGRAPHER_LOG` the level is `info`, `debug` when `verbose` is
/// set and `error` when `quiet` is set.
pub fn init_tracing(verbose: bool, quiet: bool) {
    INIT_TRACING_ONCE.call_once(|| {
        let mut env_filter = EnvFilter::from_env(LOG_ENV_VAR);
        if std::env::var_os(LOG_ENV_VAR).is_none() {
            let level = if verbose {
                LevelFilter::DEBUG
            } else if quiet {
                LevelFilter::ERROR
            } else {
                LevelFilter::INFO
            };
            env_filter = env_filter.add_directive(level.into());
        }

        let layer = tracing_subscriber::fmt::layer()
            .with_line_number(false)
            .with_file(false)
            .without_time()
            .with_writer(std::io::stderr)
            .with_target(false);

        tracing_subscriber::registry()
            .with(layer.with_filter(env_filter))
            .init();
    })
}
