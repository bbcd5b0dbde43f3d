//! Log setup for the CLI binary
//!
//! Logs go to stderr so that stdout carries only command output. The filter
//! comes from `KVPROBE_LOG` when set, otherwise from the `-v` count.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

pub const LOG_ENV_VAR: &str = "KVPROBE_LOG";

/// Level selected by the number of `-v` flags
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber; JSON records when `json_output` is set
pub fn init_logging(verbosity: u8, json_output: bool) {
    let level = level_for_verbosity(verbosity);
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(format!("kvprobe={},warn", level)));

    let result = if json_output {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);
        Registry::default().with(env_filter).with(fmt_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false);
        Registry::default().with(env_filter).with(fmt_layer).try_init()
    };

    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
