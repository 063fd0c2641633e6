//! Log subscriber setup for the `shuffle` binary.
//!
//! Every log line goes to stderr. Stdout is reserved for the configuration,
//! combination or verdict JSON a command prints, so it can be piped as is.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "SHUFFLE_LOG";

/// Filter from `SHUFFLE_LOG`, or `level` when it is unset or unparsable.
fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the process-wide subscriber.
///
/// With `json` set, rejected rounds and the built configuration are logged
/// as one JSON object per line, with the `event` field from [`crate::obs`]
/// kept as a searchable key. Only the first call in a process installs
/// anything.
pub fn init_tracing(json: bool, level: Level) {
    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(env_filter(level));

    if json {
        registry.with(stderr.json()).try_init().ok();
    } else {
        registry.with(stderr).try_init().ok();
    }
}
