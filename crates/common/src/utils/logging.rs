use std::io;

use configs::LogFormat;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: request traces at info, linkout writes at debug.
pub const DEFAULT_FILTER: &str = "info,tower_http=info,service::linkout=debug";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global stdout subscriber in the configured format.
///
/// Only the first call in a process takes effect, so the binary and
/// `server::run` can both call it.
pub fn init_logging(format: LogFormat) {
    let filter = env_filter(DEFAULT_FILTER);
    let builder = fmt().with_env_filter(filter).with_writer(io::stdout);
    let _ = match format {
        LogFormat::Compact => builder.with_target(false).compact().try_init(),
        LogFormat::Json => builder.with_target(true).json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(DEFAULT_FILTER.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LogFormat::Json);
        init_logging(LogFormat::Compact);
        tracing::info!("still logging");
    }
}
