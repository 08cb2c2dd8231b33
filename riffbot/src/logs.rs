//! Logging setup

use riffconfig::Config;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor a valid configured level is set
const FALLBACK_DIRECTIVE: &str = "info";

/// Builds the level filter: `RUST_LOG` wins over `host.logger.min_level`
pub fn build_filter(config: &Config) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = config
        .get_log_min_level()
        .unwrap_or_else(|_| FALLBACK_DIRECTIVE.to_string())
        .to_lowercase();

    EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
}

/// Installs the global subscriber
///
/// The console layer is only added when `host.logger.enable_console` is set.
pub fn init_logging(config: &Config) {
    let subscriber = Registry::default().with(build_filter(config));

    let enable_console = config.get_log_enable_console().unwrap_or(true);

    if enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .init();
    } else {
        subscriber.init();
    }
}
