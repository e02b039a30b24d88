//! Tracing setup shared by the mission drivers.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Level used when neither `RUST_LOG` nor the caller gives a usable filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// `RUST_LOG` wins; otherwise `default_level`, falling back to `info` when
/// that does not parse as a filter directive.
pub fn log_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install a thread-local subscriber for the driver.
///
/// Output is compact, without target, file or line metadata, and goes to
/// stderr so stdout stays free for things like the mission XML. Keep the
/// returned guard alive for the whole run.
///
/// ```no_run
/// let _guard = malmo_agent_lib::init_tracing("debug");
/// ```
pub fn init_tracing(default_level: &str) -> DefaultGuard {
    use tracing_subscriber::layer::SubscriberExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let subscriber = tracing_subscriber::Registry::default()
        .with(log_filter(default_level))
        .with(fmt_layer);

    tracing::subscriber::set_default(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_default_level_applies_without_rust_log() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(log_filter("debug").max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter("malmo_agent_lib=loud").max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_guard_scopes_subscriber() {
        let guard = init_tracing("debug");
        tracing::debug!("visible only while the guard lives");
        drop(guard);
    }
}
