//! Tracing initialisation for travis-enable binaries.
//!
//! Call [`init_tracing`] once at program start. Log lines go to stderr so
//! that stdout stays free for the JSON report.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events are shown at the requested level by default.
const CRATES: [&str; 3] = ["travis_enable", "travis_api", "travis_enable_cli"];

/// Default filter: our crates at `level`, everything else at `warn`.
pub fn default_filter(level: Level) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|krate| format!("{}={}", krate, level)));
    directives.join(",")
}

/// Initialise the global tracing subscriber.
///
/// * `json` - emit newline-delimited JSON log lines.
/// * `level` - verbosity for travis-enable crates when `RUST_LOG` is unset.
///
/// `RUST_LOG` takes precedence when set. Only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_scopes_level_to_our_crates() {
        assert_eq!(
            default_filter(Level::DEBUG),
            "warn,travis_enable=DEBUG,travis_api=DEBUG,travis_enable_cli=DEBUG"
        );
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(false, Level::INFO);
        init_tracing(true, Level::DEBUG);
    }
}
