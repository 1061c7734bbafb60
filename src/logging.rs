//! Logging setup
//!
//! One rolling log file plus stdout. The default filter keeps this
//! service's own events at the configured level while capping the chatty
//! dependencies: sqlx logs every statement at debug, redis logs reconnect
//! attempts, hyper logs per-connection lifecycle. `RUST_LOG` overrides the
//! whole filter when set.

use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directives for the service: wallet_service targets at the
/// configured level, infrastructure crates capped below it.
fn filter_directives(level: &str) -> String {
    format!(
        "{level},sqlx::query=warn,sqlx=info,redis=info,hyper=info,tower=info",
        level = level
    )
}

fn rotation(config: &AppConfig) -> Rotation {
    match config.rotation.as_str() {
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        "never" => Rotation::NEVER,
        other => {
            // tracing is not up yet
            eprintln!(
                "unknown rotation {:?}, falling back to daily (expected hourly/daily/never)",
                other
            );
            Rotation::DAILY
        }
    }
}

pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let appender = RollingFileAppender::new(rotation(config), &config.log_dir, &config.log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.log_level)));

    // Stdout stays human-readable in both modes; the file carries the full
    // targets since that is what gets grepped during an incident.
    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(file_writer)
            .with_ansi(false);
        let stdout_layer = fmt::layer().compact().with_target(false);
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(stdout_layer)
            .init();
    } else {
        let file_layer = fmt::layer()
            .with_target(true)
            .with_writer(file_writer)
            .with_ansi(false);
        let stdout_layer = fmt::layer().compact().with_target(false);
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(stdout_layer)
            .init();
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_keep_service_level_and_cap_dependencies() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("sqlx::query=warn"));
        assert!(directives.contains("redis=info"));
        assert!(directives.contains("hyper=info"));
    }

    #[test]
    fn directives_parse_as_a_filter() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(
                EnvFilter::try_new(filter_directives(level)).is_ok(),
                "directives for {} should parse",
                level
            );
        }
    }
}
