//! Subscriber setup for applications embedding the scheduler.
//!
//! The library itself only emits events under two targets, `llmc.parser` and
//! `llmc.scheduler`; callers decide where they go by calling
//! [`init_tracing`] once at startup.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub const PARSER_TARGET: &str = "llmc.parser";
pub const SCHEDULER_TARGET: &str = "llmc.scheduler";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Filter directives for `logging`: the base level followed by per-target
/// overrides for the parser and scheduler.
pub fn filter_directives(logging: &LoggingConfig) -> String {
    let mut directives = vec![logging.level.trim().to_string()];
    for (target, level) in [
        (PARSER_TARGET, &logging.parser_level),
        (SCHEDULER_TARGET, &logging.scheduler_level),
    ] {
        if let Some(level) = level.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            directives.push(format!("{target}={level}"));
        }
    }
    directives.retain(|d| !d.is_empty());
    directives.join(",")
}

fn build_filter(logging: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    if let Ok(v) = std::env::var("RUST_LOG") {
        if !v.trim().is_empty() {
            return Ok(EnvFilter::from_default_env());
        }
    }
    let directives = filter_directives(logging);
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("invalid log filter {directives:?}: {e}"))
}

fn file_writer(logging: &LoggingConfig) -> anyhow::Result<NonBlocking> {
    let dir = logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("llmc"));

    std::fs::create_dir_all(&dir)
        .map_err(|e| anyhow::anyhow!("create log dir {} failed: {e}", dir.display()))?;
    let appender =
        tracing_appender::rolling::never(dir, format!("llmc.{}.log", std::process::id()));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Ok(writer)
}

/// Installs the global subscriber described by `logging`.
///
/// `RUST_LOG` takes precedence over the configured levels. Installing twice is
/// not an error; the first subscriber stays in place.
pub fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    if !logging.enabled {
        return Ok(());
    }
    if !logging.console && !logging.file {
        anyhow::bail!("logging enabled but both console and file output are off");
    }

    let filter = build_filter(logging)?;
    let file_layer = if logging.file {
        let writer = file_writer(logging)?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
    } else {
        None
    };
    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
    });

    if tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already installed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_logging_is_noop() {
        let cfg = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert!(init_tracing(&cfg).is_ok());
    }

    #[test]
    fn test_no_outputs_is_an_error() {
        let cfg = LoggingConfig {
            console: false,
            file: false,
            ..LoggingConfig::default()
        };
        assert!(init_tracing(&cfg).is_err());
    }

    #[test]
    fn test_target_directives() {
        assert_eq!(filter_directives(&LoggingConfig::default()), "info");

        let cfg = LoggingConfig {
            level: "warn".to_string(),
            parser_level: Some("trace".to_string()),
            scheduler_level: Some(" debug ".to_string()),
            ..LoggingConfig::default()
        };
        assert_eq!(
            filter_directives(&cfg),
            "warn,llmc.parser=trace,llmc.scheduler=debug"
        );

        let cfg = LoggingConfig {
            level: String::new(),
            scheduler_level: Some("debug".to_string()),
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directives(&cfg), "llmc.scheduler=debug");
        assert!(EnvFilter::try_new(filter_directives(&cfg)).is_ok());
    }
}
