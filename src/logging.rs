//! Tracing subscriber for the relay: a rolling file next to the app data plus stderr.

use anyhow::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "relaybot.log";

/// Used when `RUST_LOG` is unset or unparsable.
const DEFAULT_DIRECTIVES: &str = "info,relaybot=debug";

/// Install the global subscriber and return the file writer's guard with the log directory.
///
/// Dropping the guard flushes and stops the background writer; `main` holds it.
pub fn init() -> Result<(WorkerGuard, PathBuf)> {
    let log_dir = log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));

    let to_file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let to_stderr = fmt::layer().with_writer(std::io::stderr).with_ansi(true);

    tracing_subscriber::registry()
        .with(filter(DEFAULT_DIRECTIVES))
        .with(to_file)
        .with(to_stderr)
        .try_init()?;

    tracing::info!(dir = %log_dir.display(), "relaybot writing logs");

    Ok((guard, log_dir))
}

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn log_dir() -> Result<PathBuf> {
    let project = directories::ProjectDirs::from("com", "relaybot", "relaybot")
        .ok_or_else(|| anyhow::anyhow!("no home directory to place logs under"))?;

    Ok(project.data_dir().join("logs"))
}

/// Console-only subscriber for tests. Later calls are no-ops.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::registry()
        .with(filter("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_live_under_the_app_data_dir() {
        let Ok(dir) = log_dir() else { return };
        assert!(dir.ends_with("logs"));
        assert!(dir.to_string_lossy().contains("relaybot"));
    }

    #[test]
    fn test_subscriber_can_be_installed_twice() {
        init_test();
        init_test();
        tracing::debug!("still logging");
    }
}
