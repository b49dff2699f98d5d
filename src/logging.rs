// SPDX-License-Identifier: MIT
//
// File logging.
//
// The terminal is the user interface, so log lines go to a file under the
// per-user state directory instead. `N_EDLIN_LOG` takes an env-filter
// directive (`debug`, `n_editor=trace`, ...); the default is `info`.

use std::path::PathBuf;

use thiserror::Error;
use time::macros::format_description;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive.
pub const LOG_ENV: &str = "N_EDLIN_LOG";

const LOG_FILE: &str = "n-edlin.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("create log directory {} failed", path.display())]
    CreateLogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("initialize tracing subscriber failed")]
    InitSubscriber {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Install the global subscriber writing to the log file.
///
/// # Errors
///
/// Fails if the log directory cannot be created or a subscriber is already
/// installed.
pub fn init_logging() -> Result<(), LoggingError> {
    let log_dir = user_log_dir();
    std::fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateLogDir {
        path: log_dir.clone(),
        source,
    })?;

    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    tracing_subscriber::fmt()
        .with_timer(timer)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(file_appender)
        .with_ansi(false)
        .try_init()
        .map_err(|source| LoggingError::InitSubscriber { source })?;

    Ok(())
}

/// `$XDG_STATE_HOME/n-edlin/logs`, else `~/.local/state/n-edlin/logs`, else
/// under the temp directory.
fn user_log_dir() -> PathBuf {
    if let Some(state_home) = std::env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(state_home).join("n-edlin").join("logs");
    }
    std::env::var_os("HOME")
        .map_or_else(std::env::temp_dir, PathBuf::from)
        .join(".local")
        .join("state")
        .join("n-edlin")
        .join("logs")
}
