//! Tracing setup for the relay.
//!
//! Every event goes to stdout in compact form. A second, uncoloured copy goes to the file named by
//! [`Config::log_file`](crate::config::Config::log_file), or to `logs/tika-relay.log` when none is
//! configured. If the file cannot be prepared the relay keeps running with stdout only.
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directory used when no log file is configured.
pub const DEFAULT_LOG_DIR: &str = "logs";
/// File name used when no log file is configured.
pub const DEFAULT_LOG_NAME: &str = "tika-relay.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where the file copy of the logs is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    /// Directory holding the log file, created on demand.
    pub dir: PathBuf,
    /// Name of the log file inside `dir`.
    pub file_name: PathBuf,
}

impl LogTarget {
    /// Resolve the target for an optional configured path.
    pub fn resolve(log_file: Option<&Path>) -> Self {
        match log_file.and_then(|path| Some((path.parent(), path.file_name()?))) {
            Some((parent, file_name)) => Self {
                dir: parent
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
                file_name: PathBuf::from(file_name),
            },
            None => Self {
                dir: PathBuf::from(DEFAULT_LOG_DIR),
                file_name: PathBuf::from(DEFAULT_LOG_NAME),
            },
        }
    }

    /// Full path of the log file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Create the directory and open an appending, non-blocking writer.
    fn open(&self) -> io::Result<(NonBlocking, WorkerGuard)> {
        std::fs::create_dir_all(&self.dir)?;
        let appender = tracing_appender::rolling::never(&self.dir, &self.file_name);
        Ok(tracing_appender::non_blocking(appender))
    }
}

/// Install the global subscriber, copying logs to `log_file` (or the default target).
///
/// `RUST_LOG` controls filtering and defaults to `info`.
pub fn init_tracing(log_file: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact());

    let target = LogTarget::resolve(log_file);
    match target.open() {
        Ok((writer, guard)) => {
            let _ = LOG_GUARD.set(guard);
            registry
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_ansi(false)
                        .compact(),
                )
                .init();
            tracing::debug!(path = %target.path().display(), "Writing logs to file");
        }
        Err(error) => {
            registry.init();
            tracing::warn!(
                path = %target.path().display(),
                error = %error,
                "Log file unavailable, logging to stdout only"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unset_log_file_uses_default_target() {
        let target = LogTarget::resolve(None);
        assert_eq!(target.path(), Path::new("logs").join("tika-relay.log"));
    }

    #[test]
    fn configured_log_file_is_split_into_dir_and_name() {
        let target = LogTarget::resolve(Some(Path::new("/var/log/relay/out.log")));
        assert_eq!(target.dir, PathBuf::from("/var/log/relay"));
        assert_eq!(target.file_name, PathBuf::from("out.log"));
    }

    #[test]
    fn bare_file_name_lands_in_working_directory() {
        let target = LogTarget::resolve(Some(Path::new("relay.log")));
        assert_eq!(target.dir, PathBuf::from("."));
        assert_eq!(target.file_name, PathBuf::from("relay.log"));
    }

    #[test]
    fn opening_target_creates_missing_directory() {
        let root = TempDir::new().expect("dir");
        let configured = root.path().join("nested").join("relay.log");
        let target = LogTarget::resolve(Some(&configured));

        let (_writer, _guard) = target.open().expect("open");
        assert!(root.path().join("nested").is_dir());
    }
}
