use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Default base URL of the Tika server.
pub const DEFAULT_TIKA_URL: &str = "http://localhost:9998";
/// Default HTTP listening port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default scratch directory for uploaded files.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the relay.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Tika server that performs the extraction.
    pub tika_url: String,
    /// Port the HTTP server listens on.
    pub server_port: u16,
    /// Directory that holds uploads while they are forwarded to Tika.
    pub upload_dir: PathBuf,
    /// Optional cap on request body size; `None` leaves uploads unbounded.
    pub max_upload_bytes: Option<usize>,
    /// File that receives a copy of the logs; `None` selects `logs/tika-relay.log`.
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables, falling back to documented defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            tika_url: get("TIKA_URL").unwrap_or_else(|| DEFAULT_TIKA_URL.to_string()),
            server_port: get("PORT")
                .map(|value| parse_value("PORT", &value))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            max_upload_bytes: get("MAX_UPLOAD_BYTES")
                .map(|value| parse_value("MAX_UPLOAD_BYTES", &value))
                .transpose()?,
            log_file: get("TIKA_RELAY_LOG_FILE").map(PathBuf::from),
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment (and `.env`) and install it in the process-wide cache.
///
/// Runs before tracing is set up, so it does not log. Later calls keep the configuration
/// installed by the first one.
pub fn init_config() -> Result<(), ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let _ = CONFIG.set(config);
    Ok(())
}

/// Access the configuration installed by [`init_config`].
///
/// # Panics
///
/// Panics if [`init_config`] has not completed successfully.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.tika_url, DEFAULT_TIKA_URL);
        assert_eq!(config.server_port, DEFAULT_PORT);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, None);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn overrides_are_honored() {
        let config = Config::from_lookup(lookup(&[
            ("TIKA_URL", "http://tika:9998/"),
            ("PORT", "8080"),
            ("UPLOAD_DIR", "/tmp/relay"),
            ("MAX_UPLOAD_BYTES", "1048576"),
            ("TIKA_RELAY_LOG_FILE", "/var/log/relay.log"),
        ]))
        .expect("config");
        assert_eq!(config.tika_url, "http://tika:9998/");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/relay"));
        assert_eq!(config.max_upload_bytes, Some(1_048_576));
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/relay.log")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("PORT", "  "), ("TIKA_URL", "")]))
            .expect("config");
        assert_eq!(config.server_port, DEFAULT_PORT);
        assert_eq!(config.tika_url, DEFAULT_TIKA_URL);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let error = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(error, ConfigError::InvalidValue("PORT".into()));
    }

    #[test]
    fn blank_log_file_selects_default_target() {
        let config =
            Config::from_lookup(lookup(&[("TIKA_RELAY_LOG_FILE", " ")])).expect("config");
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn init_config_installs_shared_config() {
        init_config().expect("init");
        let first = get_config();
        init_config().expect("second init");
        assert!(std::ptr::eq(first, get_config()));
        assert!(!first.tika_url.is_empty());
    }
}
