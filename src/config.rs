//! Console configuration loaded from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BARANG_API_TIMEOUT_SECS must be a whole number of seconds, got {0:?}")]
    InvalidTimeout(String),
    #[error("BARANG_SESSION_STORE must be `keyring` or `memory`, got {0:?}")]
    InvalidSessionStore(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Keyring,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_url: String,
    /// `None` leaves requests without a client-side timeout.
    pub request_timeout: Option<Duration>,
    pub log_dir: PathBuf,
    pub session_backend: SessionBackend,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: None,
            log_dir: default_log_dir(),
            session_backend: SessionBackend::Keyring,
        }
    }
}

impl ConsoleConfig {
    /// Load from process environment. A `.env` file in the working directory
    /// is read first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("BARANG_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_api_url(&v))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout = match env::var("BARANG_API_TIMEOUT_SECS") {
            Ok(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            _ => None,
        };

        let log_dir = env::var("BARANG_LOG_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_log_dir);

        let session_backend = match env::var("BARANG_SESSION_STORE") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "" | "keyring" => SessionBackend::Keyring,
                "memory" => SessionBackend::Memory,
                _ => return Err(ConfigError::InvalidSessionStore(raw)),
            },
            Err(_) => SessionBackend::Keyring,
        };

        Ok(Self {
            api_url,
            request_timeout,
            log_dir,
            session_backend,
        })
    }
}

/// Normalise the API base URL:
/// - ensure a scheme is present (http for localhost, https otherwise)
/// - strip trailing slashes
///
/// The `/api` prefix is part of every route and is kept.
pub fn normalize_api_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

pub fn default_log_dir() -> PathBuf {
    let base = env::var("XDG_DATA_HOME")
        .or_else(|_| env::var("LOCALAPPDATA"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(env::var("HOME").unwrap_or_else(|_| ".".into()))
                .join(".local")
                .join("share")
        });
    base.join("barang-console").join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "BARANG_API_URL",
            "BARANG_API_TIMEOUT_SECS",
            "BARANG_LOG_DIR",
            "BARANG_SESSION_STORE",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn normalize_adds_scheme_and_strips_slashes() {
        assert_eq!(
            normalize_api_url("127.0.0.1:8000/api/"),
            "http://127.0.0.1:8000/api"
        );
        assert_eq!(
            normalize_api_url("shop.example.com/api//"),
            "https://shop.example.com/api"
        );
        assert_eq!(
            normalize_api_url("  http://localhost:8000/api "),
            "http://localhost:8000/api"
        );
    }

    #[test]
    #[serial]
    fn from_env_uses_defaults() {
        clear_env();
        let cfg = ConsoleConfig::from_env().expect("defaults load");
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.request_timeout, None);
        assert_eq!(cfg.session_backend, SessionBackend::Keyring);
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides() {
        clear_env();
        env::set_var("BARANG_API_URL", "inventory.example.com/api/");
        env::set_var("BARANG_API_TIMEOUT_SECS", "15");
        env::set_var("BARANG_LOG_DIR", "/tmp/barang-logs");
        env::set_var("BARANG_SESSION_STORE", "Memory");

        let cfg = ConsoleConfig::from_env().expect("overrides load");
        assert_eq!(cfg.api_url, "https://inventory.example.com/api");
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(cfg.log_dir, PathBuf::from("/tmp/barang-logs"));
        assert_eq!(cfg.session_backend, SessionBackend::Memory);
        clear_env();
    }

    #[test]
    #[serial]
    fn zero_timeout_means_none_and_garbage_is_rejected() {
        clear_env();
        env::set_var("BARANG_API_TIMEOUT_SECS", "0");
        assert_eq!(ConsoleConfig::from_env().unwrap().request_timeout, None);

        env::set_var("BARANG_API_TIMEOUT_SECS", "soon");
        assert_eq!(
            ConsoleConfig::from_env().unwrap_err(),
            ConfigError::InvalidTimeout("soon".into())
        );
        clear_env();
    }
}
