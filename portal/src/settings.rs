//! Portal configuration loaded via OrthoConfig.
//!
//! Values come from `LOAN_PORTAL_*` environment variables or a config file;
//! anything unset falls back to the defaults below.

use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_POLL_MS: u64 = 1_000;
const DEFAULT_ADMIN_DEBOUNCE_MS: u64 = 300;
const STATE_DIR_NAME: &str = "loan-portal";

/// Errors raised while resolving settings into usable values.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `api_base_url` is not a URL.
    #[error("invalid API base URL {url}: {source}")]
    InvalidBaseUrl {
        /// Value as configured.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The state directory path is not UTF-8.
    #[error("state directory {0} is not valid UTF-8")]
    NonUtf8StateDir(String),
    /// No state directory was configured and the platform has no data directory.
    #[error("no platform data directory; set LOAN_PORTAL_STATE_DIR")]
    NoDataDir,
}

/// Runtime settings for the portal client.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LOAN_PORTAL")]
pub struct PortalSettings {
    /// Root URL of the loan backend API.
    pub api_base_url: Option<String>,
    /// Fixed timeout applied to every HTTP request.
    pub request_timeout_secs: Option<u64>,
    /// Directory for `session.json` and draft snapshots.
    pub state_dir: Option<PathBuf>,
    /// How often to poll the session file for changes by other processes.
    pub session_poll_ms: Option<u64>,
    /// Quiet window before admin filter changes trigger a fetch.
    pub admin_debounce_ms: Option<u64>,
}

impl PortalSettings {
    /// Configured base URL, falling back to the local backend.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBaseUrl`] when the value does not parse.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL);
        Url::parse(raw).map_err(|source| SettingsError::InvalidBaseUrl {
            url: raw.to_owned(),
            source,
        })
    }

    /// Timeout for every HTTP request; zero falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Configured state directory, falling back to the platform data dir.
    ///
    /// # Errors
    ///
    /// Returns an error when no directory can be determined or the path is
    /// not UTF-8.
    pub fn state_dir(&self) -> Result<Utf8PathBuf, SettingsError> {
        let path = match &self.state_dir {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .ok_or(SettingsError::NoDataDir)?
                .join(STATE_DIR_NAME),
        };
        Utf8PathBuf::from_path_buf(path)
            .map_err(|path| SettingsError::NonUtf8StateDir(path.display().to_string()))
    }

    /// Interval between session file checks; zero falls back to the default.
    pub fn session_poll(&self) -> Duration {
        Duration::from_millis(
            self.session_poll_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_SESSION_POLL_MS),
        )
    }

    /// Quiet window before admin filter changes fetch.
    pub fn admin_debounce(&self) -> Duration {
        Duration::from_millis(self.admin_debounce_ms.unwrap_or(DEFAULT_ADMIN_DEBOUNCE_MS))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for portal configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> PortalSettings {
        PortalSettings::load_from_iter([OsString::from("loan-portal")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("LOAN_PORTAL_API_BASE_URL", None::<String>),
            ("LOAN_PORTAL_REQUEST_TIMEOUT_SECS", None::<String>),
            ("LOAN_PORTAL_STATE_DIR", None::<String>),
            ("LOAN_PORTAL_SESSION_POLL_MS", None::<String>),
            ("LOAN_PORTAL_ADMIN_DEBOUNCE_MS", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_base_url().expect("default parses").as_str(),
            "http://localhost:8080/api"
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.session_poll(), Duration::from_secs(1));
        assert_eq!(settings.admin_debounce(), Duration::from_millis(300));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "LOAN_PORTAL_API_BASE_URL",
                Some("https://loans.example.com/api".to_owned()),
            ),
            ("LOAN_PORTAL_REQUEST_TIMEOUT_SECS", Some("5".to_owned())),
            ("LOAN_PORTAL_STATE_DIR", Some("/tmp/loan-portal-test".to_owned())),
            ("LOAN_PORTAL_SESSION_POLL_MS", Some("250".to_owned())),
            ("LOAN_PORTAL_ADMIN_DEBOUNCE_MS", Some("0".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_base_url().expect("parses").host_str(),
            Some("loans.example.com")
        );
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
        assert_eq!(
            settings.state_dir().expect("utf-8"),
            Utf8PathBuf::from("/tmp/loan-portal-test")
        );
        assert_eq!(settings.session_poll(), Duration::from_millis(250));
        assert_eq!(settings.admin_debounce(), Duration::ZERO);
    }

    #[rstest]
    fn malformed_base_url_is_reported() {
        let settings = PortalSettings {
            api_base_url: Some("not a url".to_owned()),
            ..PortalSettings::default()
        };
        assert!(matches!(
            settings.api_base_url(),
            Err(SettingsError::InvalidBaseUrl { .. })
        ));
    }

    #[rstest]
    fn zero_timeout_falls_back_to_default() {
        let settings = PortalSettings {
            request_timeout_secs: Some(0),
            ..PortalSettings::default()
        };
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    }
}
