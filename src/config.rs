//! Runtime settings.
//!
//! Settings are layered, lowest first: built-in defaults, an optional TOML
//! file, then `GLUCOLED_*` environment variables. Nested keys use `__`, so
//! `GLUCOLED_MONITOR__POLL_INTERVAL_SECS=120` sets `monitor.poll_interval_secs`.
//!
//! Credentials come from `GLUCOLED_EMAIL` and `GLUCOLED_PASSWORD`; the bare
//! `EMAIL` and `PASSWORD` variables are accepted when those are unset.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, Map};
use glucoled_librelink::client::{DEFAULT_BASE_URL, DEFAULT_PRODUCT, DEFAULT_VERSION};
use glucoled_librelink::{Credentials, FetchError, LibreLinkClient};
use glucoled_types::Thresholds;
use serde::Deserialize;
use thiserror::Error;

use crate::monitor::MonitorTiming;

const ENV_PREFIX: &str = "GLUCOLED";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ConfigError),

    #[error("missing credential `{0}`; set GLUCOLED_{1} or {1}")]
    MissingCredential(&'static str, &'static str),
}

/// All runtime settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub email: Option<String>,
    pub password: Option<String>,
    pub librelink: LibreLinkSettings,
    pub thresholds: ThresholdSettings,
    pub monitor: MonitorSettings,
    pub output: OutputSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibreLinkSettings {
    pub base_url: String,
    pub product: String,
    pub version: String,
    pub timeout_secs: u64,
    /// Followed patient; the first connection is used when unset.
    pub patient_id: Option<String>,
}

impl Default for LibreLinkSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            version: DEFAULT_VERSION.to_string(),
            timeout_secs: 10,
            patient_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdSettings {
    pub low_mg_dl: f64,
    pub high_mg_dl: f64,
    pub stale_after_secs: u64,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        let defaults = Thresholds::default();
        Self {
            low_mg_dl: defaults.low_mg_dl,
            high_mg_dl: defaults.high_mg_dl,
            stale_after_secs: defaults.stale_after.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorSettings {
    pub poll_interval_secs: u64,
    pub unavailable_retry_secs: u64,
    pub backoff_secs: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        let defaults = MonitorTiming::default();
        Self {
            poll_interval_secs: defaults.poll_interval.as_secs(),
            unavailable_retry_secs: defaults.unavailable_retry.as_secs(),
            backoff_secs: defaults.backoff.as_secs(),
        }
    }
}

/// Which signal output drives the light.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Gpio,
    Log,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    pub kind: OutputKind,
    /// BCM pin number.
    pub pin: u8,
    pub frequency_hz: f64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            kind: OutputKind::Gpio,
            pin: 47,
            frequency_hz: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment and an optional file.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_env(path, None)
    }

    /// Load settings, reading environment variables from `env` instead of
    /// the process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        // Bare EMAIL / PASSWORD sit below every other layer.
        for key in ["email", "password"] {
            if let Some(value) = lookup(env.as_ref(), &key.to_uppercase()) {
                builder = builder.set_default(key, value)?;
            }
        }

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Follower account credentials.
    pub fn credentials(&self) -> Result<Credentials, SettingsError> {
        let email = non_empty(&self.email).ok_or(SettingsError::MissingCredential("email", "EMAIL"))?;
        let password = non_empty(&self.password)
            .ok_or(SettingsError::MissingCredential("password", "PASSWORD"))?;
        Ok(Credentials::new(email, password))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            low_mg_dl: self.thresholds.low_mg_dl,
            high_mg_dl: self.thresholds.high_mg_dl,
            stale_after: Duration::from_secs(self.thresholds.stale_after_secs),
        }
    }

    pub fn monitor_timing(&self) -> MonitorTiming {
        MonitorTiming {
            poll_interval: Duration::from_secs(self.monitor.poll_interval_secs),
            unavailable_retry: Duration::from_secs(self.monitor.unavailable_retry_secs),
            backoff: Duration::from_secs(self.monitor.backoff_secs),
        }
    }

    /// Build the LibreLinkUp client described by these settings.
    pub fn librelink_client(&self) -> Result<LibreLinkClient, FetchError> {
        LibreLinkClient::builder()
            .base_url(&self.librelink.base_url)
            .product(&self.librelink.product)
            .version(&self.librelink.version)
            .timeout(Duration::from_secs(self.librelink.timeout_secs))
            .patient_id(self.librelink.patient_id.clone())
            .build()
    }
}

fn lookup(env: Option<&Map<String, String>>, key: &str) -> Option<String> {
    match env {
        Some(map) => map.get(key).cloned(),
        None => std::env::var(key).ok(),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_sources() {
        let settings = Settings::load_with_env(None, env(&[])).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.thresholds(), Thresholds::default());
        assert_eq!(settings.monitor_timing(), MonitorTiming::default());
        assert_eq!(settings.output.pin, 47);
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn missing_credentials_are_an_error() {
        let settings = Settings::load_with_env(None, env(&[])).unwrap();
        assert!(matches!(
            settings.credentials(),
            Err(SettingsError::MissingCredential("email", _))
        ));
    }

    #[test]
    fn bare_credential_variables_are_a_fallback() {
        let settings = Settings::load_with_env(
            None,
            env(&[("EMAIL", "plain@example.com"), ("PASSWORD", "hunter2")]),
        )
        .unwrap();
        assert_eq!(settings.credentials().unwrap().email(), "plain@example.com");

        let settings = Settings::load_with_env(
            None,
            env(&[
                ("EMAIL", "plain@example.com"),
                ("PASSWORD", "hunter2"),
                ("GLUCOLED_EMAIL", "prefixed@example.com"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.credentials().unwrap().email(), "prefixed@example.com");
    }

    #[test]
    fn file_then_environment() {
        let file = toml_file(
            r#"
            [monitor]
            poll_interval_secs = 120
            backoff_secs = 30

            [output]
            kind = "log"
            pin = 18

            [thresholds]
            low_mg_dl = 80.0
            "#,
        );

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[("GLUCOLED_MONITOR__BACKOFF_SECS", "90")]),
        )
        .unwrap();

        assert_eq!(settings.monitor.poll_interval_secs, 120);
        assert_eq!(settings.monitor.backoff_secs, 90);
        assert_eq!(settings.monitor.unavailable_retry_secs, 5);
        assert_eq!(settings.output.kind, OutputKind::Log);
        assert_eq!(settings.output.pin, 18);
        assert_eq!(settings.thresholds().low_mg_dl, 80.0);
        assert_eq!(settings.thresholds().high_mg_dl, 170.0);
    }

    #[test]
    fn numeric_looking_values_stay_strings() {
        let settings = Settings::load_with_env(
            None,
            env(&[
                ("GLUCOLED_EMAIL", "0042"),
                ("GLUCOLED_PASSWORD", "007123"),
                ("GLUCOLED_LIBRELINK__PATIENT_ID", "000123456789012345678901"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.email.as_deref(), Some("0042"));
        assert_eq!(settings.password.as_deref(), Some("007123"));
        assert_eq!(
            settings.librelink.patient_id.as_deref(),
            Some("000123456789012345678901")
        );
        assert_eq!(settings.credentials().unwrap().email(), "0042");
    }

    #[test]
    fn numeric_environment_values_fill_numeric_fields() {
        let settings = Settings::load_with_env(
            None,
            env(&[
                ("GLUCOLED_MONITOR__POLL_INTERVAL_SECS", "120"),
                ("GLUCOLED_THRESHOLDS__HIGH_MG_DL", "180.5"),
                ("GLUCOLED_OUTPUT__PIN", "18"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.monitor.poll_interval_secs, 120);
        assert_eq!(settings.thresholds.high_mg_dl, 180.5);
        assert_eq!(settings.output.pin, 18);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load_with_env(Some(&path), env(&[])).is_err());
    }

    #[test]
    fn builds_client_from_settings() {
        let settings = Settings::default();
        assert!(settings.librelink_client().is_ok());
    }
}
