//! Shared configuration for petlibro tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), token
//! persistence in the system keyring, and translation to
//! `petlibro_api::SessionConfig` / `petlibro_core::ReconcilerConfig`.
//! The api and core crates never read files themselves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use petlibro_api::{Credentials, DEFAULT_TIMEOUT, SessionConfig, TransportConfig};
use petlibro_core::ReconcilerConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const KEYRING_SERVICE: &str = "petlibro";

/// Env var checked before the keyring and the plaintext profile password.
pub const PASSWORD_ENV: &str = "PETLIBRO_PASSWORD";

/// Env var that supplies a session token, bypassing the keyring.
pub const TOKEN_ENV: &str = "PETLIBRO_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found in {}", path.display())]
    UnknownProfile { profile: String, path: PathBuf },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, naming the config file in the error.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
                path: config_path(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between two polls of the same device.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}
fn default_poll_interval() -> u64 {
    60
}

/// A named PETLIBRO account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Account email.
    pub email: String,

    /// Account region, sent as `country` on login.
    #[serde(default = "default_region")]
    pub region: String,

    /// IANA timezone sent with every request.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// API host override (regional endpoint, proxy).
    pub base_url: Option<String>,

    /// Password (plaintext; prefer keyring or `PETLIBRO_PASSWORD`).
    pub password: Option<String>,

    /// Override request timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval: Option<u64>,

    /// Battery percentage below which the low flag is raised.
    pub low_battery_threshold: Option<u8>,
}

impl Profile {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            region: default_region(),
            timezone: default_timezone(),
            base_url: None,
            password: None,
            timeout: None,
            poll_interval: None,
            low_battery_threshold: None,
        }
    }
}

fn default_region() -> String {
    "US".into()
}
fn default_timezone() -> String {
    "UTC".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "petlibro", "petlibro").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("petlibro");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file, layered as defaults → file → `PETLIBRO_*` env.
///
/// Nested keys use a double underscore, e.g. `PETLIBRO_DEFAULTS__TIMEOUT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PETLIBRO_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str, kind: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/{kind}"),
    )?)
}

fn keyring_get(profile_name: &str, kind: &str) -> Option<String> {
    let entry = keyring_entry(profile_name, kind).ok()?;
    match entry.get_password() {
        Ok(value) => Some(value),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            debug!(profile = profile_name, kind, error = %e, "keyring unavailable");
            None
        }
    }
}

/// Resolve the account password: `PETLIBRO_PASSWORD` → keyring → plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Some(pw) = keyring_get(profile_name, "password") {
        return Ok(SecretString::from(pw));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store the account password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "password")?.set_password(password.expose_secret())?;
    Ok(())
}

// ── Token persistence ───────────────────────────────────────────────

/// Session token from a previous run: `PETLIBRO_TOKEN` → keyring.
pub fn load_token(profile_name: &str) -> Option<String> {
    std::env::var(TOKEN_ENV)
        .ok()
        .or_else(|| keyring_get(profile_name, "token"))
        .filter(|t| !t.is_empty())
}

/// Persist the current session token.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "token")?.set_password(token)?;
    Ok(())
}

/// Forget the stored session token. Missing entries are not an error.
pub fn clear_token(profile_name: &str) -> Result<(), ConfigError> {
    match keyring_entry(profile_name, "token")?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Translation to runtime configs ──────────────────────────────────

/// Build a `TransportConfig` from a profile and the global defaults.
pub fn profile_to_transport_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<TransportConfig, ConfigError> {
    let mut transport = match profile.base_url.as_deref() {
        Some(url) => TransportConfig::with_base_url(url).map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {url}"),
        })?,
        None => TransportConfig::default(),
    };
    transport.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(transport)
}

/// Build the `SessionConfig` for a profile: credentials resolved through
/// the password chain, token restored from storage if present.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let transport = profile_to_transport_config(profile, defaults)?;
    let password = resolve_password(profile, profile_name)?;

    Ok(SessionConfig {
        transport,
        credentials: Credentials {
            email: profile.email.clone(),
            password,
            region: profile.region.clone(),
            timezone: profile.timezone.clone(),
        },
        token: load_token(profile_name),
    })
}

pub fn profile_to_reconciler_config(profile: &Profile, defaults: &Defaults) -> ReconcilerConfig {
    let mut config = ReconcilerConfig::default().with_poll_interval(Duration::from_secs(
        profile.poll_interval.unwrap_or(defaults.poll_interval),
    ));
    if let Some(threshold) = profile.low_battery_threshold {
        config.low_battery_threshold = threshold;
    }
    config
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> Config {
        let mut profile = Profile::new("owner@example.com");
        profile.region = "DE".into();
        profile.timezone = "Europe/Berlin".into();
        profile.poll_interval = Some(30);

        let mut cfg = Config::default();
        cfg.profiles.insert("home".into(), profile);
        cfg.default_profile = Some("home".into());
        cfg
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        save_config_to(&path, &sample()).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.default_profile.as_deref(), Some("home"));
        assert_eq!(loaded.profile("home").unwrap(), sample().profile("home").unwrap());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(loaded.defaults.timeout, 15);
        assert_eq!(loaded.defaults.poll_interval, 60);
        assert!(loaded.profiles.is_empty());
    }

    #[test]
    fn profile_fields_default_when_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[profiles.main]\nemail = \"cat@example.com\"\n").unwrap();

        let cfg = load_config_from(&path).unwrap();
        let profile = cfg.profile("main").unwrap();

        assert_eq!(profile.region, "US");
        assert_eq!(profile.timezone, "UTC");
        assert!(matches!(
            cfg.profile("other"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn transport_config_applies_overrides() {
        let mut profile = Profile::new("a@b.c");
        profile.base_url = Some("http://127.0.0.1:9000/".into());
        profile.timeout = Some(5);

        let transport = profile_to_transport_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(transport.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(transport.timeout, Duration::from_secs(5));

        profile.base_url = Some("not a url".into());
        assert!(matches!(
            profile_to_transport_config(&profile, &Defaults::default()),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn reconciler_config_uses_profile_then_defaults() {
        let mut profile = Profile::new("a@b.c");
        let defaults = Defaults::default();
        assert_eq!(
            profile_to_reconciler_config(&profile, &defaults).poll_interval,
            Duration::from_secs(60)
        );

        profile.poll_interval = Some(10);
        profile.low_battery_threshold = Some(25);
        let config = profile_to_reconciler_config(&profile, &defaults);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.low_battery_threshold, 25);
    }
}
