//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use petlibro_config::ConfigError;
use petlibro_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the PETLIBRO cloud")]
    #[diagnostic(
        code(petlibro::connection_failed),
        help(
            "Check your network connection and the API host.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(petlibro::timeout),
        help("Increase timeout with --timeout or try again later.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(petlibro::auth_failed),
        help(
            "Verify the email and password of profile '{profile}'.\n\
             Run: petlibro config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(petlibro::no_credentials),
        help(
            "Configure credentials with: petlibro config init\n\
             Or set the PETLIBRO_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("Device '{serial}' not found")]
    #[diagnostic(
        code(petlibro::not_found),
        help("Run: petlibro devices to see the devices on this account")
    )]
    DeviceNotFound { serial: String },

    #[error("Device '{serial}' is not a supported {expected}")]
    #[diagnostic(code(petlibro::unsupported_device))]
    UnsupportedDevice { serial: String, expected: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(petlibro::api_error))]
    ApiError { code: i64, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(petlibro::protocol),
        help("The cloud answered with something this version does not understand. Rerun with -vv for details.")
    )]
    Protocol { message: String },

    #[error("Internal error: {0}")]
    #[diagnostic(code(petlibro::internal))]
    Internal(String),

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(petlibro::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(petlibro::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: petlibro config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No account configured")]
    #[diagnostic(
        code(petlibro::no_config),
        help(
            "Create one with: petlibro config init\n\
             Or pass --email and set PETLIBRO_PASSWORD.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(petlibro::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::UnsupportedDevice { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to an authentication failure.
    pub fn for_profile(self, name: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: name.into(),
                message,
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::DeviceNotFound { serial } | CoreError::NotTracked { serial } => {
                CliError::DeviceNotFound { serial }
            }
            CoreError::UnsupportedProduct { identifier } => CliError::UnsupportedDevice {
                serial: identifier,
                expected: "feeder or fountain".into(),
            },
            CoreError::Api { code, message } => CliError::ApiError { code, message },
            CoreError::Protocol { message } => CliError::Protocol { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<petlibro_api::Error> for CliError {
    fn from(err: petlibro_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { profile, .. } => CliError::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let auth: CliError = CoreError::AuthenticationFailed {
            message: "bad password".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let missing: CliError = CoreError::DeviceNotFound {
            serial: "AF0001".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let slow: CliError = petlibro_api::Error::Timeout { timeout_secs: 15 }.into();
        assert_eq!(slow.exit_code(), exit_code::TIMEOUT);

        let rejected: CliError = CoreError::Api {
            code: 2004,
            message: "device busy".into(),
        }
        .into();
        assert_eq!(rejected.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn auth_failure_names_profile() {
        let err = CliError::from(CoreError::AuthenticationFailed {
            message: "nope".into(),
        })
        .for_profile("home");
        assert!(matches!(err, CliError::AuthFailed { ref profile, .. } if profile == "home"));
    }
}
