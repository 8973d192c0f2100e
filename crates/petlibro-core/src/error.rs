// ── Core error types ──
//
// User-facing errors from petlibro-core. Consumers never see envelope
// codes or JSON parse failures directly; the `From<petlibro_api::Error>`
// impl translates them into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the PETLIBRO cloud: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("PETLIBRO cloud did not respond within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {serial}")]
    DeviceNotFound { serial: String },

    #[error("Device {serial} is not tracked")]
    NotTracked { serial: String },

    #[error("Unsupported product: {identifier}")]
    UnsupportedProduct { identifier: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Rejected by PETLIBRO cloud (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("Unexpected response from PETLIBRO cloud: {message}")]
    Protocol { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The vendor's application error code, if one was involved.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<petlibro_api::Error> for CoreError {
    fn from(err: petlibro_api::Error) -> Self {
        match err {
            petlibro_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            petlibro_api::Error::Api { code, message } => {
                if code == petlibro_api::ERROR_NOT_LOGGED_IN {
                    CoreError::AuthenticationFailed {
                        message: format!("session rejected after re-login: {message}"),
                    }
                } else {
                    CoreError::Api { code, message }
                }
            }
            petlibro_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            petlibro_api::Error::Transport(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            petlibro_api::Error::InvalidUrl(e) => CoreError::ConnectionFailed {
                reason: format!("invalid URL: {e}"),
            },
            petlibro_api::Error::Deserialization { message, .. } => {
                CoreError::Protocol { message }
            }
        }
    }
}
