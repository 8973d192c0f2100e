use std::sync::Arc;

use thiserror::Error;

/// Top-level error type for the `petlibro-api` crate.
///
/// Covers every failure mode of the cloud API: transport, envelope
/// parsing, login rejection, and application-level error codes.
/// `petlibro-core` maps these into domain diagnostics. Cloneable so a
/// single re-login outcome can be handed to every request waiting on it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected by the vendor (wrong credentials, unknown account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Application ─────────────────────────────────────────────────
    /// Nonzero envelope code other than the session-expired sentinel,
    /// or any nonzero code on the single post-re-login retry.
    #[error("PETLIBRO API error (code {code}): {message}")]
    Api { code: i64, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    /// No response arrived within the configured timeout. The in-flight
    /// request has been aborted.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// Response body was not a `{code, data, msg}` envelope, or `data`
    /// did not match the expected payload shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Api { code, .. } => *code == crate::ERROR_NOT_LOGGED_IN,
            _ => false,
        }
    }

    /// Returns `true` for connection-level failures that a later poll may not hit.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// The vendor's application error code, if this came from an envelope.
    pub fn api_error_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Classify a `reqwest` failure, folding timeouts into [`Error::Timeout`].
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else {
            Self::Transport(Arc::new(err))
        }
    }

    /// Build a [`Error::Deserialization`] carrying a short preview of the body.
    pub(crate) fn deserialization(err: &serde_json::Error, body: &str) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    }
}
