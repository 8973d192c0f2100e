// Single-shot HTTPS transport for the PETLIBRO cloud.
//
// One POST per call, JSON in and out, vendor headers recomputed on every
// request so a rotated token is picked up without rebuilding the client.
// No retries live here; the session decides what to do with an envelope.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::Envelope;

/// Production API host for all regions the vendor app currently ships.
pub const DEFAULT_BASE_URL: &str = "https://api.us.petlibro.com";

/// Every call is abandoned after this long without a response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const APP_ID: i64 = 1;
const APP_SN: &str = "c35772530d1041699c87fe62348507a8";
const APP_VERSION: &str = "1.3.45";

/// Client identity the vendor expects on every request and in the login body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub app_id: i64,
    pub app_sn: String,
    /// Sent as the `version` header.
    pub version: String,
    /// Sent as the `source` header.
    pub source: String,
    /// Sent as the `language` header.
    pub language: String,
    pub phone_brand: String,
    pub phone_system_version: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            app_id: APP_ID,
            app_sn: APP_SN.into(),
            version: APP_VERSION.into(),
            source: "ANDROID".into(),
            language: "EN".into(),
            phone_brand: "petlibro-rs".into(),
            phone_system_version: "1.0".into(),
        }
    }
}

/// Transport configuration shared by every session built from it.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub identity: AppIdentity,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            identity: AppIdentity::default(),
        }
    }
}

impl TransportConfig {
    /// Config pointing at a different host (regional endpoint, test double).
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            ..Self::default()
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("petlibro-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(Arc::new(e)))
    }
}

/// Per-call header inputs owned by the session.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub timezone: &'a str,
    pub token: Option<&'a str>,
}

/// Raw HTTP transport. Cheap to clone (the inner `reqwest::Client` is an `Arc`).
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    config: TransportConfig,
}

impl Transport {
    pub fn new(config: TransportConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self { http, config })
    }

    /// Wrap a pre-built `reqwest::Client`. Its own timeout is used for
    /// aborting requests; `config.timeout` is only reported in errors.
    pub fn with_client(http: reqwest::Client, config: TransportConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn identity(&self) -> &AppIdentity {
        &self.config.identity
    }

    /// Build `{base}{path}`, keeping any path prefix on the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Vendor headers for one call.
    fn headers(&self, ctx: CallContext<'_>) -> Result<HeaderMap, Error> {
        let identity = &self.config.identity;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        insert_header(&mut headers, "source", &identity.source)?;
        insert_header(&mut headers, "language", &identity.language)?;
        insert_header(&mut headers, "timezone", ctx.timezone)?;
        insert_header(&mut headers, "version", &identity.version)?;

        if let Some(token) = ctx.token {
            let mut value = HeaderValue::from_str(token).map_err(|e| Error::Authentication {
                message: format!("session token is not a valid header value: {e}"),
            })?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static("token"), value);
        }

        Ok(headers)
    }

    /// POST `body` to `path` and parse the `{code, data, msg}` envelope.
    ///
    /// The envelope is returned as-is, whatever its code; interpreting it is
    /// the session's job.
    pub async fn send(
        &self,
        path: &str,
        body: &Value,
        ctx: CallContext<'_>,
    ) -> Result<Envelope<Value>, Error> {
        let url = self.url(path)?;
        let headers = self.headers(ctx)?;
        debug!(authenticated = ctx.token.is_some(), "POST {url}");

        let timeout = self.config.timeout;
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout))?;
        trace!(%status, bytes = text.len(), "response received");

        serde_json::from_str::<Envelope<Value>>(&text).map_err(|e| {
            if status.is_success() {
                Error::deserialization(&e, &text)
            } else {
                let preview: String = text.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("HTTP {status} without envelope: {preview:?}"),
                    body: text.clone(),
                }
            }
        })
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), Error> {
    let value = HeaderValue::from_str(value).map_err(|e| Error::Deserialization {
        message: format!("invalid value for header '{name}': {e}"),
        body: String::new(),
    })?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}
