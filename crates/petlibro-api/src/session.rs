// Authenticated session over the PETLIBRO transport.
//
// Owns credentials and the bearer token, unwraps envelopes, and handles
// the session-expired sentinel with a single coalesced re-login followed
// by exactly one retry of the original call.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::ERROR_NOT_LOGGED_IN;
use crate::auth::{Credentials, hash_password};
use crate::error::Error;
use crate::models::{Envelope, LoginData};
use crate::transport::{CallContext, Transport, TransportConfig};

const LOGIN_PATH: &str = "/member/auth/login";

type SharedLogin = Shared<BoxFuture<'static, Result<String, Error>>>;

/// Everything needed to build a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub transport: TransportConfig,
    pub credentials: Credentials,
    /// Token persisted by the host from an earlier login, if any.
    pub token: Option<String>,
}

/// Authenticated handle to the PETLIBRO cloud.
///
/// Cheaply cloneable; clones share credentials, token, and the in-flight
/// re-login. At most one re-login runs per session at any time.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    transport: Transport,
    credentials: RwLock<Credentials>,
    token: RwLock<Option<String>>,
    /// The re-login currently in flight. Never held across an `.await`.
    relogin: Mutex<Option<SharedLogin>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.inner.transport.config().base_url.as_str())
            .field("email", &read(&self.inner.credentials).email)
            .field("authenticated", &read(&self.inner.token).is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, Error> {
        let transport = Transport::new(config.transport)?;
        Ok(Self::with_transport(transport, config.credentials, config.token))
    }

    /// Build a session over an existing transport.
    pub fn with_transport(
        transport: Transport,
        credentials: Credentials,
        token: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                transport,
                credentials: RwLock::new(credentials),
                token: RwLock::new(token.filter(|t| !t.is_empty())),
                relogin: Mutex::new(None),
            }),
        }
    }

    // ── Token & credential accessors ──────────────────────────────────

    /// Current bearer token, for the host to persist.
    pub fn token(&self) -> Option<String> {
        read(&self.inner.token).clone()
    }

    /// Replace the bearer token (e.g. restored from host storage).
    /// An empty string clears it.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        *write(&self.inner.token) = (!token.is_empty()).then_some(token);
    }

    pub fn clear_token(&self) {
        *write(&self.inner.token) = None;
    }

    /// Snapshot of the credentials the next re-login will use.
    pub fn credentials(&self) -> Credentials {
        read(&self.inner.credentials).clone()
    }

    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    // ── Login ─────────────────────────────────────────────────────────

    /// Log in with `email`/`password`, replacing the stored credentials
    /// and token on success.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<String, Error> {
        self.inner.login(email, password).await
    }

    // ── Requests ──────────────────────────────────────────────────────

    /// POST to `path`, unwrap the envelope, and decode `data` as `T`.
    ///
    /// On the session-expired sentinel the session re-authenticates (joining
    /// any re-login already in flight) and retries the call exactly once.
    /// Every other nonzero code fails immediately with [`Error::Api`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, Error> {
        let body = body.unwrap_or_else(|| json!({}));
        let (envelope, sent_with) = self.send(path, &body).await?;

        let envelope = if envelope.code == ERROR_NOT_LOGGED_IN {
            debug!(path, "session expired, re-authenticating");
            self.relogin(sent_with.as_deref()).await?;

            let (retry, _) = self.send(path, &body).await?;
            if !retry.is_success() {
                warn!(path, code = retry.code, "request failed after re-login");
                return Err(Error::Api {
                    code: retry.code,
                    message: retry.message(),
                });
            }
            retry
        } else if envelope.is_success() {
            envelope
        } else {
            return Err(Error::Api {
                code: envelope.code,
                message: envelope.message(),
            });
        };

        decode(&envelope.data)
    }

    /// One transport call with the current token and timezone. Returns the
    /// token the call was sent with so a later sentinel can be matched to it.
    async fn send(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<(Envelope<Value>, Option<String>), Error> {
        let token = self.token();
        let timezone = read(&self.inner.credentials).timezone.clone();
        let envelope = self
            .inner
            .transport
            .send(
                path,
                body,
                CallContext {
                    timezone: &timezone,
                    token: token.as_deref(),
                },
            )
            .await?;
        Ok((envelope, token))
    }

    /// Re-authenticate with the stored credentials, coalescing concurrent
    /// callers onto one login.
    ///
    /// `sent_with` is the token the failing request carried. If the token
    /// has already been replaced since then, a re-login has completed in the
    /// meantime and the caller can retry straight away.
    async fn relogin(&self, sent_with: Option<&str>) -> Result<(), Error> {
        let login = {
            let mut slot = lock(&self.inner.relogin);
            if let Some(in_flight) = slot.as_ref() {
                debug!("joining in-flight re-login");
                in_flight.clone()
            } else {
                let current = self.token();
                if current.is_some() && current.as_deref() != sent_with {
                    debug!("token already refreshed, skipping re-login");
                    return Ok(());
                }
                let login = Self::relogin_future(Arc::downgrade(&self.inner));
                *slot = Some(login.clone());
                login
            }
        };

        login.await.map(|_| ())
    }

    /// The login runs on its own task so it finishes, and frees the slot,
    /// even when every waiter has been dropped. Must be called with the
    /// `relogin` slot locked.
    fn relogin_future(inner: Weak<SessionInner>) -> SharedLogin {
        let task = tokio::spawn(async move {
            let inner = inner.upgrade().ok_or_else(|| Error::Authentication {
                message: "session dropped during re-login".into(),
            })?;
            let (email, password) = {
                let creds = read(&inner.credentials);
                (creds.email.clone(), creds.password.clone())
            };
            let result = inner.login(&email, &password).await;
            *lock(&inner.relogin) = None;
            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(Error::Authentication {
                    message: format!("re-login task failed: {e}"),
                })
            })
        }
        .boxed()
        .shared()
    }
}

impl SessionInner {
    async fn login(&self, email: &str, password: &SecretString) -> Result<String, Error> {
        let (region, timezone) = {
            let creds = read(&self.credentials);
            (creds.region.clone(), creds.timezone.clone())
        };
        let identity = self.transport.identity();

        let body = json!({
            "appId": identity.app_id,
            "appSn": identity.app_sn,
            "country": region,
            "email": email,
            "password": hash_password(password.expose_secret()),
            "phoneBrand": identity.phone_brand,
            "phoneSystemVersion": identity.phone_system_version,
            "timezone": timezone,
            "thirdId": Value::Null,
            "type": Value::Null,
        });

        debug!("logging in");
        let envelope = self
            .transport
            .send(
                LOGIN_PATH,
                &body,
                CallContext {
                    timezone: &timezone,
                    token: None,
                },
            )
            .await?;

        if !envelope.is_success() {
            warn!(code = envelope.code, "login rejected");
            return Err(Error::Authentication {
                message: envelope.message(),
            });
        }

        let data: LoginData = decode(&envelope.data)?;
        let token = data
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Deserialization {
                message: "login succeeded but returned no token".into(),
                body: envelope.data.to_string(),
            })?;

        *write(&self.token) = Some(token.clone());
        {
            let mut creds = write(&self.credentials);
            creds.email = email.to_owned();
            creds.password = password.clone();
        }

        info!("login successful");
        Ok(token)
    }
}

/// Decode an envelope payload into the caller's type.
fn decode<T: DeserializeOwned>(data: &Value) -> Result<T, Error> {
    T::deserialize(data).map_err(|e| Error::deserialization(&e, &data.to_string()))
}

// Lock poisoning only means another task panicked mid-update of a plain
// value; the value itself is still usable.

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
