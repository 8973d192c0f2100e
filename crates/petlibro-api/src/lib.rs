// petlibro-api: Async Rust client for the PETLIBRO pet-care cloud API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use auth::{Credentials, hash_password};
pub use client::ApiClient;
pub use error::Error;
pub use models::{DeviceListItem, DeviceRealInfo, DrinkWaterToday, Envelope, GrainStatus};
pub use session::{Session, SessionConfig};
pub use transport::{AppIdentity, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, Transport, TransportConfig};

/// Envelope code meaning the session token is missing, invalid, or expired.
pub const ERROR_NOT_LOGGED_IN: i64 = 1009;
