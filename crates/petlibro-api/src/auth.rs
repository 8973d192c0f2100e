use md5::{Digest, Md5};
use secrecy::SecretString;

/// Account credentials for the PETLIBRO cloud.
///
/// The password is kept in plain form (wrapped in [`SecretString`]) and only
/// hashed when a login request is built.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
    /// Two-letter account region sent as `country` on login (e.g. `US`).
    pub region: String,
    /// IANA timezone sent on login and as the `timezone` header.
    pub timezone: String,
}

impl Credentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        region: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
            region: region.into(),
            timezone: timezone.into(),
        }
    }
}

/// Hash a password the way the vendor login endpoint expects: unsalted
/// MD5, lowercase hex.
pub fn hash_password(password: &str) -> String {
    hex::encode(Md5::digest(password.as_bytes()))
}
