//! Login, logout, and session token persistence.

use petlibro_api::ApiClient;
use tracing::{debug, warn};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// Log in with the stored credentials unless a token was restored.
pub async fn ensure_login(api: &ApiClient) -> Result<(), CliError> {
    if api.session().token().is_some() {
        return Ok(());
    }
    debug!("no stored token, logging in");
    let credentials = api.session().credentials();
    api.login(&credentials.email, &credentials.password).await?;
    Ok(())
}

pub async fn login(api: &ApiClient, global: &GlobalOpts) -> Result<(), CliError> {
    let credentials = api.session().credentials();
    api.login(&credentials.email, &credentials.password).await?;
    if !global.quiet {
        eprintln!("✓ Logged in as {}", credentials.email);
    }
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    petlibro_config::clear_token(&profile_name)?;
    if !global.quiet {
        eprintln!("✓ Session token removed for profile '{profile_name}'");
    }
    Ok(())
}

/// Write the session's token back to the keyring if it changed.
///
/// Failures only warn: the next run logs in again.
pub fn persist_token(profile_name: &str, restored: Option<&str>, api: &ApiClient) {
    let Some(token) = api.session().token() else {
        return;
    };
    if restored == Some(token.as_str()) {
        return;
    }
    match petlibro_config::store_token(profile_name, &token) {
        Ok(()) => debug!(profile = profile_name, "session token stored"),
        Err(e) => warn!(profile = profile_name, error = %e, "could not store session token"),
    }
}
