//! CLI configuration: a thin wrapper around `petlibro_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--email, --base-url, etc.).

use petlibro_api::SessionConfig;
use petlibro_core::ReconcilerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use petlibro_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Everything a cloud-bound command needs, resolved from config and flags.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub session: SessionConfig,
    pub reconciler: ReconcilerConfig,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Apply flag overrides on top of a profile.
///
/// CLI flag overrides take priority over profile values.
pub fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref email) = global.email {
        profile.email.clone_from(email);
    }
    if let Some(ref url) = global.base_url {
        profile.base_url = Some(url.clone());
    }
    if let Some(ref region) = global.region {
        profile.region.clone_from(region);
    }
    if let Some(ref timezone) = global.timezone {
        profile.timezone.clone_from(timezone);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}

/// Build the session and reconciler configs for the active profile.
///
/// Without a stored profile the account comes from `--email` alone, with
/// the password from `PETLIBRO_PASSWORD` or the keyring.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Resolved, CliError> {
    let profile_name = active_profile_name(global, config);

    let profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
            });
        }
        None => {
            let email = global.email.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(email)
        }
    };
    let profile = apply_overrides(profile, global);

    if profile.email.trim().is_empty() {
        return Err(CliError::Validation {
            field: "email".into(),
            reason: "cannot be empty".into(),
        });
    }

    let session =
        petlibro_config::profile_to_session_config(&profile, &profile_name, &config.defaults)?;
    let reconciler = petlibro_config::profile_to_reconciler_config(&profile, &config.defaults);

    Ok(Resolved {
        profile_name,
        session,
        reconciler,
    })
}
