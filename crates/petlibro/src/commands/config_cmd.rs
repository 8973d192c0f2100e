//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_password() -> Result<String, CliError> {
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(password)
}

/// Config with plaintext passwords masked, for display.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
    }
    cfg
}

fn config_detail(cfg: &Config) -> String {
    let mut lines = vec![
        format!("Config file:     {}", config::config_path().display()),
        format!(
            "Default profile: {}",
            cfg.default_profile.as_deref().unwrap_or("default")
        ),
        format!(
            "Defaults:        output={} color={} timeout={}s poll_interval={}s",
            cfg.defaults.output, cfg.defaults.color, cfg.defaults.timeout, cfg.defaults.poll_interval
        ),
    ];
    if cfg.profiles.is_empty() {
        lines.push("Profiles:        (none)".into());
    }
    for (name, profile) in &cfg.profiles {
        lines.push(String::new());
        lines.push(format!("[{name}]"));
        lines.push(output::detail_block(&[
            ("email", profile.email.clone()),
            ("region", profile.region.clone()),
            ("timezone", profile.timezone.clone()),
            (
                "base_url",
                profile.base_url.clone().unwrap_or_else(|| "(default)".into()),
            ),
            (
                "password",
                profile.password.clone().unwrap_or_else(|| "(keyring/env)".into()),
            ),
        ]));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("petlibro: configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Account
            let email: String = Input::new()
                .with_prompt("Account email")
                .interact_text()
                .map_err(prompt_err)?;
            let region: String = Input::new()
                .with_prompt("Account region")
                .default("US".into())
                .interact_text()
                .map_err(prompt_err)?;
            let timezone: String = Input::new()
                .with_prompt("Timezone")
                .default("UTC".into())
                .interact_text()
                .map_err(prompt_err)?;

            // 3. Password and where to keep it
            let password = prompt_password()?;
            let store_choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let store_selection = Select::new()
                .with_prompt("Where to store the password?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(email);
            profile.region = region.to_uppercase();
            profile.timezone = timezone;

            if store_selection == 0 {
                petlibro_config::store_password(&profile_name, &SecretString::from(password))?;
                eprintln!("   ✓ Password stored in system keyring");
            } else {
                profile.password = Some(password);
            }

            // 4. Merge into existing config
            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: petlibro login");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                config_detail,
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name =
                profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: config::available_profiles(&cfg),
                });
            }

            let password = prompt_password()?;
            petlibro_config::store_password(&profile_name, &SecretString::from(password))?;
            // A token from the old password is useless now.
            petlibro_config::clear_token(&profile_name)?;

            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_masks_only_plaintext_passwords() {
        let mut with_password = Profile::new("a@example.com");
        with_password.password = Some("hunter2".into());

        let mut cfg = Config::default();
        cfg.profiles.insert("plain".into(), with_password);
        cfg.profiles.insert("keyring".into(), Profile::new("b@example.com"));

        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["plain"].password.as_deref(), Some("********"));
        assert_eq!(shown.profiles["keyring"].password, None);
        assert!(!config_detail(&shown).contains("hunter2"));
    }
}
