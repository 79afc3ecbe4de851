//! Config subcommand handlers.

use std::io::IsTerminal;
use std::path::Path;

use dialoguer::{Confirm, Input, Select};

use wikifs_config::{Config, SiteEntry};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// The config with every secret replaced by a mask.
fn masked(mut cfg: Config) -> Config {
    for site in cfg.sites.values_mut() {
        if site.password.is_some() {
            site.password = Some(MASK.into());
        }
        if site.http_auth_password.is_some() {
            site.http_auth_password = Some(MASK.into());
        }
    }
    cfg
}

/// Guided setup of one site.
fn prompt_site() -> Result<(String, SiteEntry), CliError> {
    let name: String = Input::new()
        .with_prompt("Site directory name")
        .default("wikipedia-en".into())
        .interact_text()
        .map_err(prompt_err)?;

    let host: String = Input::new()
        .with_prompt("Wiki host")
        .default("en.wikipedia.org".into())
        .interact_text()
        .map_err(prompt_err)?;

    let mut site = SiteEntry::new(host);

    site.base_path = Input::new()
        .with_prompt("Index script path")
        .default(site.base_path.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let login = Confirm::new()
        .with_prompt("Log in with a wiki account?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    if !login {
        return Ok((name, site));
    }

    let username: String = Input::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(prompt_err)?;
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if username.is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }
    site.username = Some(username);

    let store_choices = &[
        "Store password in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if store_selection == 0 {
        wikifs_config::store_password(&name, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
    } else {
        site.password = Some(password);
    }
    Ok((name, site))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, path: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: guided in a terminal, sample otherwise ────────────
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    ),
                });
            }

            let cfg = if std::io::stdin().is_terminal() {
                eprintln!("wikifs configuration");
                eprintln!("   Config path: {}\n", path.display());
                let (name, site) = prompt_site()?;
                let mut cfg = Config::default();
                cfg.sites.insert(name, site);
                cfg
            } else {
                Config::sample()
            };

            wikifs_config::save_config_to(&cfg, path)?;
            if !global.quiet {
                eprintln!("✓ Configuration written to {}", path.display());
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = masked(wikifs_config::load_config_from(path)?);
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?} ({e})")),
                |c| c.sites.keys().cloned().collect::<Vec<_>>().join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { site } => {
            let cfg = wikifs_config::load_config_from(path)?;
            let entry = cfg.site(&site)?;
            if entry.username.is_none() {
                eprintln!("note: site '{site}' has no username; the password is unused until one is set");
            }

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            wikifs_config::store_password(&site, &secret)?;
            eprintln!("✓ Password stored in system keyring for site '{site}'");
            Ok(())
        }
    }
}
