//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

/// Copy of `cfg` safe to display.
fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    if shown.oauth.client_secret.is_some() {
        shown.oauth.client_secret = Some(MASK.into());
    }
    shown
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            client_id,
            redirect_uri,
            property_id,
            force,
        } => {
            let path = config::config_file(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let mut cfg = Config::default();
            cfg.oauth.client_id = client_id;
            cfg.oauth.redirect_uri = redirect_uri;
            cfg.pms.property_id = property_id;
            config::save_config(&cfg, &path)?;

            if !global.quiet {
                eprintln!("Config written to {}", path.display());
                eprintln!("Next: innkeep config set-secret, then innkeep auth url");
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let out = output::render(&global.output, &cfg, |c| {
                toml::to_string_pretty(c).unwrap_or_else(|e| format!("<unrenderable: {e}>"))
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_file(global).display().to_string(), false);
            Ok(())
        }

        ConfigCommand::SetSecret { from_env } => {
            let secret = match from_env {
                Some(var) => std::env::var(&var).map_err(|_| CliError::Validation {
                    field: "from-env".into(),
                    reason: format!("environment variable {var} is not set"),
                })?,
                None => rpassword::prompt_password("OAuth client secret: ").map_err(prompt_err)?,
            };
            let secret = secret.trim();
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "client secret".into(),
                    reason: "cannot be empty".into(),
                });
            }

            config::store_client_secret(secret)?;
            if !global.quiet {
                eprintln!("Client secret stored in the system keyring");
            }
            Ok(())
        }
    }
}
