//! Auth subcommand handlers.
//!
//! Covers the operator side of the OAuth hand-off: print the consent URL,
//! trade the returned code for tokens, and inspect or refresh what is stored.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;

use innkeep_core::{CoreError, Reporter};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct AuthorizationUrl {
    url: String,
}

#[derive(Serialize)]
struct AuthStatus {
    authenticated: bool,
    saved_at: Option<DateTime<Utc>>,
    has_refresh_token: bool,
}

fn status_detail(status: &AuthStatus, color: bool) -> String {
    if !status.authenticated {
        let line = "Not authenticated";
        return if color {
            format!("{}\nRun `innkeep auth url` to start.", line.yellow())
        } else {
            format!("{line}\nRun `innkeep auth url` to start.")
        };
    }

    let saved = status
        .saved_at
        .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    let state = if color {
        "Authenticated".green().to_string()
    } else {
        "Authenticated".to_owned()
    };
    [
        format!("Status:         {state}"),
        format!("Saved at:       {saved}"),
        format!(
            "Refresh token:  {}",
            if status.has_refresh_token { "yes" } else { "no" }
        ),
    ]
    .join("\n")
}

pub async fn handle(reporter: &Reporter, args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let authority = reporter.authority();
    let color = output::should_color(&global.color);

    match args.command {
        AuthCommand::Url => {
            let url = AuthorizationUrl {
                url: authority.build_authorization_url().to_string(),
            };
            let out = output::render(&global.output, &url, |u| u.url.clone())?;
            output::print_output(&out, global.quiet);
        }

        AuthCommand::Exchange { code } => {
            let code = code.trim();
            if code.is_empty() {
                return Err(CliError::Validation {
                    field: "code".into(),
                    reason: "authorization code is empty".into(),
                });
            }
            let pair = authority
                .exchange_code(code)
                .await
                .map_err(CoreError::from)?;
            let status = AuthStatus {
                authenticated: true,
                saved_at: Some(pair.saved_at),
                has_refresh_token: pair.refresh_token.is_some(),
            };
            let out = output::render(&global.output, &status, |s| status_detail(s, color))?;
            output::print_output(&out, global.quiet);
        }

        AuthCommand::Refresh => {
            authority.refresh().await.map_err(CoreError::from)?;
            let out = output::render(&global.output, &current_status(reporter), |s| {
                status_detail(s, color)
            })?;
            output::print_output(&out, global.quiet);
        }

        AuthCommand::Status => {
            let out = output::render(&global.output, &current_status(reporter), |s| {
                status_detail(s, color)
            })?;
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}

fn current_status(reporter: &Reporter) -> AuthStatus {
    reporter
        .authority()
        .status()
        .map_or(
            AuthStatus {
                authenticated: false,
                saved_at: None,
                has_refresh_token: false,
            },
            |s| AuthStatus {
                authenticated: true,
                saved_at: Some(s.saved_at),
                has_refresh_token: s.has_refresh_token,
            },
        )
}
