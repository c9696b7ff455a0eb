//! Command dispatch: bridges CLI args -> `Reporter` calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod report;
pub mod reservations;

use innkeep_core::Reporter;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a PMS-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    reporter: &Reporter,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Auth(args) => auth::handle(reporter, args, global).await,
        Command::Reservations(args) => reservations::handle(reporter, args, global).await,
        Command::Report(args) => report::handle(reporter, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a PMS connection".into(),
        )),
    }
}
