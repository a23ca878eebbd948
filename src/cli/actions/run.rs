use crate::cli::actions::{access, login, session, verify, Action};
use anyhow::Result;
use std::process::ExitCode;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<ExitCode> {
    match action {
        Action::Login(args) => login::execute(args).await,
        Action::Logout(globals) => session::logout(&globals).await,
        Action::Status(globals) => session::status(&globals),
        Action::Permissions(globals) => access::permissions(&globals),
        Action::Can(args) => access::can(&args),
        Action::VerifyEmail(args) => verify::execute(args).await,
    }
}
