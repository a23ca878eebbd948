use crate::{
    auth::{AuthProvider, CeremonyMode, CommandAuthenticator, LoginOutcome, LoginRequest},
    cli::{actions::session_manager, globals::GlobalArgs},
};
use anyhow::Result;
use std::process::ExitCode;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub mode: CeremonyMode,
    pub authenticator: String,
}

/// Execute the login action.
/// # Errors
/// Returns an error if the ceremony fails or the session cannot be stored.
pub async fn execute(args: Args) -> Result<ExitCode> {
    let authenticator = CommandAuthenticator::from_command_line(&args.authenticator)?;
    let manager = session_manager(&args.globals, authenticator)?;

    debug!(mode = ?args.mode, "starting ceremony");

    let request = LoginRequest {
        email: args.email,
        mode: args.mode,
    };

    match manager.login(request).await? {
        LoginOutcome::Authenticated => {
            println!(
                "Logged in, session stored in {}",
                args.globals.session_file.display()
            );
        }
        LoginOutcome::PendingVerification { email } => {
            println!(
                "Registration received. Check {email} for the confirmation link, then run `paios-auth verify-email <token>`."
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
