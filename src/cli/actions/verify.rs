use crate::{
    auth::UnavailableAuthenticator,
    cli::{actions::session_manager, globals::GlobalArgs},
};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::process::ExitCode;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub token: SecretString,
}

/// Execute the verify-email action.
/// # Errors
/// Returns an error if the server rejects the token.
pub async fn execute(args: Args) -> Result<ExitCode> {
    let manager = session_manager(&args.globals, UnavailableAuthenticator)?;
    let message = manager.verify_email(args.token.expose_secret()).await?;

    println!("{message}");
    println!("You can now log in with `paios-auth login`.");

    Ok(ExitCode::SUCCESS)
}
