pub mod access;
pub mod login;
pub mod session;
pub mod verify;

// Interpreter for `Action`, kept apart so this file only lists what exists.
mod run;

use crate::{
    auth::{Authenticator, CeremonyClient, FileSessionStore, SessionManager},
    cli::globals::GlobalArgs,
};
use anyhow::{Context, Result};
use std::process::ExitCode;

#[derive(Debug)]
pub enum Action {
    Login(login::Args),
    Logout(GlobalArgs),
    Status(GlobalArgs),
    Permissions(GlobalArgs),
    Can(access::Args),
    VerifyEmail(verify::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> Result<ExitCode> {
        run::execute(self).await
    }
}

/// Session manager backed by the session file of `globals`.
pub(crate) fn session_manager<A: Authenticator>(
    globals: &GlobalArgs,
    authenticator: A,
) -> Result<SessionManager<FileSessionStore, A>> {
    let config = globals.auth_config().context("invalid API settings")?;
    let ceremony = CeremonyClient::new(&config)?;

    Ok(SessionManager::new(
        ceremony,
        globals.session_store(),
        authenticator,
    ))
}
