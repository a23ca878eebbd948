use crate::{
    auth::{AuthError, AuthProvider, UnavailableAuthenticator},
    cli::{actions::session_manager, globals::GlobalArgs},
};
use anyhow::Result;
use chrono::DateTime;
use std::process::ExitCode;

/// Execute the logout action.
/// # Errors
/// Returns an error if the local session file cannot be removed.
pub async fn logout(globals: &GlobalArgs) -> Result<ExitCode> {
    let manager = session_manager(globals, UnavailableAuthenticator)?;
    manager.logout().await?;

    println!("Logged out");

    Ok(ExitCode::SUCCESS)
}

/// Print the session state. A missing or expired session exits with status 1.
/// # Errors
/// Returns an error if the session settings are invalid.
pub fn status(globals: &GlobalArgs) -> Result<ExitCode> {
    let manager = session_manager(globals, UnavailableAuthenticator)?;

    match manager.check_auth() {
        Ok(()) => {
            let Some(token) = manager.current_session() else {
                println!("Anonymous");
                return Ok(ExitCode::FAILURE);
            };

            let claims = token.claims();
            let expires = DateTime::from_timestamp(claims.exp, 0)
                .map_or_else(|| claims.exp.to_string(), |at| at.to_rfc3339());

            println!(
                "Authenticated as {} until {expires}",
                claims.sub.as_deref().unwrap_or("unknown subject")
            );
            if !claims.roles.is_empty() {
                println!("Roles: {}", claims.roles.join(", "));
            }

            Ok(ExitCode::SUCCESS)
        }
        Err(AuthError::ExpiredSession) => {
            println!("Anonymous (session expired)");
            Ok(ExitCode::FAILURE)
        }
        Err(_) => {
            println!("Anonymous");
            Ok(ExitCode::FAILURE)
        }
    }
}
