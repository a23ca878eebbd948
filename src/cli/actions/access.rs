use crate::{
    auth::{has_access, AuthProvider, PermissionMap, UnavailableAuthenticator},
    cli::{actions::session_manager, globals::GlobalArgs},
};
use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub resource: String,
    pub action: String,
}

/// Print the cached permission map as JSON.
/// # Errors
/// Returns an error if there is no valid session.
pub fn permissions(globals: &GlobalArgs) -> Result<ExitCode> {
    let manager = session_manager(globals, UnavailableAuthenticator)?;
    let permissions = manager.get_permissions()?;

    let json =
        serde_json::to_string_pretty(&permissions).context("failed to encode permissions")?;
    println!("{json}");

    Ok(ExitCode::SUCCESS)
}

/// Print `allow` or `deny`; denial exits with status 1.
/// Without a valid session every check is denied.
/// # Errors
/// Returns an error if the session settings are invalid.
pub fn can(args: &Args) -> Result<ExitCode> {
    let manager = session_manager(&args.globals, UnavailableAuthenticator)?;

    let permissions = manager.get_permissions().unwrap_or_else(|e| {
        debug!("no usable session: {}", e);
        PermissionMap::new()
    });

    if has_access(&args.resource, &args.action, &permissions) {
        println!("allow");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("deny");
        Ok(ExitCode::FAILURE)
    }
}
