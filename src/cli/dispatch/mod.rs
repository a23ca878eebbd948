//! Maps parsed CLI arguments to the action the binary executes.

use crate::cli::{
    actions::{access, login, verify, Action},
    commands::{self, client},
    globals::GlobalArgs,
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::new(client::Options::parse(matches)?);

    // Closure to fetch a required positional of a subcommand
    let required = |sub_m: &clap::ArgMatches, id: &str| -> Result<String> {
        sub_m
            .get_one::<String>(id)
            .cloned()
            .with_context(|| format!("missing required argument: <{id}>"))
    };

    match matches.subcommand() {
        Some(("login", sub_m)) => {
            let options = commands::login::Options::parse(sub_m)?;
            Ok(Action::Login(login::Args {
                globals,
                email: options.email,
                mode: options.mode,
                authenticator: options.authenticator,
            }))
        }
        Some(("logout", _)) => Ok(Action::Logout(globals)),
        Some(("status", _)) => Ok(Action::Status(globals)),
        Some(("permissions", _)) => Ok(Action::Permissions(globals)),
        Some(("can", sub_m)) => Ok(Action::Can(access::Args {
            globals,
            resource: required(sub_m, commands::ARG_RESOURCE)?,
            action: required(sub_m, commands::ARG_ACTION)?,
        })),
        Some(("verify-email", sub_m)) => Ok(Action::VerifyEmail(verify::Args {
            globals,
            token: SecretString::from(required(sub_m, commands::ARG_TOKEN)?),
        })),
        _ => anyhow::bail!("no subcommand given, see --help"),
    }
}
