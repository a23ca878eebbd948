use crate::auth::CeremonyMode;
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_EMAIL: &str = "email";
pub const ARG_REGISTER: &str = "register";
pub const ARG_LOGIN: &str = "login";
pub const ARG_AUTHENTICATOR: &str = "authenticator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub email: String,
    pub mode: CeremonyMode,
    pub authenticator: String,
}

impl Options {
    /// Parse login arguments from the `login` subcommand matches.
    ///
    /// # Errors
    /// Returns an error if the email or authenticator command is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let email = match matches.get_one::<String>(ARG_EMAIL) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => anyhow::bail!("missing required argument: --{ARG_EMAIL}"),
        };

        let authenticator = match matches.get_one::<String>(ARG_AUTHENTICATOR) {
            Some(value) if !value.trim().is_empty() => value.clone(),
            _ => anyhow::bail!("missing required argument: --{ARG_AUTHENTICATOR}"),
        };

        let mode = if matches.get_flag(ARG_REGISTER) {
            CeremonyMode::Register
        } else if matches.get_flag(ARG_LOGIN) {
            CeremonyMode::Login
        } else {
            CeremonyMode::Auto
        };

        Ok(Self {
            email,
            mode,
            authenticator,
        })
    }
}

#[must_use]
pub fn subcommand() -> Command {
    Command::new("login")
        .about("Register or log in with a passkey")
        .long_about(
            "Runs a WebAuthn ceremony for the given email. Without --register or --login the server decides which ceremony to run.",
        )
        .arg(
            Arg::new(ARG_EMAIL)
                .short('e')
                .long(ARG_EMAIL)
                .help("Email identity")
                .required(true),
        )
        .arg(
            Arg::new(ARG_REGISTER)
                .long(ARG_REGISTER)
                .help("Force a registration ceremony")
                .action(ArgAction::SetTrue)
                .conflicts_with(ARG_LOGIN),
        )
        .arg(
            Arg::new(ARG_LOGIN)
                .long(ARG_LOGIN)
                .help("Force a login ceremony")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_AUTHENTICATOR)
                .short('a')
                .long(ARG_AUTHENTICATOR)
                .help("Authenticator helper command")
                .long_help(
                    "Authenticator helper command. It is called with `register` or `login` appended, receives the publicKey options as JSON on stdin, and prints the credential JSON on stdout. The value is split on whitespace without shell quoting, so a helper path or argument containing spaces has to go through a wrapper script.",
                )
                .env("PAIOS_AUTHENTICATOR")
                .required(true),
        )
}
