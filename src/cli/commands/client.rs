use crate::config::{default_session_file, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS};
use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_SESSION_FILE: &str = "session-file";
pub const ARG_TIMEOUT: &str = "timeout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub api_url: String,
    pub session_file: PathBuf,
    pub timeout: u64,
}

impl Options {
    /// Parse API client arguments from matches.
    ///
    /// # Errors
    /// Returns an error if no session file was given and no config directory exists.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let api_url = matches
            .get_one::<String>(ARG_API_URL)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let session_file = match matches
            .get_one::<String>(ARG_SESSION_FILE)
            .filter(|v| !v.trim().is_empty())
        {
            Some(path) => PathBuf::from(path),
            None => default_session_file().context(
                "no config directory found, pass --session-file or set PAIOS_SESSION_FILE",
            )?,
        };

        let timeout = matches
            .get_one::<u64>(ARG_TIMEOUT)
            .copied()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            session_file,
            timeout,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the portal API")
                .env("PAIOS_API_URL")
                .default_value(DEFAULT_API_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .long(ARG_SESSION_FILE)
                .help("Where the session token and permissions are kept")
                .long_help(
                    "Where the session token and permissions are kept. Defaults to paios/session.json under the user config directory.",
                )
                .env("PAIOS_SESSION_FILE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("HTTP request timeout in seconds")
                .env("PAIOS_TIMEOUT")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
}
