//! `-v` / `PAIOS_LOG_LEVEL`. The flag counts, the variable takes a level name or
//! number; both select the default tracing level and `RUST_LOG` still wins.

use clap::{builder::ValueParser, Arg, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; the index is the verbosity count.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        let level = level.trim();
        let index = match level.parse::<usize>() {
            Ok(number) => Some(number).filter(|n| *n < LEVEL_NAMES.len()),
            Err(_) => LEVEL_NAMES
                .iter()
                .position(|name| name.eq_ignore_ascii_case(level)),
        };

        index
            .and_then(|i| u8::try_from(i).ok())
            .ok_or_else(|| {
                format!(
                    "invalid log level `{level}`, expected 0-4 or one of: {}",
                    LEVEL_NAMES.join(", ")
                )
            })
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("More output per -v: WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .long_help(
                "More output per -v: WARN, INFO, DEBUG, TRACE (default: ERROR). Logs go to stderr so command output on stdout stays parseable.",
            )
            .env("PAIOS_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

/// Default tracing level picked on the command line; `None` leaves errors only.
#[must_use]
pub fn level(matches: &ArgMatches) -> Option<Level> {
    match matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0) {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        with_args(Command::new("paios-auth"))
    }

    #[test]
    fn level_names_and_numbers_are_accepted() {
        let command = Command::new("test").arg(Arg::new("level").value_parser(validator_log_level()));

        for (input, expected) in [
            ("error", 0u8),
            ("WARN", 1),
            (" info ", 2),
            ("Debug", 3),
            ("trace", 4),
            ("0", 0),
            ("4", 4),
        ] {
            let matches = command
                .clone()
                .try_get_matches_from(["test", input])
                .unwrap();
            assert_eq!(matches.get_one::<u8>("level").copied(), Some(expected));
        }

        for input in ["5", "verbose", "-1", ""] {
            assert!(command.clone().try_get_matches_from(["test", input]).is_err());
        }
    }

    #[test]
    fn verbosity_count_maps_to_level() {
        temp_env::with_var("PAIOS_LOG_LEVEL", None::<&str>, || {
            let cases = [
                (vec!["paios-auth"], None),
                (vec!["paios-auth", "-v"], Some(Level::WARN)),
                (vec!["paios-auth", "-vv"], Some(Level::INFO)),
                (vec!["paios-auth", "-vvv"], Some(Level::DEBUG)),
                (vec!["paios-auth", "-vvvvvv"], Some(Level::TRACE)),
            ];
            for (args, expected) in cases {
                let matches = command().get_matches_from(args);
                assert_eq!(level(&matches), expected);
            }
        });
    }

    #[test]
    fn env_level_maps_to_level() {
        temp_env::with_var("PAIOS_LOG_LEVEL", Some("debug"), || {
            let matches = command().get_matches_from(["paios-auth"]);
            assert_eq!(level(&matches), Some(Level::DEBUG));
        });
    }
}
