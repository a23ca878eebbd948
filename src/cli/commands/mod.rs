pub mod client;
pub mod logging;
pub mod login;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_RESOURCE: &str = "resource";
pub const ARG_ACTION: &str = "action";
pub const ARG_TOKEN: &str = "token";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("paios-auth")
        .about("Passkey sessions for the pAI-OS admin portal")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(login::subcommand())
        .subcommand(Command::new("logout").about("End the session here and on the server"))
        .subcommand(Command::new("status").about("Show whether a valid session is stored"))
        .subcommand(
            Command::new("permissions").about("Print the cached permission map as JSON"),
        )
        .subcommand(
            Command::new("can")
                .about("Check an action on a resource (exit status 1 when denied)")
                .arg(
                    Arg::new(ARG_RESOURCE)
                        .help("Resource identifier, e.g. assets")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_ACTION)
                        .help("list, show, create, edit or delete")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("verify-email")
                .about("Confirm a registration with the emailed token")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .help("Verification token from the email link")
                        .required(true),
                ),
        );

    let command = client::with_args(command);
    logging::with_args(command)
}
