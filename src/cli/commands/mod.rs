pub mod logging;
pub mod upstream;

use clap::{
    Arg, ArgMatches, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_SERVE: &str = "serve";
pub const CMD_LOGIN: &str = "login";

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

    let command = Command::new("sufe-sso")
        .about("SUFE single sign-on SMS login client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(serve())
        .subcommand(login());

    let command = upstream::with_args(command);
    logging::with_args(command)
}

fn serve() -> Command {
    Command::new(CMD_SERVE)
        .about("Run the demo HTTP server exposing the login flow to a browser")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("3000")
                .env("SUFE_SSO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("session-ttl")
                .long("session-ttl")
                .help("Seconds a captcha session stays usable")
                .default_value("600")
                .env("SUFE_SSO_SESSION_TTL")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

fn login() -> Command {
    Command::new(CMD_LOGIN)
        .about("Walk through captcha, SMS, and login interactively")
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .help("Student or staff id (prompted when absent)")
                .env("SUFE_USERNAME"),
        )
        .arg(
            Arg::new("captcha-path")
                .long("captcha-path")
                .help("Where to write the captcha image")
                .default_value("captcha.png")
                .env("SUFE_SSO_CAPTCHA_PATH"),
        )
}

/// Matches of the selected subcommand, falling back to the root.
#[must_use]
pub fn leaf(matches: &ArgMatches) -> &ArgMatches {
    matches.subcommand().map_or(matches, |(_, sub)| sub)
}
