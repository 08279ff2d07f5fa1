use clap::{Arg, ArgAction, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Highest verbosity step; anything above maps to TRACE anyway.
const MAX_VERBOSITY: u8 = 4;

/// Map a `SUFE_SSO_LOG_LEVEL` value to a `-v` count.
fn verbosity_from_name(level: &str) -> Option<u8> {
    match level.trim().to_ascii_lowercase().as_str() {
        "error" => Some(0),
        "warn" | "warning" => Some(1),
        "info" => Some(2),
        "debug" => Some(3),
        "trace" => Some(4),
        other => other.parse::<u8>().ok().filter(|n| *n <= MAX_VERBOSITY),
    }
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        verbosity_from_name(level)
            .ok_or_else(|| format!("invalid log level '{level}', use error|warn|info|debug|trace"))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log more (-v warn, -vv info, -vvv debug, -vvvv trace); RUST_LOG still applies")
            .env("SUFE_SSO_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
