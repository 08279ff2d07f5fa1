use crate::cli::{
    actions::{Action, login, server},
    commands::{CMD_LOGIN, CMD_SERVE, upstream::Options},
};
use anyhow::{Context, Result, bail};
use std::{path::PathBuf, time::Duration};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((CMD_SERVE, sub)) => {
            let port = sub.get_one::<u16>("port").copied().unwrap_or(3000);
            let session_ttl = sub
                .get_one::<u64>("session-ttl")
                .copied()
                .map(Duration::from_secs)
                .context("missing required argument: --session-ttl")?;

            Ok(Action::Server(server::Args {
                port,
                session_ttl,
                upstream: Options::parse(sub)?,
            }))
        }
        Some((CMD_LOGIN, sub)) => {
            let captcha_path = sub
                .get_one::<String>("captcha-path")
                .map(PathBuf::from)
                .context("missing required argument: --captcha-path")?;

            Ok(Action::Login(login::Args {
                username: sub.get_one::<String>("username").cloned(),
                captcha_path,
                upstream: Options::parse(sub)?,
            }))
        }
        Some((other, _)) => bail!("unknown subcommand: {other}"),
        None => bail!("a subcommand is required"),
    }
}
