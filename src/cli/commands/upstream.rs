use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

use crate::sso::{ClientConfig, DEFAULT_BASE_URL, Endpoints, SsoClient};

pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_USER_AGENT: &str = "user-agent";
pub const ARG_TIMEOUT: &str = "timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("SSO service base URL (scheme://host[:port])")
                .env("SUFE_SSO_BASE_URL")
                .default_value(DEFAULT_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_USER_AGENT)
                .long(ARG_USER_AGENT)
                .help("User-Agent sent upstream (default: desktop Firefox)")
                .env("SUFE_SSO_USER_AGENT")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Per-request upstream timeout in seconds, 0 disables it")
                .env("SUFE_SSO_TIMEOUT")
                .default_value("30")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub base_url: String,
    pub user_agent: Option<String>,
    pub timeout: Option<Duration>,
}

impl Options {
    /// # Errors
    /// Returns an error if the base URL is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let base_url = matches
            .get_one::<String>(ARG_BASE_URL)
            .cloned()
            .context("missing required argument: --base-url")?;
        let user_agent = matches.get_one::<String>(ARG_USER_AGENT).cloned();
        let timeout = matches
            .get_one::<u64>(ARG_TIMEOUT)
            .copied()
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs);

        Ok(Self {
            base_url,
            user_agent,
            timeout,
        })
    }

    /// Build the upstream client these options describe.
    ///
    /// # Errors
    /// Returns an error if the base URL does not parse or the HTTP client cannot be built.
    pub fn client(&self) -> Result<SsoClient> {
        let endpoints = Endpoints::parse(&self.base_url)
            .with_context(|| format!("invalid base URL: {}", self.base_url))?;
        let config = ClientConfig::new(endpoints)
            .with_user_agent(self.user_agent.clone())
            .with_timeout(self.timeout);

        SsoClient::new(config).context("failed to build HTTP client")
    }
}
