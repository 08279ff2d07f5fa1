use crate::{
    api::{self, SessionStore},
    cli::commands::upstream::Options,
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub session_ttl: Duration,
    pub upstream: Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the upstream client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let client = args.upstream.client()?;
    let sessions = Arc::new(SessionStore::new(args.session_ttl));

    api::new(args.port, client, sessions).await
}

fn log_startup_args(args: &Args) {
    info!(
        "Starting demo server: port={}, upstream={}, session_ttl={}s",
        args.port,
        args.upstream.base_url,
        args.session_ttl.as_secs()
    );
    debug!(
        "Upstream options: user_agent={}, timeout={:?}",
        args.upstream.user_agent.as_deref().unwrap_or("<default>"),
        args.upstream.timeout
    );
}
