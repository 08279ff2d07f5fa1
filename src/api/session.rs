//! In-memory map from browser session ids to upstream SSO cookies.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::sso::SessionCookie;

pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 10 * 60;

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub cookie: SessionCookie,
    created_at: Instant,
}

impl SessionRecord {
    fn is_live(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() < ttl
    }
}

#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    records: Mutex<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            records: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `cookie` under a freshly minted id and return the id.
    ///
    /// Expired entries are evicted on every call.
    ///
    /// # Errors
    /// Returns an error if the OS random number generator fails.
    pub async fn create(&self, cookie: SessionCookie) -> Result<String> {
        let session_id = generate_session_id()?;
        let mut records = self.records.lock().await;
        records.retain(|_, record| record.is_live(self.ttl));
        records.insert(
            session_id.clone(),
            SessionRecord {
                cookie,
                created_at: Instant::now(),
            },
        );
        debug!("session created, {} live", records.len());
        Ok(session_id)
    }

    /// Look up the cookie for `session_id`; unknown or expired ids yield `None`.
    pub async fn resolve(&self, session_id: &str) -> Option<SessionCookie> {
        let records = self.records.lock().await;
        records
            .get(session_id)
            .filter(|record| record.is_live(self.ttl))
            .map(|record| record.cookie.clone())
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS))
    }
}

/// 256-bit id from the OS RNG, URL-safe base64 without padding.
fn generate_session_id() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session id")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}
