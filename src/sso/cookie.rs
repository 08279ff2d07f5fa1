use reqwest::header::HeaderValue;
use std::fmt;

use super::error::{Error, Result};

/// Upstream session cookie (`NAME=value`) binding the captcha, SMS, and login steps.
///
/// The value is kept byte-for-byte as captured; it is never re-encoded.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionCookie(String);

impl SessionCookie {
    /// # Errors
    /// Returns `MissingSessionCookie` if the value is blank or not a valid header value.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() || HeaderValue::from_str(&value).is_err() {
            return Err(Error::MissingSessionCookie);
        }
        Ok(Self(value))
    }

    /// Extract the cookie from a `Set-Cookie` header: first `;`-delimited segment, trimmed.
    ///
    /// # Errors
    /// Returns `MissingSessionCookie` if that segment is empty.
    pub fn from_set_cookie(header: &str) -> Result<Self> {
        let first = header.split(';').next().unwrap_or_default().trim();
        Self::new(first)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cookie name, the part before `=`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.split_once('=').map_or(self.0.as_str(), |(name, _)| name)
    }

    pub(crate) fn header_value(&self) -> Result<HeaderValue> {
        HeaderValue::from_str(&self.0).map_err(|_| Error::MissingSessionCookie)
    }
}

// Session cookies are bearer credentials; keep the value out of logs.
impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.split_once('=') {
            Some((name, _)) => write!(f, "SessionCookie({name}=***)"),
            None => f.write_str("SessionCookie(***)"),
        }
    }
}
