//! Outbound header set shared by every upstream call.

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, HeaderMap, HeaderValue, PRAGMA,
    USER_AGENT,
};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:147.0) Gecko/20100101 Firefox/147.0";

/// `Accept` value used by the JSON endpoints (SMS send, login).
pub const ACCEPT_JSON: &str = "application/json, text/plain, */*";

/// Build the base header set for an upstream request.
///
/// An override that is not a valid header value falls back to [`DEFAULT_USER_AGENT`].
#[must_use]
pub fn base_headers(user_agent: Option<&str>) -> HeaderMap {
    let user_agent = user_agent
        .and_then(|ua| HeaderValue::from_str(ua).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_USER_AGENT));

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh_CN"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_headers_defaults() {
        let headers = base_headers(None);
        assert_eq!(headers.len(), 6);
        assert_eq!(
            headers.get(USER_AGENT).and_then(|v| v.to_str().ok()),
            Some(DEFAULT_USER_AGENT)
        );
        assert_eq!(headers.get(ACCEPT).and_then(|v| v.to_str().ok()), Some("*/*"));
        assert_eq!(
            headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()),
            Some("zh_CN")
        );
        assert_eq!(
            headers.get(CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some("no-cache")
        );
        assert_eq!(headers.get(PRAGMA).and_then(|v| v.to_str().ok()), Some("no-cache"));
        assert_eq!(
            headers.get(CONNECTION).and_then(|v| v.to_str().ok()),
            Some("keep-alive")
        );
    }

    #[test]
    fn base_headers_user_agent_override() {
        let headers = base_headers(Some("sufe-sso-test/1.0"));
        assert_eq!(
            headers.get(USER_AGENT).and_then(|v| v.to_str().ok()),
            Some("sufe-sso-test/1.0")
        );
    }

    #[test]
    fn base_headers_invalid_override_falls_back() {
        let headers = base_headers(Some("bad\nagent"));
        assert_eq!(
            headers.get(USER_AGENT).and_then(|v| v.to_str().ok()),
            Some(DEFAULT_USER_AGENT)
        );
    }
}
