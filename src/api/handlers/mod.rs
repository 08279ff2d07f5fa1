pub mod captcha;
pub use self::captcha::captcha;

pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

pub mod sms;
pub use self::sms::sms;

// common functions for the handlers
use axum::{
    http::{HeaderMap, StatusCode, header::COOKIE},
    response::{IntoResponse, Json, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::session::SessionStore;
use crate::sso::{self, ErrorKind, SessionCookie};

/// Name of the browser cookie carrying the local session id.
pub const SESSION_COOKIE_NAME: &str = "sufe_sid";

pub const SESSION_NOT_FOUND: &str = "Session not found, fetch captcha first.";

#[derive(Serialize, Debug)]
pub struct ApiError {
    ok: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
}

/// 400 with `{ ok: false, error }` for request problems caught locally.
pub fn bad_request(message: &str) -> Response {
    let body = ApiError {
        ok: false,
        error: message.to_string(),
        kind: None,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// 400 with `{ ok: false, error, kind }` for a failed upstream step.
pub fn sso_error(err: &sso::Error) -> Response {
    if err.is_business() {
        debug!("upstream rejected request: {err}");
    } else {
        warn!("upstream step failed: {err}");
    }
    let body = ApiError {
        ok: false,
        error: err.to_string(),
        kind: Some(err.kind()),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

pub fn ok<T: Serialize>(result: &T) -> Response {
    (StatusCode::OK, Json(json!({ "ok": true, "result": result }))).into_response()
}

/// Decode a JSON request body whatever its `Content-Type`; a bad body is a 400.
pub(crate) fn json_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|err| bad_request(&format!("invalid JSON body: {err}")))
}

/// Read the local session id from the `Cookie` header.
pub fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(COOKIE)?.to_str().ok()?;
    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let Some(val) = parts.next() else {
            continue;
        };
        if key == SESSION_COOKIE_NAME {
            return Some(val.trim().to_string());
        }
    }
    None
}

/// Resolve the upstream cookie bound to the caller's browser session.
pub async fn session_cookie(headers: &HeaderMap, sessions: &Arc<SessionStore>) -> Option<SessionCookie> {
    let session_id = extract_session_id(headers)?;
    sessions.resolve(&session_id).await
}

/// Treat missing and empty strings alike.
pub(crate) fn required(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}
