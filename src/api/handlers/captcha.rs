use axum::{
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

use super::{SESSION_COOKIE_NAME, sso_error};
use crate::api::session::SessionStore;
use crate::sso::SsoClient;

// axum handler for GET /api/captcha
#[instrument(skip_all)]
pub async fn captcha(
    client: Extension<SsoClient>,
    sessions: Extension<Arc<SessionStore>>,
) -> Response {
    let captcha = match client.fetch_captcha(None).await {
        Ok(captcha) => captcha,
        Err(err) => return sso_error(&err),
    };

    let session_id = match sessions.create(captcha.cookie).await {
        Ok(id) => id,
        Err(err) => {
            error!("Failed to create session: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Ok(cookie) = HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={session_id}; Path=/; HttpOnly; SameSite=Lax"
    )) else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(SET_COOKIE, cookie);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    (StatusCode::OK, headers, captcha.image).into_response()
}
