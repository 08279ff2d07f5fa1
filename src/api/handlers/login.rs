use axum::{body::Bytes, extract::Extension, http::HeaderMap, response::Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    SESSION_NOT_FOUND, bad_request, json_payload, ok, required, session_cookie, sso_error,
};
use crate::api::session::SessionStore;
use crate::sso::{LoginRequest, SsoClient};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    username: Option<String>,
    sms_code: Option<String>,
}

// axum handler for POST /api/login
#[instrument(skip_all)]
pub async fn login(
    headers: HeaderMap,
    client: Extension<SsoClient>,
    sessions: Extension<Arc<SessionStore>>,
    body: Bytes,
) -> Response {
    let Some(cookie) = session_cookie(&headers, &sessions).await else {
        return bad_request(SESSION_NOT_FOUND);
    };

    let payload: LoginPayload = match json_payload(&body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    let (Some(username), Some(sms_code)) = (
        required(payload.username.as_ref()),
        required(payload.sms_code.as_ref()),
    ) else {
        return bad_request("username and smsCode are required.");
    };

    match client
        .login(LoginRequest::new(username, sms_code, &cookie))
        .await
    {
        Ok(result) => {
            info!("login succeeded for {username}");
            ok(&result.body)
        }
        Err(err) => sso_error(&err),
    }
}
