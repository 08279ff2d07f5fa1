use axum::{body::Bytes, extract::Extension, http::HeaderMap, response::Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use super::{
    SESSION_NOT_FOUND, bad_request, json_payload, ok, required, session_cookie, sso_error,
};
use crate::api::session::SessionStore;
use crate::sso::{SmsRequest, SsoClient};

#[derive(Deserialize, Debug)]
pub struct SmsPayload {
    username: Option<String>,
    vcode: Option<String>,
}

// axum handler for POST /api/sms
#[instrument(skip_all)]
pub async fn sms(
    headers: HeaderMap,
    client: Extension<SsoClient>,
    sessions: Extension<Arc<SessionStore>>,
    body: Bytes,
) -> Response {
    let Some(cookie) = session_cookie(&headers, &sessions).await else {
        return bad_request(SESSION_NOT_FOUND);
    };

    let payload: SmsPayload = match json_payload(&body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    let (Some(username), Some(vcode)) = (
        required(payload.username.as_ref()),
        required(payload.vcode.as_ref()),
    ) else {
        return bad_request("username and vcode are required.");
    };

    match client
        .send_sms(SmsRequest::new(username, vcode, &cookie))
        .await
    {
        Ok(result) => ok(&result.body),
        Err(err) => sso_error(&err),
    }
}
