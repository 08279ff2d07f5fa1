//! HTTP client for the three-step SMS login handshake.
//!
//! [`SsoClient`] holds no session state: the [`SessionCookie`] returned by
//! [`SsoClient::fetch_captcha`] must be handed back on every later step.

use reqwest::{
    Client, RequestBuilder, Response, StatusCode, Url,
    header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderValue, SET_COOKIE},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{Instrument, debug, info_span};

use super::{
    cookie::SessionCookie,
    envelope::{
        ResponseEnvelope, assert_sso_success, parse_json_body, parse_sso_response,
        raw_error_detail,
    },
    error::{Error, Result, SsoAction},
    headers::{ACCEPT_JSON, base_headers},
};

pub const DEFAULT_BASE_URL: &str = "https://login.sufe.edu.cn";
pub const CAPTCHA_PATH: &str = "/esc-sso/api/v1/image/getRandcode";
pub const SMS_SEND_PATH: &str = "/esc-sso/api/v3/sms/send";
pub const LOGIN_PATH: &str = "/esc-sso/api/v3/auth/doLogin";

const AUTH_TYPE_WEB_SMS: &str = "webSmsAuth";

/// Loosely typed scalar returned by the SMS endpoint (remaining-send count or similar).
pub type SmsSendData = Value;

/// Typed view of the login `data` object.
///
/// Fields the service sends but this struct does not name are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_logins: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoginData {
    /// Read the known fields out of `data`, tolerating unexpected shapes.
    ///
    /// `failedLogins` may arrive as a number or a numeric string. A field whose value has
    /// another type stays in `extra`; a non-object `data` yields an empty view.
    #[must_use]
    pub fn from_value(data: &Value) -> Self {
        let Some(fields) = data.as_object() else {
            return Self::default();
        };
        let mut extra = fields.clone();

        let redirect = take(&mut extra, "redirect", |v| v.as_str().map(str::to_string));
        let failed_logins = take(&mut extra, "failedLogins", |v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        });
        let auth_type = take(&mut extra, "authType", |v| v.as_str().map(str::to_string));

        Self {
            redirect,
            failed_logins,
            auth_type,
            extra,
        }
    }
}

fn take<T>(
    fields: &mut Map<String, Value>,
    key: &str,
    read: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.get(key).and_then(read)?;
    fields.remove(key);
    Some(value)
}

#[derive(Debug, Clone)]
pub struct CaptchaResult {
    pub cookie: SessionCookie,
    pub image: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SmsSendResult {
    pub status: StatusCode,
    pub body: ResponseEnvelope<SmsSendData>,
    pub cookie: SessionCookie,
    /// Request URL including the query string that was sent.
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub status: StatusCode,
    /// Envelope as received; `data` is left untyped.
    pub body: ResponseEnvelope<Value>,
    pub cookie: SessionCookie,
}

impl LoginResult {
    #[must_use]
    pub fn data(&self) -> LoginData {
        LoginData::from_value(&self.body.data)
    }
}

/// Upstream endpoint URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub captcha: Url,
    pub sms_send: Url,
    pub login: Url,
}

impl Endpoints {
    /// Resolve the endpoint paths against a base URL (scheme, host, optional port).
    ///
    /// # Errors
    /// Returns an error if `base` is not a valid absolute URL.
    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base)?;
        Ok(Self {
            captcha: base.join(CAPTCHA_PATH)?,
            sms_send: base.join(SMS_SEND_PATH)?,
            login: base.join(LOGIN_PATH)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    endpoints: Endpoints,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl ClientConfig {
    #[must_use]
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            user_agent: None,
            timeout: None,
        }
    }

    /// Default user agent for every call; per-request overrides still win.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[derive(Debug, Clone)]
pub struct SmsRequest<'a> {
    pub username: &'a str,
    /// Code displayed on the captcha image.
    pub vcode: &'a str,
    pub cookie: &'a SessionCookie,
    /// Cache-busting `_` parameter in milliseconds; defaults to now.
    pub timestamp: Option<u64>,
    pub user_agent: Option<&'a str>,
}

impl<'a> SmsRequest<'a> {
    #[must_use]
    pub fn new(username: &'a str, vcode: &'a str, cookie: &'a SessionCookie) -> Self {
        Self {
            username,
            vcode,
            cookie,
            timestamp: None,
            user_agent: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &'a str) -> Self {
        self.user_agent = Some(user_agent);
        self
    }
}

#[derive(Debug, Clone)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub sms_code: &'a str,
    pub cookie: &'a SessionCookie,
    pub user_agent: Option<&'a str>,
}

impl<'a> LoginRequest<'a> {
    #[must_use]
    pub fn new(username: &'a str, sms_code: &'a str, cookie: &'a SessionCookie) -> Self {
        Self {
            username,
            sms_code,
            cookie,
            user_agent: None,
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &'a str) -> Self {
        self.user_agent = Some(user_agent);
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload<'a> {
    auth_type: &'static str,
    data_field: LoginDataField<'a>,
    redirect_uri: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginDataField<'a> {
    username: &'a str,
    password: &'static str,
    sms_code: &'a str,
    vcode: &'static str,
}

#[derive(Debug, Clone)]
pub struct SsoClient {
    http: Client,
    config: ClientConfig,
}

impl SsoClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built (TLS backend init).
    pub fn new(config: ClientConfig) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a session: download the captcha image and capture the session cookie.
    ///
    /// # Errors
    /// `Request` if no response arrives, `Transport` on non-2xx, `MissingSessionCookie` if
    /// the response carries no usable `Set-Cookie`.
    pub async fn fetch_captcha(&self, user_agent: Option<&str>) -> Result<CaptchaResult> {
        let action = SsoAction::FetchCaptcha;
        let url = self.config.endpoints.captcha.clone();
        let headers = base_headers(user_agent.or(self.config.user_agent()));

        let span = info_span!("sso.fetch_captcha", http.method = "GET", url = %url);
        let response = send(action, self.http.get(url).headers(headers))
            .instrument(span)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(action, response).await?;
            return Err(transport_error(action, status, &body));
        }

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .ok_or(Error::MissingSessionCookie)
            .and_then(SessionCookie::from_set_cookie)?;

        let image = read_body(action, response).await?;
        debug!(
            "captcha fetched: {} bytes, cookie {}",
            image.len(),
            cookie.name()
        );

        Ok(CaptchaResult { cookie, image })
    }

    /// Ask the service to text a login code, proving the captcha was read.
    ///
    /// # Errors
    /// `Business` when the captcha code is rejected; `Transport`, `NonJsonResponse`,
    /// `InvalidEnvelope`, or `Request` for protocol-level failures.
    pub async fn send_sms(&self, request: SmsRequest<'_>) -> Result<SmsSendResult> {
        let action = SsoAction::SendSms;
        let timestamp = request.timestamp.unwrap_or_else(now_millis);

        let mut url = self.config.endpoints.sms_send.clone();
        url.query_pairs_mut()
            .append_pair("username", request.username)
            .append_pair("vcode", request.vcode)
            .append_pair("_", &timestamp.to_string());

        let mut headers = base_headers(request.user_agent.or(self.config.user_agent()));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(COOKIE, request.cookie.header_value()?);

        let span = info_span!(
            "sso.send_sms",
            http.method = "GET",
            url = %self.config.endpoints.sms_send,
            username = request.username
        );
        let response = send(action, self.http.get(url.clone()).headers(headers))
            .instrument(span)
            .await?;

        let status = response.status();
        let body = read_body(action, response).await?;
        if !status.is_success() {
            return Err(transport_error(action, status, &body));
        }

        let envelope = decode_envelope(action, &body)?;
        debug!("SMS sent for {}: {}", request.username, envelope.msg);

        Ok(SmsSendResult {
            status,
            body: envelope,
            cookie: request.cookie.clone(),
            url: url.to_string(),
        })
    }

    /// Submit the SMS code for the session.
    ///
    /// # Errors
    /// `Business` when the SMS code is wrong (the message usually states the remaining
    /// attempts); `Transport`, `NonJsonResponse`, `InvalidEnvelope`, or `Request` otherwise.
    pub async fn login(&self, request: LoginRequest<'_>) -> Result<LoginResult> {
        let action = SsoAction::Login;
        let payload = LoginPayload {
            auth_type: AUTH_TYPE_WEB_SMS,
            data_field: LoginDataField {
                username: request.username,
                password: "",
                sms_code: request.sms_code,
                vcode: "",
            },
            redirect_uri: "",
        };

        let mut headers = base_headers(request.user_agent.or(self.config.user_agent()));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(COOKIE, request.cookie.header_value()?);

        let url = self.config.endpoints.login.clone();
        let span = info_span!(
            "sso.login",
            http.method = "POST",
            url = %url,
            username = request.username
        );
        let response = send(action, self.http.post(url).headers(headers).json(&payload))
            .instrument(span)
            .await?;

        let status = response.status();
        let body = read_body(action, response).await?;
        if !status.is_success() {
            return Err(transport_error(action, status, &body));
        }

        let envelope: ResponseEnvelope<Value> = decode_envelope(action, &body)?;
        debug!(
            "login accepted for {}, failed logins: {:?}",
            request.username,
            LoginData::from_value(&envelope.data).failed_logins
        );

        Ok(LoginResult {
            status,
            body: envelope,
            cookie: request.cookie.clone(),
        })
    }
}

async fn send(action: SsoAction, request: RequestBuilder) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|source| Error::Request { action, source })
}

async fn read_body(action: SsoAction, response: Response) -> Result<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|source| Error::Request { action, source })
}

fn transport_error(action: SsoAction, status: StatusCode, body: &[u8]) -> Error {
    Error::Transport {
        action,
        status,
        detail: raw_error_detail(body),
    }
}

fn decode_envelope<T: DeserializeOwned>(
    action: SsoAction,
    body: &[u8],
) -> Result<ResponseEnvelope<T>> {
    let envelope = parse_sso_response(parse_json_body(body)?, action)?;
    assert_sso_success(&envelope, action)?;
    envelope.decode_data(action)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sso::headers::DEFAULT_USER_AGENT;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COOKIE_VALUE: &str = "JSESSIONID=test";
    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(server: &MockServer) -> SsoClient {
        let endpoints = Endpoints::parse(&server.uri()).unwrap();
        SsoClient::new(ClientConfig::new(endpoints)).unwrap()
    }

    fn cookie() -> SessionCookie {
        SessionCookie::new(COOKIE_VALUE).unwrap()
    }

    #[test]
    fn endpoints_point_to_sufe_login_service() {
        let endpoints = Endpoints::parse(DEFAULT_BASE_URL).unwrap();
        assert_eq!(endpoints.captcha.host_str(), Some("login.sufe.edu.cn"));
        assert!(endpoints.sms_send.path().ends_with("/api/v3/sms/send"));
        assert!(endpoints.login.path().ends_with("/api/v3/auth/doLogin"));
    }

    #[test]
    fn endpoints_reject_relative_base() {
        assert!(Endpoints::parse("login.sufe.edu.cn").is_err());
    }

    #[test]
    fn login_payload_shape() {
        let payload = LoginPayload {
            auth_type: AUTH_TYPE_WEB_SMS,
            data_field: LoginDataField {
                username: "20220001",
                password: "",
                sms_code: "123456",
                vcode: "",
            },
            redirect_uri: "",
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "authType": "webSmsAuth",
                "dataField": {
                    "username": "20220001",
                    "password": "",
                    "smsCode": "123456",
                    "vcode": ""
                },
                "redirectUri": ""
            })
        );
    }

    #[tokio::test]
    async fn fetch_captcha_captures_cookie_and_image() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "JSESSIONID=abc123; Path=/esc-sso; HttpOnly")
                    .set_body_raw(PNG_BYTES.to_vec(), "image/png"),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_captcha(None).await.unwrap();
        assert_eq!(result.cookie.as_str(), "JSESSIONID=abc123");
        assert_eq!(result.image, PNG_BYTES);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("cookie").is_none());
        assert_eq!(
            requests[0]
                .headers
                .get("user-agent")
                .and_then(|v| v.to_str().ok()),
            Some(DEFAULT_USER_AGENT)
        );
    }

    #[tokio::test]
    async fn fetch_captcha_without_set_cookie_fails() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES.to_vec(), "image/png"))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_captcha(None).await;
        assert!(matches!(result, Err(Error::MissingSessionCookie)));
    }

    #[tokio::test]
    async fn fetch_captcha_with_empty_cookie_fails() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", " ; Path=/")
                    .set_body_raw(PNG_BYTES.to_vec(), "image/png"),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_captcha(None).await;
        assert!(matches!(result, Err(Error::MissingSessionCookie)));
    }

    #[tokio::test]
    async fn fetch_captcha_non_2xx_is_transport_error() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_captcha(None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
        assert_eq!(
            err.to_string(),
            "fetch captcha failed: 503 Service Unavailable maintenance"
        );
    }

    #[tokio::test]
    async fn fetch_captcha_user_agent_override() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .and(header("user-agent", "custom-agent/2.0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "JSESSIONID=ua")
                    .set_body_raw(PNG_BYTES.to_vec(), "image/png"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .fetch_captcha(Some("custom-agent/2.0"))
            .await
            .unwrap();
        assert_eq!(result.cookie.as_str(), "JSESSIONID=ua");
    }

    #[tokio::test]
    async fn send_sms_passes_when_code_is_zero() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SMS_SEND_PATH))
            .and(query_param("username", "20220001"))
            .and(query_param("vcode", "abcd"))
            .and(query_param("_", "1771727069176"))
            .and(header("cookie", COOKIE_VALUE))
            .and(header("accept", ACCEPT_JSON))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "0",
                "msg": "ok",
                "timestamp": 1_771_727_069_176_u64,
                "data": 60
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cookie = cookie();
        let result = client_for(&server)
            .send_sms(SmsRequest::new("20220001", "abcd", &cookie).with_timestamp(1_771_727_069_176))
            .await
            .unwrap();

        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(result.body.code, "0");
        assert_eq!(result.body.msg, "ok");
        assert_eq!(result.body.data, json!(60));
        assert_eq!(result.cookie, cookie);
        assert!(result.url.ends_with("?username=20220001&vcode=abcd&_=1771727069176"));
    }

    #[tokio::test]
    async fn send_sms_defaults_timestamp_to_now() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SMS_SEND_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "0", "msg": "ok", "timestamp": 1, "data": 60
            })))
            .mount(&server)
            .await;

        let before = now_millis();
        let cookie = cookie();
        client_for(&server)
            .send_sms(SmsRequest::new("20220001", "abcd", &cookie))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let sent: u64 = requests[0]
            .url
            .query_pairs()
            .find(|(key, _)| key == "_")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap();
        assert!(sent >= before);
    }

    #[tokio::test]
    async fn send_sms_rejects_wrong_captcha() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SMS_SEND_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "ESSO000004",
                "msg": "captcha check failed",
                "timestamp": 1_771_727_276_741_u64,
                "data": "true"
            })))
            .mount(&server)
            .await;

        let cookie = cookie();
        let err = client_for(&server)
            .send_sms(SmsRequest::new("20220001", "wrong", &cookie))
            .await
            .unwrap_err();

        assert!(err.is_business());
        assert_eq!(
            err.to_string(),
            "send SMS failed(ESSO000004): captcha check failed"
        );
    }

    #[tokio::test]
    async fn send_sms_non_json_body() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        let html = format!("<html>{}</html>", "x".repeat(400));
        Mock::given(method("GET"))
            .and(path(SMS_SEND_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(html.clone()))
            .mount(&server)
            .await;

        let cookie = cookie();
        let err = client_for(&server)
            .send_sms(SmsRequest::new("20220001", "abcd", &cookie))
            .await
            .unwrap_err();

        match err {
            Error::NonJsonResponse { body } => {
                assert_eq!(body.chars().count(), 200);
                assert!(html.starts_with(&body));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_sms_non_2xx_embeds_body_detail() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SMS_SEND_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;

        let cookie = cookie();
        let err = client_for(&server)
            .send_sms(SmsRequest::new("20220001", "abcd", &cookie))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(
            err.to_string(),
            r#"send SMS failed: 500 Internal Server Error {"error":"boom"}"#
        );
    }

    #[tokio::test]
    async fn login_passes_when_code_is_zero() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(header("cookie", COOKIE_VALUE))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "authType": "webSmsAuth",
                "dataField": {
                    "username": "20220001",
                    "password": "",
                    "smsCode": "123456",
                    "vcode": ""
                },
                "redirectUri": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"redirect": "/esc-sso/login", "failedLogins": 0},
                "code": "0",
                "msg": "success",
                "timestamp": 1_771_727_078_064_u64
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cookie = cookie();
        let result = client_for(&server)
            .login(LoginRequest::new("20220001", "123456", &cookie))
            .await
            .unwrap();

        assert_eq!(result.body.code, "0");
        assert_eq!(result.data().failed_logins, Some(0));
        assert_eq!(result.data().redirect.as_deref(), Some("/esc-sso/login"));
        assert_eq!(result.cookie, cookie);
    }

    #[tokio::test]
    async fn login_keeps_data_verbatim() {
        if !can_bind_localhost() {
            return;
        }
        let cases = [
            json!({"redirect": "/x", "failedLogins": 0, "ticket": "ST-1"}),
            json!({"failedLogins": "0"}),
            json!("true"),
        ];
        for data in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(LOGIN_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "code": "0", "msg": "success", "timestamp": 1, "data": data
                })))
                .mount(&server)
                .await;

            let cookie = cookie();
            let result = client_for(&server)
                .login(LoginRequest::new("20220001", "123456", &cookie))
                .await
                .unwrap();
            assert_eq!(result.body.data, data);
        }
    }

    #[test]
    fn login_data_view_is_lenient() {
        let data = LoginData::from_value(&json!({
            "redirect": "/x", "failedLogins": "2", "authType": 7, "ticket": "ST-1"
        }));
        assert_eq!(data.redirect.as_deref(), Some("/x"));
        assert_eq!(data.failed_logins, Some(2));
        assert_eq!(data.auth_type, None);
        assert_eq!(data.extra.get("ticket"), Some(&json!("ST-1")));
        assert_eq!(data.extra.get("authType"), Some(&json!(7)));

        assert_eq!(LoginData::from_value(&json!("true")), LoginData::default());
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({"redirect": "/x", "failedLogins": 2, "authType": 7, "ticket": "ST-1"})
        );
    }

    #[tokio::test]
    async fn login_rejects_wrong_sms_code() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"redirect": "/esc-sso/login", "failedLogins": 1, "authType": "webSmsAuth"},
                "code": "SSO10010",
                "msg": "wrong code, 4 attempts left",
                "timestamp": 1_771_727_307_777_u64
            })))
            .mount(&server)
            .await;

        let cookie = cookie();
        let err = client_for(&server)
            .login(LoginRequest::new("20220001", "000000", &cookie))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("SSO10010"));
        assert!(message.contains("wrong code, 4 attempts left"));
    }

    #[tokio::test]
    async fn login_missing_timestamp_is_invalid_envelope() {
        if !can_bind_localhost() {
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": "0", "msg": "success"})),
            )
            .mount(&server)
            .await;

        let cookie = cookie();
        let err = client_for(&server)
            .login(LoginRequest::new("20220001", "123456", &cookie))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidEnvelope {
                action: SsoAction::Login,
                ..
            }
        ));
        assert_eq!(err.to_string(), "login failed: missing timestamp");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_request_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let endpoints = Endpoints::parse("http://127.0.0.1:9").unwrap();
        let client = SsoClient::new(
            ClientConfig::new(endpoints).with_timeout(Some(Duration::from_secs(2))),
        )
        .unwrap();

        let err = client.fetch_captcha(None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Request {
                action: SsoAction::FetchCaptcha,
                ..
            }
        ));
    }
}
