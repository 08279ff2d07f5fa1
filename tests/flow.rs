#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use std::net::TcpListener;
use sufe_sso::sso::{
    ClientConfig, Endpoints, Error, ErrorKind, FlowState, LoginFlow, LoginRequest, SmsRequest,
    SsoClient,
    client::{CAPTCHA_PATH, LOGIN_PATH, SMS_SEND_PATH},
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COOKIE: &str = "SESSION=C1";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn client_for(server: &MockServer) -> SsoClient {
    let endpoints = Endpoints::parse(&server.uri()).unwrap();
    SsoClient::new(ClientConfig::new(endpoints)).unwrap()
}

async fn mount_captcha(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(CAPTCHA_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "SESSION=C1; Path=/esc-sso; HttpOnly")
                .insert_header("content-type", "image/png")
                .set_body_bytes(b"\x89PNG\r\n".to_vec()),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn captcha_sms_login_share_one_cookie() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    mount_captcha(&server).await;
    Mock::given(method("GET"))
        .and(path(SMS_SEND_PATH))
        .and(query_param("username", "20220001"))
        .and(query_param("vcode", "abcd"))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "0", "msg": "success", "timestamp": 1_700_000_000_000_u64, "data": 60
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(header("cookie", COOKIE))
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
            "code": "0", "msg": "success", "timestamp": 1_700_000_000_500_u64,
            "data": {"failedLogins": 0}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let captcha = client.fetch_captcha(None).await.unwrap();
    assert_eq!(captcha.cookie.as_str(), COOKIE);
    assert_eq!(captcha.image, b"\x89PNG\r\n");

    let sms = client
        .send_sms(SmsRequest::new("20220001", "abcd", &captcha.cookie))
        .await
        .unwrap();
    assert!(sms.status.is_success());
    assert_eq!(sms.body.code, "0");
    assert_eq!(sms.body.data, json!(60));
    assert_eq!(sms.cookie, captcha.cookie);

    let login = client
        .login(LoginRequest::new("20220001", "123456", &captcha.cookie))
        .await
        .unwrap();
    assert_eq!(login.body.code, "0");
    assert_eq!(login.data().failed_logins, Some(0));
    assert_eq!(login.cookie, captcha.cookie);

    for request in server.received_requests().await.unwrap().iter().skip(1) {
        assert_eq!(
            request.headers.get("cookie").unwrap().as_bytes(),
            COOKIE.as_bytes()
        );
    }
}

#[tokio::test]
async fn wrong_captcha_surfaces_code_and_message() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    mount_captcha(&server).await;
    Mock::given(method("GET"))
        .and(path(SMS_SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "ESSO000004", "msg": "captcha check failed", "timestamp": 1
        })))
        .mount(&server)
        .await;

    let mut flow = LoginFlow::new(client_for(&server), "20220001");
    flow.fetch_captcha().await.unwrap();

    let err = flow.send_sms("wrong").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Business);
    let message = err.to_string();
    assert!(message.contains("ESSO000004"));
    assert!(message.contains("captcha check failed"));
    assert!(matches!(err, Error::Business { ref code, .. } if code == "ESSO000004"));

    // Still allowed to retry the SMS step, but not to log in.
    assert_eq!(flow.state(), FlowState::CaptchaFetched);
    let err = flow.login("123456").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StepOrder);
}

#[tokio::test]
async fn flow_reaches_logged_in() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    mount_captcha(&server).await;
    Mock::given(method("GET"))
        .and(path(SMS_SEND_PATH))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "0", "msg": "ok", "timestamp": 1, "data": 60
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "0", "msg": "ok", "timestamp": 2, "data": {"failedLogins": 0}
        })))
        .mount(&server)
        .await;

    let mut flow = LoginFlow::new(client_for(&server), "20220001");
    assert_eq!(flow.state(), FlowState::Initiated);
    flow.fetch_captcha().await.unwrap();
    flow.send_sms("abcd").await.unwrap();
    assert_eq!(flow.state(), FlowState::SmsSent);
    let login = flow.login("123456").await.unwrap();
    assert_eq!(login.data().failed_logins, Some(0));
    assert_eq!(flow.state(), FlowState::LoggedIn);
}
