//! Stateful wrapper enforcing captcha → SMS → login ordering.
//!
//! [`SsoClient`] only relies on callers holding the right cookie. [`LoginFlow`] owns the
//! cookie for a single login attempt and rejects out-of-order steps locally, without
//! touching the network.

use std::fmt;
use tracing::debug;

use super::{
    client::{LoginRequest, LoginResult, SmsRequest, SmsSendResult, SsoClient},
    cookie::SessionCookie,
    error::{Error, Result, SsoAction},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Initiated,
    CaptchaFetched,
    SmsSent,
    LoggedIn,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initiated => "initiated",
            Self::CaptchaFetched => "captcha-fetched",
            Self::SmsSent => "sms-sent",
            Self::LoggedIn => "logged-in",
        })
    }
}

#[derive(Debug)]
pub struct LoginFlow {
    client: SsoClient,
    username: String,
    state: FlowState,
    cookie: Option<SessionCookie>,
}

impl LoginFlow {
    #[must_use]
    pub fn new(client: SsoClient, username: impl Into<String>) -> Self {
        Self {
            client,
            username: username.into(),
            state: FlowState::Initiated,
            cookie: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.state
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn cookie(&self) -> Option<&SessionCookie> {
        self.cookie.as_ref()
    }

    /// Fetch a captcha, (re)starting the flow with a fresh session cookie.
    ///
    /// Allowed from any state; a failed fetch leaves the flow untouched.
    ///
    /// # Errors
    /// Propagates [`SsoClient::fetch_captcha`] failures.
    pub async fn fetch_captcha(&mut self) -> Result<Vec<u8>> {
        let captcha = self.client.fetch_captcha(None).await?;
        debug!("flow for {} restarted at captcha step", self.username);
        self.cookie = Some(captcha.cookie);
        self.state = FlowState::CaptchaFetched;
        Ok(captcha.image)
    }

    /// Request the SMS code. May be repeated to resend.
    ///
    /// # Errors
    /// `StepOrder` unless a captcha was fetched and login has not completed; otherwise
    /// propagates [`SsoClient::send_sms`] failures.
    pub async fn send_sms(&mut self, vcode: &str) -> Result<SmsSendResult> {
        let cookie = self.require(
            SsoAction::SendSms,
            FlowState::CaptchaFetched,
            &[FlowState::CaptchaFetched, FlowState::SmsSent],
        )?;
        let result = self
            .client
            .send_sms(SmsRequest::new(&self.username, vcode, &cookie))
            .await?;
        self.state = FlowState::SmsSent;
        Ok(result)
    }

    /// Submit the SMS code. On a wrong code the flow stays in `SmsSent` so it can be retried.
    ///
    /// # Errors
    /// `StepOrder` unless the SMS step succeeded; otherwise propagates [`SsoClient::login`]
    /// failures.
    pub async fn login(&mut self, sms_code: &str) -> Result<LoginResult> {
        let cookie = self.require(SsoAction::Login, FlowState::SmsSent, &[FlowState::SmsSent])?;
        let result = self
            .client
            .login(LoginRequest::new(&self.username, sms_code, &cookie))
            .await?;
        self.state = FlowState::LoggedIn;
        Ok(result)
    }

    fn require(
        &self,
        action: SsoAction,
        expected: FlowState,
        allowed: &[FlowState],
    ) -> Result<SessionCookie> {
        if !allowed.contains(&self.state) {
            return Err(Error::StepOrder {
                action,
                expected,
                actual: self.state,
            });
        }
        self.cookie.clone().ok_or(Error::MissingSessionCookie)
    }
}
