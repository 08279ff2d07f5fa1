use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::flow::FlowState;

/// Upstream step an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsoAction {
    FetchCaptcha,
    SendSms,
    Login,
}

impl SsoAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchCaptcha => "fetch captcha",
            Self::SendSms => "send SMS",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for SsoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The upstream answered with a non-2xx status.
    #[error("{action} failed: {}", transport_summary(.status, .detail))]
    Transport {
        action: SsoAction,
        status: StatusCode,
        detail: String,
    },
    #[error("service returned non-JSON response: {body}")]
    NonJsonResponse { body: String },
    #[error("{action} failed: {reason}")]
    InvalidEnvelope {
        action: SsoAction,
        reason: &'static str,
    },
    #[error("session cookie missing or empty")]
    MissingSessionCookie,
    /// Well-formed envelope with a non-zero `code`; usually a user-correctable mistake.
    #[error("{action} failed({code}): {msg}")]
    Business {
        action: SsoAction,
        code: String,
        msg: String,
    },
    /// No HTTP response was received at all (connect failure, timeout).
    #[error("{action} request failed: {source}")]
    Request {
        action: SsoAction,
        #[source]
        source: reqwest::Error,
    },
    #[error("cannot {action} while flow is {actual}, expected {expected}")]
    StepOrder {
        action: SsoAction,
        expected: FlowState,
        actual: FlowState,
    },
}

/// Coarse error classification exposed to API consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    NonJsonResponse,
    InvalidEnvelope,
    MissingSessionCookie,
    Business,
    Request,
    StepOrder,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::NonJsonResponse { .. } => ErrorKind::NonJsonResponse,
            Self::InvalidEnvelope { .. } => ErrorKind::InvalidEnvelope,
            Self::MissingSessionCookie => ErrorKind::MissingSessionCookie,
            Self::Business { .. } => ErrorKind::Business,
            Self::Request { .. } => ErrorKind::Request,
            Self::StepOrder { .. } => ErrorKind::StepOrder,
        }
    }

    /// Whether the failure is the upstream rejecting user input (wrong captcha or SMS code).
    #[must_use]
    pub const fn is_business(&self) -> bool {
        matches!(self, Self::Business { .. })
    }
}

fn transport_summary(status: &StatusCode, detail: &str) -> String {
    let mut summary = status.as_u16().to_string();
    if let Some(reason) = status.canonical_reason() {
        summary.push(' ');
        summary.push_str(reason);
    }
    if !detail.is_empty() {
        summary.push(' ');
        summary.push_str(detail);
    }
    summary
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
