//! Protocol client for the SUFE SMS single-sign-on flow.

pub mod client;
pub mod cookie;
pub mod envelope;
pub mod error;
pub mod flow;
pub mod headers;

pub use client::{
    CaptchaResult, ClientConfig, DEFAULT_BASE_URL, Endpoints, LoginData, LoginRequest,
    LoginResult, SmsRequest, SmsSendData, SmsSendResult, SsoClient,
};
pub use cookie::SessionCookie;
pub use envelope::ResponseEnvelope;
pub use error::{Error, ErrorKind, Result, SsoAction};
pub use flow::{FlowState, LoginFlow};
