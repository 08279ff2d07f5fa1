//! # sufe-sso
//!
//! Client for the Shanghai University of Finance and Economics single sign-on
//! service, using the SMS verification login.
//!
//! A login is three dependent requests against `login.sufe.edu.cn`:
//!
//! 1. **Captcha:** fetch an image; the response sets the upstream session cookie.
//! 2. **SMS:** send the captcha answer with the cookie; the service texts a code.
//! 3. **Login:** post the SMS code with the same cookie.
//!
//! Every JSON reply is wrapped in an envelope `{code, msg, timestamp, data}` where
//! `code == "0"` means success. [`sso::SsoClient`] performs each step and
//! [`sso::LoginFlow`] enforces their order.
//!
//! The [`api`] module is a small demo server that lets a browser drive the same
//! flow without ever seeing the upstream cookie, and [`cli`] wires both into the
//! `sufe-sso` binary.

pub mod api;
pub mod cli;
pub mod sso;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
