//! Decoding and validation of the `{code, msg, timestamp, data}` envelope every
//! JSON endpoint of the SSO service answers with.
//!
//! Decoding happens in three stages so that a failing envelope is reported as a
//! business error even when its `data` does not match the success shape:
//!
//! 1. [`parse_json_body`] turns raw bytes into a [`Value`] (`NonJsonResponse`).
//! 2. [`parse_sso_response`] checks the envelope structure (`InvalidEnvelope`).
//! 3. [`assert_sso_success`] checks `code == "0"` (`Business`), after which
//!    [`ResponseEnvelope::decode_data`] converts `data` into the caller's type.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Number, Value};

use super::error::{Error, Result, SsoAction};

pub const SUCCESS_CODE: &str = "0";

const NON_JSON_PREFIX_CHARS: usize = 200;
const ERROR_DETAIL_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub code: String,
    pub msg: String,
    pub timestamp: Number,
    pub data: T,
}

impl<T> ResponseEnvelope<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

impl ResponseEnvelope<Value> {
    /// Convert the untyped `data` into the shape the endpoint promises.
    ///
    /// A missing or `null` `data` is also tried as `{}`, so all-optional structs decode.
    ///
    /// # Errors
    /// Returns `InvalidEnvelope` if `data` does not deserialize into `T`.
    pub fn decode_data<T: DeserializeOwned>(
        self,
        action: SsoAction,
    ) -> Result<ResponseEnvelope<T>> {
        let decoded = if self.data.is_null() {
            serde_json::from_value(Value::Null)
                .or_else(|_| serde_json::from_value(Value::Object(Map::new())))
        } else {
            serde_json::from_value(self.data)
        };
        let data = decoded.map_err(|_| Error::InvalidEnvelope {
            action,
            reason: "unexpected data shape",
        })?;
        Ok(ResponseEnvelope {
            code: self.code,
            msg: self.msg,
            timestamp: self.timestamp,
            data,
        })
    }
}

/// Decode a response body as JSON. An empty body decodes to an empty object.
///
/// # Errors
/// Returns `NonJsonResponse` with a prefix of the raw body if decoding fails.
pub fn parse_json_body(body: &[u8]) -> Result<Value> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|_| Error::NonJsonResponse {
        body: truncate_chars(&String::from_utf8_lossy(body), NON_JSON_PREFIX_CHARS),
    })
}

/// Check the envelope structure, leaving `data` untyped.
///
/// # Errors
/// Returns `InvalidEnvelope` naming `action` if the value is not an object, `code`/`msg`
/// are not strings, or `timestamp` is not a number.
pub fn parse_sso_response(body: Value, action: SsoAction) -> Result<ResponseEnvelope<Value>> {
    let Value::Object(mut fields) = body else {
        return Err(Error::InvalidEnvelope {
            action,
            reason: "invalid response format",
        });
    };

    let (Some(Value::String(code)), Some(Value::String(msg))) =
        (fields.remove("code"), fields.remove("msg"))
    else {
        return Err(Error::InvalidEnvelope {
            action,
            reason: "missing code/msg",
        });
    };

    let Some(Value::Number(timestamp)) = fields.remove("timestamp") else {
        return Err(Error::InvalidEnvelope {
            action,
            reason: "missing timestamp",
        });
    };

    Ok(ResponseEnvelope {
        code,
        msg,
        timestamp,
        data: fields.remove("data").unwrap_or(Value::Null),
    })
}

/// # Errors
/// Returns `Business` with the upstream `code` and `msg` when `code != "0"`.
pub fn assert_sso_success<T>(envelope: &ResponseEnvelope<T>, action: SsoAction) -> Result<()> {
    if envelope.is_success() {
        Ok(())
    } else {
        Err(Error::Business {
            action,
            code: envelope.code.clone(),
            msg: envelope.msg.clone(),
        })
    }
}

/// Render a decoded body for inclusion in a transport error.
#[must_use]
pub fn error_detail(body: &Value) -> String {
    match body {
        Value::String(text) => truncate_chars(text, ERROR_DETAIL_CHARS),
        Value::Object(_) | Value::Array(_) => truncate_chars(&body.to_string(), ERROR_DETAIL_CHARS),
        _ => String::new(),
    }
}

/// Diagnostic detail for a non-2xx body: JSON is re-rendered, anything else is used raw.
#[must_use]
pub fn raw_error_detail(body: &[u8]) -> String {
    match parse_json_body(body) {
        Ok(value) => error_detail(&value),
        Err(_) => truncate_chars(&String::from_utf8_lossy(body), ERROR_DETAIL_CHARS),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
