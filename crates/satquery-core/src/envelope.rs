use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Wire-level wrapper around every protocol response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i64,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub const fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Applies the protocol envelope rule to a decoded body.
///
/// `code == 0` is success and the logical payload is `data`, or the whole
/// envelope object when `data` is absent. Any other code maps to an
/// [`ApiError`] carrying the protocol code, message, and payload.
pub fn unwrap_envelope(body: Value) -> Result<Value, ApiError> {
    let envelope: Envelope = serde_json::from_value(body.clone()).map_err(|error| {
        ApiError::decode(
            format!("response body is not a protocol envelope: {error}"),
            serde_json::json!({ "body_kind": kind_of(&body) }),
        )
    })?;

    if envelope.is_success() {
        return Ok(envelope.data.unwrap_or(body));
    }

    Err(ApiError::application(
        envelope.code,
        envelope.msg,
        envelope.data,
    ))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
