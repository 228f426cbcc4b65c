//! Response envelopes written back on stdout, one JSON object per line.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

impl Envelope<'_> {
    fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn ok(id: &str, result: Value) -> Value {
    Envelope {
        id: Some(id),
        ok: true,
        result: Some(result),
        error: None,
    }
    .into_value()
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    Envelope {
        id: Some(id),
        ok: false,
        result: None,
        error: Some(ErrorBody {
            code,
            message: message.into(),
            details,
        }),
    }
    .into_value()
}

/// Failure reply for a line that could not be parsed far enough to read its id.
pub fn unaddressed_err(code: &str, message: impl Into<String>) -> Value {
    Envelope {
        id: None,
        ok: false,
        result: None,
        error: Some(ErrorBody {
            code,
            message: message.into(),
            details: None,
        }),
    }
    .into_value()
}
