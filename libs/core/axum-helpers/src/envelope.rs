//! Success response body shared by every JSON endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

/// `{ "message": "success", ...extra }`
///
/// ```
/// use axum_helpers::Envelope;
/// use serde_json::json;
///
/// let body = Envelope::success()
///     .with("page", 2)
///     .with("result", json!([]));
/// assert_eq!(body.to_value()["page"], 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Envelope {
    status: StatusCode,
    body: Map<String, Value>,
}

impl Envelope {
    pub fn new(message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("message".to_string(), Value::String(message.into()));
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn success() -> Self {
        Self::new("success")
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a key. Values that fail to serialize render as `null`.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.body.insert(key.to_string(), value);
        self
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}
