//! Decoding of mailcow API replies.
//!
//! The API answers write operations with one of two list shapes:
//! `[{"type": "success", "msg": ...}, ...]` or a bare list of strings such
//! as `["object_exists", "john@example.com"]`. Both are decoded once here
//! so callers only ever see an [`Interpretation`].

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Empty,
    /// List whose first element is an object.
    Records(Vec<Value>),
    /// List whose first element is a string.
    Sentinels(Vec<Value>),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub success: bool,
    pub message: String,
}

impl Interpretation {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl ApiResponse {
    pub fn from_value(value: Value) -> Self {
        if is_empty(&value) {
            return ApiResponse::Empty;
        }
        match value {
            Value::Array(items) => match items.first() {
                Some(Value::Object(_)) => ApiResponse::Records(items),
                Some(Value::String(_)) => ApiResponse::Sentinels(items),
                _ => ApiResponse::Other(Value::Array(items)),
            },
            other => ApiResponse::Other(other),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ApiResponse::Empty => Value::Null,
            ApiResponse::Records(items) | ApiResponse::Sentinels(items) => {
                Value::Array(items.clone())
            }
            ApiResponse::Other(v) => v.clone(),
        }
    }

    /// Entries of a listing reply. A single object is treated as a
    /// one-element listing.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            ApiResponse::Empty => Vec::new(),
            ApiResponse::Records(items) | ApiResponse::Sentinels(items) => items,
            ApiResponse::Other(Value::Array(items)) => items,
            ApiResponse::Other(v) => vec![v],
        }
    }

    pub fn interpret(&self) -> Interpretation {
        match self {
            ApiResponse::Empty => Interpretation::failure("Empty response"),
            ApiResponse::Records(items) => {
                let Some(Value::Object(first)) = items.first() else {
                    return Interpretation::failure(self.to_value().to_string());
                };
                let success = first.get("type").and_then(Value::as_str) == Some("success");
                let message = match first.get("msg") {
                    Some(msg) => render(msg),
                    None => self.to_value().to_string(),
                };
                Interpretation { success, message }
            }
            // No string-leading reply is known to mean success.
            ApiResponse::Sentinels(items) => Interpretation::failure(
                items.iter().map(render).collect::<Vec<_>>().join(" "),
            ),
            ApiResponse::Other(v) => Interpretation::failure(v.to_string()),
        }
    }
}

impl From<Value> for ApiResponse {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}
