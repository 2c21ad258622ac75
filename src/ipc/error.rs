use serde_json::json;

use crate::error::RollCallError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Engine failures keep their display text verbatim.
pub fn engine_err(
    id: &str,
    error: &RollCallError,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    err(id, error.code(), error.to_string(), details)
}
