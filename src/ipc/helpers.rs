use chrono::NaiveDate;
use serde_json::json;

use super::error::err;
use crate::db;
use crate::error::RollCallError;
use crate::rollcall::group::{GroupKind, GroupRef};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn db(code: &'static str, e: rusqlite::Error) -> Self {
        Self {
            code,
            message: e.to_string(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<RollCallError> for HandlerErr {
    fn from(e: RollCallError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
            details: None,
        }
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn get_group(params: &serde_json::Value) -> Result<GroupRef, HandlerErr> {
    let kind = get_required_str(params, "groupType")?
        .parse::<GroupKind>()
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    let id = get_required_str(params, "groupId")?;
    Ok(GroupRef::new(kind, id))
}

/// `date` as YYYY-MM-DD, defaulting to today.
pub fn get_date(params: &serde_json::Value) -> Result<NaiveDate, HandlerErr> {
    match get_optional_str(params, "date") {
        None => Ok(db::today()),
        Some(raw) => db::parse_date(&raw).ok_or_else(|| HandlerErr {
            code: "bad_params",
            message: "date must be YYYY-MM-DD".to_string(),
            details: Some(json!({ "date": raw })),
        }),
    }
}
