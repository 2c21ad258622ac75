use serde::{Deserialize, Serialize};

use super::normalize::{normalize, OneOrMany};

/// A recorded absence for one period of the session date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStatus {
    pub period: String,
    pub absence_type: String,
}

impl PeriodStatus {
    pub fn new(period: impl Into<String>, absence_type: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            absence_type: absence_type.into(),
        }
    }
}

/// Snapshot of a student with the attendance already stored for the date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub seat_no: Option<i64>,
    pub history: Vec<PeriodStatus>,
}

impl StudentRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            seat_no: None,
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<PeriodStatus>) -> Self {
        self.history = history;
        self
    }

    pub fn with_seat_no(mut self, seat_no: i64) -> Self {
        self.seat_no = Some(seat_no);
        self
    }

    /// First stored entry for `period`, if any.
    pub fn status_for(&self, period: &str) -> Option<&PeriodStatus> {
        self.history.iter().find(|s| s.period == period)
    }
}

/// Attendance block of an imported student; `period` may be one entry or many.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSource {
    #[serde(default)]
    pub period: Option<OneOrMany<PeriodStatus>>,
}

/// A student as delivered by an external roster export.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSource {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub seat_no: Option<i64>,
    #[serde(default)]
    pub attendance: Option<AttendanceSource>,
}

impl StudentSource {
    /// Converts into a record, assigning `fallback_id` when the export had none.
    pub fn into_record(self, fallback_id: impl FnOnce() -> String) -> StudentRecord {
        let history = self
            .attendance
            .map(|a| normalize(a.period))
            .unwrap_or_default();
        StudentRecord {
            id: self.id.filter(|s| !s.trim().is_empty()).unwrap_or_else(fallback_id),
            name: self.name,
            seat_no: self.seat_no,
            history,
        }
    }
}
