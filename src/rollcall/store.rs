use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::group::GroupRef;
use super::student::StudentRecord;
use crate::error::Result;

/// One line of a roll-call submission. `absence_type: None` means present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollCallItem {
    pub student_id: String,
    pub absence_type: Option<String>,
}

/// Backend that owns the roster and the stored attendance.
///
/// `submit_roll_call` must be idempotent per (student, date, period): sending
/// the same batch twice leaves the same stored state as sending it once.
pub trait RollCallStore {
    /// Students of the group in roster order, with the entries stored for `date`.
    /// Fails with `DataFetch`.
    fn fetch_students(&self, group: &GroupRef, date: NaiveDate) -> Result<Vec<StudentRecord>>;

    /// Fails with `Save`.
    fn submit_roll_call(
        &self,
        group: &GroupRef,
        date: NaiveDate,
        period: &str,
        items: &[RollCallItem],
    ) -> Result<()>;
}
