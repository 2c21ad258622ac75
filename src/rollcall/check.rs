use log::warn;
use serde::Serialize;
use std::rc::Rc;

use super::catalog::AbsenceCatalog;
use super::period::PeriodRule;
use super::student::StudentRecord;
use crate::error::{Result, RollCallError};

const PRESENT_TEXT: &str = "Check";
const PRESENT_BACKGROUND: &str = "white";
const PRESENT_FOREGROUND: &str = "rgba(0,0,0,.12)";
const MARKED_FOREGROUND: &str = "white";

/// How a check is drawn on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceBadge {
    pub text: String,
    pub background: String,
    pub foreground: String,
}

/// One student's attendance for the session period.
#[derive(Debug, Clone)]
pub struct AttendanceCheck {
    student: StudentRecord,
    status: Option<String>,
    period: Rc<PeriodRule>,
}

impl AttendanceCheck {
    pub fn new(student: StudentRecord, status: Option<String>, period: Rc<PeriodRule>) -> Self {
        Self {
            student,
            status,
            period,
        }
    }

    /// Builds the check with the status already stored for the period.
    pub fn derive(student: StudentRecord, period: Rc<PeriodRule>) -> Self {
        let status = selected_attendance(&student, &period);
        Self::new(student, status, period)
    }

    pub fn student(&self) -> &StudentRecord {
        &self.student
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn period(&self) -> &PeriodRule {
        &self.period
    }

    /// Present students and students marked with a code this period allows
    /// can be edited. Anything else was recorded under different rules and
    /// stays locked.
    pub fn accept_change(&self) -> bool {
        match self.status.as_deref() {
            None => true,
            Some(code) => self.period.allows(code),
        }
    }

    pub fn is_locked(&self) -> bool {
        !self.accept_change()
    }

    /// Marks the student with `code`. Membership in the period's list is the
    /// caller's job; only the lock and an empty selection are checked here.
    pub fn set_attendance(&mut self, code: Option<&str>) -> Result<()> {
        if !self.accept_change() {
            return Err(RollCallError::Validation(format!(
                "attendance of {} cannot be changed",
                self.student.name
            )));
        }
        match code.map(str::trim) {
            Some("") => Err(RollCallError::Validation(
                "select an absence type first".to_string(),
            )),
            Some(code) => {
                self.status = Some(code.to_string());
                Ok(())
            }
            None => {
                self.status = None;
                Ok(())
            }
        }
    }

    pub fn clear_attendance(&mut self) -> Result<()> {
        self.set_attendance(None)
    }

    pub fn badge(&self, catalog: &AbsenceCatalog) -> AttendanceBadge {
        let Some(code) = self.status.as_deref() else {
            return AttendanceBadge {
                text: PRESENT_TEXT.to_string(),
                background: PRESENT_BACKGROUND.to_string(),
                foreground: PRESENT_FOREGROUND.to_string(),
            };
        };
        let background = match catalog.resolve(code) {
            Ok(category) => category.color_token().to_string(),
            Err(e) => {
                warn!("student {}: {}", self.student.id, e);
                super::catalog::NEUTRAL_COLOR.to_string()
            }
        };
        AttendanceBadge {
            text: code.to_string(),
            background,
            foreground: MARKED_FOREGROUND.to_string(),
        }
    }
}

/// Status already stored for the student in `period`, if any.
pub fn selected_attendance(student: &StudentRecord, period: &PeriodRule) -> Option<String> {
    student
        .status_for(period.name())
        .map(|s| s.absence_type.clone())
}
