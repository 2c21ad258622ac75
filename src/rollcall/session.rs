use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;
use std::rc::Rc;

use super::check::AttendanceCheck;
use super::group::GroupRef;
use super::notify::{BusyGuard, Notifier};
use super::period::PeriodRule;
use super::store::{RollCallItem, RollCallStore};
use super::student::StudentRecord;
use crate::config::RollCallConfig;
use crate::error::{Result, RollCallError};

/// Which roster, on which day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub group: GroupRef,
    pub display_name: String,
    pub date: NaiveDate,
}

/// Count of one absence type in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub absence_type: String,
    pub count: usize,
}

/// The roll call for one group, date and period.
#[derive(Debug)]
pub struct RollCallSession {
    identity: SessionIdentity,
    period: Rc<PeriodRule>,
    checks: Vec<AttendanceCheck>,
    summary: Vec<SummaryEntry>,
    summary_text: String,
}

impl RollCallSession {
    /// Resolves the period and loads the roster. `config` is the loaded
    /// configuration; holding it is what makes a session constructible.
    /// Failures are reported to `notifier` and returned.
    pub fn open(
        config: &RollCallConfig,
        store: &dyn RollCallStore,
        notifier: &dyn Notifier,
        identity: SessionIdentity,
        period: Option<&str>,
    ) -> Result<Self> {
        let loaded = config.resolve_period(period).and_then(|rule| {
            store
                .fetch_students(&identity.group, identity.date)
                .map(|records| (rule, records))
        });
        let (rule, records) = loaded.map_err(|e| {
            notifier.report(&e);
            e
        })?;
        let session = Self::from_records(identity, rule, records);
        info!(
            "opened roll call {} {} period {:?}: {} students, {} locked",
            session.identity.group,
            session.identity.date,
            session.period.name(),
            session.checks.len(),
            session.locked_count()
        );
        Ok(session)
    }

    pub fn from_records(
        identity: SessionIdentity,
        period: PeriodRule,
        records: Vec<StudentRecord>,
    ) -> Self {
        let period = Rc::new(period);
        let mut session = Self {
            identity,
            checks: build_checks(records, &period),
            period,
            summary: Vec::new(),
            summary_text: String::new(),
        };
        session.recompute_summary();
        session
    }

    /// Replaces every check with fresh state from the store. On failure the
    /// current checks are left untouched and the error goes to `notifier`.
    pub fn reload(&mut self, store: &dyn RollCallStore, notifier: &dyn Notifier) -> Result<()> {
        self.refetch(store).map_err(|e| {
            notifier.report(&e);
            e
        })
    }

    fn refetch(&mut self, store: &dyn RollCallStore) -> Result<()> {
        let records = store.fetch_students(&self.identity.group, self.identity.date)?;
        self.checks = build_checks(records, &self.period);
        self.recompute_summary();
        debug!(
            "reloaded roll call {} period {:?}: {} students",
            self.identity.group,
            self.period.name(),
            self.checks.len()
        );
        Ok(())
    }

    /// Applies the operator's selected absence type to one student.
    pub fn change_attendance(&mut self, student_id: &str, selected: Option<&str>) -> Result<()> {
        let Some(code) = selected.map(str::trim).filter(|c| !c.is_empty()) else {
            return Err(RollCallError::Validation(
                "select an absence type first".to_string(),
            ));
        };
        self.check_mut(student_id)?.set_attendance(Some(code))?;
        self.recompute_summary();
        Ok(())
    }

    /// Marks one student present again.
    pub fn clear_attendance(&mut self, student_id: &str) -> Result<()> {
        self.check_mut(student_id)?.clear_attendance()?;
        self.recompute_summary();
        Ok(())
    }

    /// One item per check, locked checks included, in roster order.
    pub fn save_batch(&self) -> Vec<RollCallItem> {
        self.checks
            .iter()
            .map(|c| RollCallItem {
                student_id: c.student().id.clone(),
                absence_type: c.status().map(str::to_string),
            })
            .collect()
    }

    /// Submits the batch, then rebuilds the session from the store.
    ///
    /// The busy indicator is held for the submit and the reload. Failures are
    /// reported to `notifier` and returned; a failed submit keeps local edits.
    pub fn save(&mut self, store: &dyn RollCallStore, notifier: &dyn Notifier) -> Result<()> {
        let items = self.save_batch();
        let _busy = BusyGuard::acquire(notifier, "saving...");

        let result = store
            .submit_roll_call(
                &self.identity.group,
                self.identity.date,
                self.period.name(),
                &items,
            )
            .and_then(|()| self.refetch(store));
        match result {
            Ok(()) => {
                info!(
                    "saved roll call {} {} period {:?}: {} items",
                    self.identity.group,
                    self.identity.date,
                    self.period.name(),
                    items.len()
                );
                Ok(())
            }
            Err(e) => {
                notifier.report(&e);
                Err(e)
            }
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn period(&self) -> &PeriodRule {
        &self.period
    }

    /// Absence types the operator may pick from.
    pub fn selectable_absences(&self) -> &[String] {
        self.period.allowed_absences()
    }

    pub fn checks(&self) -> &[AttendanceCheck] {
        &self.checks
    }

    pub fn check(&self, student_id: &str) -> Option<&AttendanceCheck> {
        self.checks.iter().find(|c| c.student().id == student_id)
    }

    pub fn locked_count(&self) -> usize {
        self.checks.iter().filter(|c| c.is_locked()).count()
    }

    pub fn summary(&self) -> &[SummaryEntry] {
        &self.summary
    }

    pub fn summary_text(&self) -> &str {
        &self.summary_text
    }

    fn check_mut(&mut self, student_id: &str) -> Result<&mut AttendanceCheck> {
        self.checks
            .iter_mut()
            .find(|c| c.student().id == student_id)
            .ok_or_else(|| {
                RollCallError::Validation(format!("student {:?} is not on this roll call", student_id))
            })
    }

    fn recompute_summary(&mut self) {
        self.summary = summarize(&self.checks);
        self.summary_text = format_summary(&self.summary);
    }
}

fn build_checks(records: Vec<StudentRecord>, period: &Rc<PeriodRule>) -> Vec<AttendanceCheck> {
    records
        .into_iter()
        .map(|r| {
            let check = AttendanceCheck::derive(r, Rc::clone(period));
            if check.is_locked() {
                debug!(
                    "student {} is locked with {:?} in period {:?}",
                    check.student().id,
                    check.status(),
                    period.name()
                );
            }
            check
        })
        .collect()
}

/// Counts editable, marked checks per absence type in first-seen order.
/// Locked checks never count.
pub fn summarize(checks: &[AttendanceCheck]) -> Vec<SummaryEntry> {
    let mut summary: Vec<SummaryEntry> = Vec::new();
    for check in checks {
        if !check.accept_change() {
            continue;
        }
        let Some(code) = check.status() else {
            continue;
        };
        match summary.iter_mut().find(|e| e.absence_type == code) {
            Some(entry) => entry.count += 1,
            None => summary.push(SummaryEntry {
                absence_type: code.to_string(),
                count: 1,
            }),
        }
    }
    summary
}

pub fn format_summary(summary: &[SummaryEntry]) -> String {
    summary
        .iter()
        .map(|e| format!("{}: {}", e.absence_type, e.count))
        .collect::<Vec<_>>()
        .join(", ")
}
