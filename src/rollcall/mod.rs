//! Roll-call attendance state engine.

pub mod catalog;
pub mod check;
pub mod group;
pub mod normalize;
pub mod notify;
pub mod period;
pub mod session;
pub mod store;
pub mod student;

pub use catalog::{AbsenceCatalog, AbsenceCategory};
pub use check::{selected_attendance, AttendanceBadge, AttendanceCheck};
pub use group::{GroupKind, GroupRef};
pub use normalize::OneOrMany;
pub use notify::{BusyGuard, Notice, NoticeLog, Notifier};
pub use period::{PeriodRule, PeriodSource};
pub use session::{RollCallSession, SessionIdentity, SummaryEntry};
pub use store::{RollCallItem, RollCallStore};
pub use student::{PeriodStatus, StudentRecord, StudentSource};
