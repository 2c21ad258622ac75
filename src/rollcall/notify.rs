use serde::Serialize;
use std::cell::{Cell, RefCell};

use crate::error::RollCallError;

/// Operator-facing messages.
pub trait Notifier {
    /// Short transient message.
    fn snack(&self, message: &str);
    /// A failure the operator should see as-is.
    fn report(&self, error: &RollCallError);
    fn busy_begin(&self, message: &str);
    fn busy_end(&self);
}

/// Holds a busy indicator until dropped.
#[must_use = "the busy indicator is released when the guard is dropped"]
pub struct BusyGuard<'a> {
    notifier: &'a dyn Notifier,
}

impl<'a> BusyGuard<'a> {
    pub fn acquire(notifier: &'a dyn Notifier, message: &str) -> Self {
        notifier.busy_begin(message);
        Self { notifier }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.notifier.busy_end();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    Snack { message: String },
    Error { code: String, message: String },
    Busy { message: String },
}

/// Collects the notices raised while handling one request.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: RefCell<Vec<Notice>>,
    busy_depth: Cell<usize>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy_depth.get() > 0
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn into_notices(self) -> Vec<Notice> {
        self.notices.into_inner()
    }
}

impl Notifier for NoticeLog {
    fn snack(&self, message: &str) {
        self.notices.borrow_mut().push(Notice::Snack {
            message: message.to_string(),
        });
    }

    fn report(&self, error: &RollCallError) {
        self.notices.borrow_mut().push(Notice::Error {
            code: error.code().to_string(),
            message: error.to_string(),
        });
    }

    fn busy_begin(&self, message: &str) {
        self.busy_depth.set(self.busy_depth.get() + 1);
        self.notices.borrow_mut().push(Notice::Busy {
            message: message.to_string(),
        });
    }

    fn busy_end(&self) {
        self.busy_depth.set(self.busy_depth.get().saturating_sub(1));
    }
}
