//! The pluggable user-facing surface.
//!
//! The engine is headless; whatever actually renders wait cursors,
//! dialogs, and notifications implements [`UiShell`]. The console shell
//! routes everything through the log, which is all a headless run needs.

use tracing::{debug, error, info, warn};

/// Notification severity, for shells that render a notification area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

pub trait UiShell {
    /// The desktop entered its outermost busy scope.
    fn begin_busy(&self);

    /// The desktop left its outermost busy scope.
    fn end_busy(&self);

    /// Modal-style dialog with a short message and full diagnostic detail
    /// available on demand.
    fn message_dialog(&self, category: &str, message: &str, detail: &str);

    /// Non-blocking user-visible notification.
    fn notify(&self, severity: Severity, message: &str);
}

/// Shell for headless runs: everything goes to the log.
#[derive(Debug, Default)]
pub struct ConsoleShell;

impl UiShell for ConsoleShell {
    fn begin_busy(&self) {
        debug!("busy");
    }

    fn end_busy(&self) {
        debug!("idle");
    }

    fn message_dialog(&self, category: &str, message: &str, detail: &str) {
        error!("{category}: {message}");
        debug!("{category} detail: {detail}");
    }

    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

/// Records every shell interaction, for assertions.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingShell {
    pub busy_transitions: std::cell::RefCell<Vec<&'static str>>,
    pub dialogs: std::cell::RefCell<Vec<(String, String)>>,
    pub notifications: std::cell::RefCell<Vec<(Severity, String)>>,
}

#[cfg(test)]
impl UiShell for RecordingShell {
    fn begin_busy(&self) {
        self.busy_transitions.borrow_mut().push("begin");
    }

    fn end_busy(&self) {
        self.busy_transitions.borrow_mut().push("end");
    }

    fn message_dialog(&self, category: &str, message: &str, _detail: &str) {
        self.dialogs
            .borrow_mut()
            .push((category.to_string(), message.to_string()));
    }

    fn notify(&self, severity: Severity, message: &str) {
        self.notifications
            .borrow_mut()
            .push((severity, message.to_string()));
    }
}
