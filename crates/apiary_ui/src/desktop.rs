//! The desktop: session controller for one server connection.
//!
//! Owns the hive, installs the widget namespace and the busy/error/reset
//! hooks, and is the error surface for the flush paths user code does not
//! wrap itself (initial flush, periodic flush, close-all). Top-level
//! frames and dialogs are attached here so a session reset can dispose
//! them wholesale.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, warn};

use apiary_rpc::defer::EventLoopHandle;
use apiary_rpc::hive::{BusyIndicator, ErrorSink, Hive, ResetObserver};
use apiary_rpc::{ObjectId, RpcError, Transport};

use crate::shell::{Severity, UiShell};
use crate::widgets::{self, Dialog, Frame};

pub struct Desktop {
    hive: Rc<Hive>,
    shell: Rc<dyn UiShell>,
    frames: RefCell<Vec<Rc<RefCell<Frame>>>>,
    dialogs: RefCell<Vec<Rc<RefCell<Dialog>>>>,
    busy_depth: Cell<u32>,
    /// Widget the server last requested focus on; used to swallow the
    /// echo `onSetFocus` that the focus change itself would produce.
    last_focus: Cell<Option<ObjectId>>,
}

impl Desktop {
    pub fn new(transport: Box<dyn Transport>, shell: Rc<dyn UiShell>) -> Rc<Self> {
        let hive = Hive::new(transport);
        Self::with_hive(hive, shell)
    }

    /// Wire up an existing hive (tests inject one with a fixed session
    /// id and scripted transport).
    pub fn with_hive(hive: Rc<Hive>, shell: Rc<dyn UiShell>) -> Rc<Self> {
        let desktop = Rc::new(Self {
            hive: Rc::clone(&hive),
            shell,
            frames: RefCell::new(Vec::new()),
            dialogs: RefCell::new(Vec::new()),
            busy_depth: Cell::new(0),
            last_focus: Cell::new(None),
        });

        hive.add_namespace(widgets::namespace(&desktop));
        // Weak hooks: the desktop owns the hive, never the other way
        // around.
        hive.set_busy_indicator(Rc::downgrade(&desktop) as Weak<dyn BusyIndicator>);
        hive.set_error_sink(Rc::downgrade(&desktop) as Weak<dyn ErrorSink>);
        hive.set_reset_observer(Rc::downgrade(&desktop) as Weak<dyn ResetObserver>);

        desktop
    }

    pub fn hive(&self) -> &Rc<Hive> {
        &self.hive
    }

    pub fn set_event_loop(&self, event_loop: Rc<dyn EventLoopHandle>) {
        self.hive.set_event_loop(event_loop);
    }

    /// Flush with the desktop-level error surface: failures show a
    /// detail dialog carrying the server or transport message, and the
    /// result degrades to `Null`.
    pub fn flush(&self) -> Value {
        match self.hive.flush() {
            Ok(value) => value,
            Err(e) => {
                self.show_error("Remote error", &e);
                Value::Null
            }
        }
    }

    pub fn flush_if_pending(&self) {
        if self.hive.is_pending() {
            self.flush();
        }
    }

    /// Post a close event to every attached frame (deferred, so the
    /// server reacts on the next event-loop turn). Used at shutdown.
    pub fn close_all(&self) {
        for frame in self.frames.borrow().iter() {
            frame.borrow().post_close_event();
        }
    }

    fn show_error(&self, category: &str, error: &RpcError) {
        self.shell
            .message_dialog(category, &error.user_message(), &format!("{error:?}"));
    }

    // -- Attached top-level views -------------------------------------------

    pub(crate) fn attach_frame(&self, frame: &Rc<RefCell<Frame>>) {
        self.frames.borrow_mut().push(Rc::clone(frame));
    }

    pub(crate) fn attach_dialog(&self, dialog: &Rc<RefCell<Dialog>>) {
        self.dialogs.borrow_mut().push(Rc::clone(dialog));
    }

    pub(crate) fn detach_frame(&self, id: ObjectId) {
        // The detaching frame is the one currently inside its own invoke,
        // so it is the one that cannot be borrowed here.
        self.frames.borrow_mut().retain(|frame| match frame.try_borrow() {
            Ok(frame) => frame.id() != id,
            Err(_) => false,
        });
    }

    pub fn frames(&self) -> Vec<Rc<RefCell<Frame>>> {
        self.frames.borrow().clone()
    }

    /// True while any attached frame is visible; the headless run loop
    /// exits when nothing is.
    pub fn has_visible_frames(&self) -> bool {
        self.frames
            .borrow()
            .iter()
            .any(|frame| frame.borrow().is_visible())
    }

    // -- Focus bookkeeping --------------------------------------------------

    pub(crate) fn request_focus(&self, id: ObjectId) {
        debug!("server requested focus on {id}");
        self.last_focus.set(Some(id));
    }

    /// True exactly once after the server requested focus on `id`: the
    /// widget's resulting focus event is an echo, not user navigation.
    pub(crate) fn take_suppressed_focus(&self, id: ObjectId) -> bool {
        if self.last_focus.get() == Some(id) {
            self.last_focus.set(None);
            return true;
        }
        false
    }
}

impl BusyIndicator for Desktop {
    fn begin_wait(&self) {
        let depth = self.busy_depth.get();
        self.busy_depth.set(depth + 1);
        if depth == 0 {
            self.shell.begin_busy();
        }
    }

    fn end_wait(&self) {
        match self.busy_depth.get() {
            0 => warn!("end_wait without begin_wait"),
            1 => {
                self.busy_depth.set(0);
                self.shell.end_busy();
            }
            depth => self.busy_depth.set(depth - 1),
        }
    }
}

impl ErrorSink for Desktop {
    fn report(&self, context: &str, error: &RpcError) {
        self.shell.notify(
            Severity::Error,
            &format!("{context}: {}", error.user_message()),
        );
    }
}

impl ResetObserver for Desktop {
    fn on_reset(&self) {
        let frames = std::mem::take(&mut *self.frames.borrow_mut());
        let dialogs = std::mem::take(&mut *self.dialogs.borrow_mut());
        debug!(
            "disposing {} frame(s), {} dialog(s) after reset",
            frames.len(),
            dialogs.len()
        );
        for frame in frames {
            frame.borrow_mut().dispose();
        }
        for dialog in dialogs {
            dialog.borrow_mut().dispose();
        }
        self.last_focus.set(None);
    }
}
