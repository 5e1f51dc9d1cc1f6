//! Single-line text input.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use apiary_rpc::{
    Args, CallbackError, FactoryError, Hive, ObjectId, ObjectRc, RemoteObject, Resolved,
    ServerObject, args,
};

use crate::desktop::Desktop;

pub struct Entry {
    remote: RemoteObject,
    desktop: Weak<Desktop>,
    text: String,
    editable: bool,
}

impl Entry {
    /// Constructor arguments: `([text[, editable]])`.
    pub(crate) fn construct(
        desktop: &Weak<Desktop>,
        hive: &Rc<Hive>,
        id: ObjectId,
        args: &[Resolved],
    ) -> Result<ObjectRc, FactoryError> {
        let args = Args::new("new Entry", args);
        let fail = |e: CallbackError| FactoryError::construction("Entry", e);
        let text = args.opt(0, Args::string).map_err(fail)?.unwrap_or_default();
        let editable = args.opt(1, Args::bool).map_err(fail)?.unwrap_or(true);
        Ok(Rc::new(RefCell::new(Self {
            remote: RemoteObject::new(hive, id),
            desktop: desktop.clone(),
            text,
            editable,
        })))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// One user keystroke's worth of change. Appended, not flushed: the
    /// server batches text changes with whatever event finally flushes.
    pub fn user_edit(&mut self, text: &str, caret: i64) {
        if !self.editable {
            return;
        }
        self.text = text.to_string();
        self.remote.append("onTextChanged", args![text, caret]);
    }

    /// Focus left the field; settle any pending text changes.
    pub fn user_commit(&self) {
        self.remote.flush_if_pending();
    }

    pub fn user_focus(&self) {
        let Some(desktop) = self.desktop.upgrade() else {
            return;
        };
        if desktop.take_suppressed_focus(self.remote.id()) {
            return;
        }
        self.remote.call_after("onSetFocus", args![]);
    }
}

impl ServerObject for Entry {
    fn remote(&self) -> &RemoteObject {
        &self.remote
    }

    fn type_name(&self) -> &'static str {
        "Entry"
    }

    fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError> {
        let args = Args::new(method, args);
        match method {
            "uiSetText" => {
                self.text = args.string(0)?;
                Ok(())
            }
            "uiSetEditable" => {
                self.editable = args.bool(0)?;
                Ok(())
            }
            "uiRequestFocus" => {
                if let Some(desktop) = self.desktop.upgrade() {
                    desktop.request_focus(self.remote.id());
                }
                Ok(())
            }
            _ => Err(CallbackError::UnknownMethod {
                target: self.remote.id(),
                method: method.to_string(),
            }),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
