//! Modal-capable dialog window.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use apiary_rpc::{
    Args, CallbackError, FactoryError, Hive, ObjectId, ObjectRc, RemoteObject, Resolved,
    ServerObject, args,
};

use crate::desktop::Desktop;

pub struct Dialog {
    remote: RemoteObject,
    desktop: Weak<Desktop>,
    title: String,
    visible: bool,
    modal: bool,
    disposed: bool,
}

impl Dialog {
    /// Constructor arguments: `(title)`.
    pub(crate) fn construct(
        desktop: &Weak<Desktop>,
        hive: &Rc<Hive>,
        id: ObjectId,
        args: &[Resolved],
    ) -> Result<ObjectRc, FactoryError> {
        let args = Args::new("new Dialog", args);
        let title = args
            .string(0)
            .map_err(|e| FactoryError::construction("Dialog", e))?;

        let dialog = Rc::new(RefCell::new(Self {
            remote: RemoteObject::new(hive, id),
            desktop: desktop.clone(),
            title,
            visible: false,
            modal: false,
            disposed: false,
        }));
        if let Some(desktop) = desktop.upgrade() {
            desktop.attach_dialog(&dialog);
        }
        Ok(dialog)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_modal(&self) -> bool {
        self.modal
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn post_close_event(&self) {
        self.remote.call_after("onClose", args![]);
    }

    pub(crate) fn dispose(&mut self) {
        self.visible = false;
        self.disposed = true;
    }
}

impl ServerObject for Dialog {
    fn remote(&self) -> &RemoteObject {
        &self.remote
    }

    fn type_name(&self) -> &'static str {
        "Dialog"
    }

    fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError> {
        let args = Args::new(method, args);
        match method {
            "uiSetTitle" => {
                self.title = args.string(0)?;
                Ok(())
            }
            "uiShow" => {
                self.modal = args.opt(0, Args::bool)?.unwrap_or(true);
                self.visible = true;
                Ok(())
            }
            "uiClose" => {
                self.visible = false;
                Ok(())
            }
            "uiDestroy" => {
                self.dispose();
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

#[cfg(test)]
mod tests {
    use super::*;
    use apiary_rpc::testing::scripted_hive;

    #[test]
    fn dialogs_default_to_modal_show() {
        let (hive, _transport) = scripted_hive();
        let dialog = Dialog::construct(
            &Weak::new(),
            &hive,
            ObjectId(20),
            &[Resolved::Str("Confirm".into())],
        )
        .unwrap();

        dialog.borrow_mut().invoke("uiShow", &[]).unwrap();
        let dialog = dialog.borrow();
        let dialog = dialog.as_any().downcast_ref::<Dialog>().unwrap();
        assert!(dialog.is_visible());
        assert!(dialog.is_modal());
        assert_eq!(dialog.title(), "Confirm");
    }

    #[test]
    fn destroy_after_show_disposes() {
        let (hive, _transport) = scripted_hive();
        let dialog = Dialog::construct(
            &Weak::new(),
            &hive,
            ObjectId(20),
            &[Resolved::Str("Confirm".into())],
        )
        .unwrap();

        dialog.borrow_mut().invoke("uiShow", &[]).unwrap();
        dialog.borrow_mut().invoke("uiDestroy", &[]).unwrap();
        let dialog = dialog.borrow();
        let dialog = dialog.as_any().downcast_ref::<Dialog>().unwrap();
        assert!(dialog.is_disposed());
    }
}
