//! Top-level window.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use apiary_rpc::{
    Args, CallbackError, FactoryError, Hive, ObjectId, ObjectRc, RemoteObject, Resolved,
    ServerObject, args,
};

use crate::desktop::Desktop;

/// A server-driven top-level window, attached to the desktop on
/// construction. The user closing it is reported as a deferred `onClose`
/// event; the server decides whether the frame actually goes away.
pub struct Frame {
    remote: RemoteObject,
    desktop: Weak<Desktop>,
    title: String,
    style: Vec<String>,
    visible: bool,
    modal: bool,
    fit: bool,
    disposed: bool,
}

impl Frame {
    /// Constructor arguments: `(title[, style])` where `style` is a list
    /// of window-style flags.
    pub(crate) fn construct(
        desktop: &Weak<Desktop>,
        hive: &Rc<Hive>,
        id: ObjectId,
        args: &[Resolved],
    ) -> Result<ObjectRc, FactoryError> {
        let args = Args::new("new Frame", args);
        let fail = |e: CallbackError| FactoryError::construction("Frame", e);
        let title = args.string(0).map_err(fail)?;
        let style = match args.opt(1, Args::list).map_err(fail)? {
            Some(flags) => flags
                .iter()
                .map(|flag| match flag {
                    Resolved::Str(s) => Ok(s.clone()),
                    other => Err(fail(CallbackError::ArgumentMismatch {
                        method: "new Frame".into(),
                        index: 1,
                        expected: "list of strings",
                        got: other.kind().to_string(),
                    })),
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let frame = Rc::new(RefCell::new(Self {
            remote: RemoteObject::new(hive, id),
            desktop: desktop.clone(),
            title,
            style,
            visible: false,
            modal: false,
            fit: false,
            disposed: false,
        }));
        if let Some(desktop) = desktop.upgrade() {
            desktop.attach_frame(&frame);
        }
        Ok(frame)
    }

    pub fn id(&self) -> ObjectId {
        self.remote.id()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn style(&self) -> &[String] {
        &self.style
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

    /// Whether the server asked the window to size itself to content on
    /// next show.
    pub fn wants_fit(&self) -> bool {
        self.fit
    }

    /// The user asked to close the window. The server owns the decision,
    /// so this only reports.
    pub fn post_close_event(&self) {
        self.remote.call_after("onClose", args![]);
    }

    /// Tear down window state. Idempotent.
    pub(crate) fn dispose(&mut self) {
        self.visible = false;
        self.disposed = true;
    }
}

impl ServerObject for Frame {
    fn remote(&self) -> &RemoteObject {
        &self.remote
    }

    fn type_name(&self) -> &'static str {
        "Frame"
    }

    fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError> {
        let args = Args::new(method, args);
        match method {
            "uiSetTitle" => {
                self.title = args.string(0)?;
                Ok(())
            }
            "uiShow" => {
                self.modal = args.opt(0, Args::bool)?.unwrap_or(false);
                self.visible = true;
                Ok(())
            }
            "uiClose" => {
                self.visible = false;
                Ok(())
            }
            "uiFit" => {
                // Applied at show time; only the flag matters here.
                self.fit = true;
                Ok(())
            }
            "uiDestroy" => {
                self.dispose();
                if let Some(desktop) = self.desktop.upgrade() {
                    desktop.detach_frame(self.remote.id());
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

#[cfg(test)]
mod tests {
    use super::*;
    use apiary_rpc::testing::scripted_hive;

    fn bare_frame(title: &str) -> Frame {
        let (hive, _transport) = scripted_hive();
        Frame {
            remote: RemoteObject::new(&hive, ObjectId(10)),
            desktop: Weak::new(),
            title: title.into(),
            style: Vec::new(),
            visible: false,
            modal: false,
            fit: false,
            disposed: false,
        }
    }

    #[test]
    fn show_and_close_toggle_visibility() {
        let mut frame = bare_frame("Orders");
        assert!(!frame.is_visible());

        frame.invoke("uiShow", &[Resolved::Bool(true)]).unwrap();
        assert!(frame.is_visible());
        assert!(frame.is_modal());

        frame.invoke("uiClose", &[]).unwrap();
        assert!(!frame.is_visible());
        assert!(!frame.is_disposed());
    }

    #[test]
    fn show_without_modal_argument_defaults_modeless() {
        let mut frame = bare_frame("Orders");
        frame.invoke("uiShow", &[]).unwrap();
        assert!(frame.is_visible());
        assert!(!frame.is_modal());
    }

    #[test]
    fn set_title_replaces_title() {
        let mut frame = bare_frame("Old");
        frame
            .invoke("uiSetTitle", &[Resolved::Str("New".into())])
            .unwrap();
        assert_eq!(frame.title(), "New");
    }

    #[test]
    fn title_must_be_a_string() {
        let (hive, _transport) = scripted_hive();
        let err =
            Frame::construct(&Weak::new(), &hive, ObjectId(10), &[Resolved::Int(3)])
                .err()
                .unwrap();
        assert!(matches!(err, FactoryError::Construction { .. }));
    }

    #[test]
    fn destroy_disposes() {
        let mut frame = bare_frame("Orders");
        frame.invoke("uiShow", &[]).unwrap();
        frame.invoke("uiDestroy", &[]).unwrap();
        assert!(frame.is_disposed());
        assert!(!frame.is_visible());
    }
}
