//! Push button.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use apiary_rpc::{
    Args, CallbackError, FactoryError, Hive, ObjectId, ObjectRc, RemoteObject, Resolved,
    ServerObject, args,
};

use crate::desktop::Desktop;

pub struct Button {
    remote: RemoteObject,
    desktop: Weak<Desktop>,
    label: String,
    tip: Option<String>,
    enabled: bool,
}

impl Button {
    /// Constructor arguments: `(label[, tip])`.
    pub(crate) fn construct(
        desktop: &Weak<Desktop>,
        hive: &Rc<Hive>,
        id: ObjectId,
        args: &[Resolved],
    ) -> Result<ObjectRc, FactoryError> {
        let args = Args::new("new Button", args);
        let fail = |e: CallbackError| FactoryError::construction("Button", e);
        let label = args.string(0).map_err(fail)?;
        let tip = args.opt(1, Args::string).map_err(fail)?;
        Ok(Rc::new(RefCell::new(Self {
            remote: RemoteObject::new(hive, id),
            desktop: desktop.clone(),
            label,
            tip,
            enabled: true,
        })))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tip(&self) -> Option<&str> {
        self.tip.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// User activation: round-trips immediately so the server's reaction
    /// lands before the event handler returns.
    pub fn click(&self) {
        if !self.enabled {
            return;
        }
        self.remote.call("onButton", args![]);
    }

    /// Keyboard focus landed here by user navigation.
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

impl ServerObject for Button {
    fn remote(&self) -> &RemoteObject {
        &self.remote
    }

    fn type_name(&self) -> &'static str {
        "Button"
    }

    fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError> {
        let args = Args::new(method, args);
        match method {
            "uiSetLabel" => {
                self.label = args.string(0)?;
                Ok(())
            }
            "uiSetEnabled" => {
                self.enabled = args.bool(0)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use apiary_rpc::testing::scripted_hive;
    use serde_json::json;

    fn button(hive: &Rc<Hive>) -> ObjectRc {
        Button::construct(
            &Weak::new(),
            hive,
            ObjectId(12),
            &[Resolved::Str("OK".into())],
        )
        .unwrap()
    }

    #[test]
    fn click_round_trips_immediately() {
        let (hive, transport) = scripted_hive();
        let button = button(&hive);

        let b = button.borrow();
        b.as_any().downcast_ref::<Button>().unwrap().click();
        drop(b);

        assert_eq!(transport.request_count(), 1);
        assert_eq!(
            transport.request_calls(0),
            json!([[12, "onButton", [], {}]])
        );
        let _ = hive;
    }

    #[test]
    fn disabled_button_does_not_report_clicks() {
        let (hive, transport) = scripted_hive();
        let button = button(&hive);

        button
            .borrow_mut()
            .invoke("uiSetEnabled", &[Resolved::Bool(false)])
            .unwrap();
        button
            .borrow()
            .as_any()
            .downcast_ref::<Button>()
            .unwrap()
            .click();

        assert_eq!(transport.request_count(), 0);
        let _ = hive;
    }

    #[test]
    fn enabled_flag_requires_a_bool() {
        let (hive, _transport) = scripted_hive();
        let button = button(&hive);
        let err = button
            .borrow_mut()
            .invoke("uiSetEnabled", &[Resolved::Int(1)])
            .unwrap_err();
        assert!(matches!(err, CallbackError::ArgumentMismatch { .. }));
    }
}
