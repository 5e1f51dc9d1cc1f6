//! Static text.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use apiary_rpc::{
    Args, CallbackError, FactoryError, Hive, ObjectId, ObjectRc, RemoteObject, Resolved,
    ServerObject,
};

use crate::desktop::Desktop;

pub struct Label {
    remote: RemoteObject,
    text: String,
    alignment: String,
}

impl Label {
    /// Constructor arguments: `(text[, alignment])`.
    pub(crate) fn construct(
        _desktop: &Weak<Desktop>,
        hive: &Rc<Hive>,
        id: ObjectId,
        args: &[Resolved],
    ) -> Result<ObjectRc, FactoryError> {
        let args = Args::new("new Label", args);
        let fail = |e: CallbackError| FactoryError::construction("Label", e);
        let text = args.string(0).map_err(fail)?;
        let alignment = args
            .opt(1, Args::string)
            .map_err(fail)?
            .unwrap_or_else(|| "left".to_string());
        Ok(Rc::new(RefCell::new(Self {
            remote: RemoteObject::new(hive, id),
            text,
            alignment,
        })))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn alignment(&self) -> &str {
        &self.alignment
    }
}

impl ServerObject for Label {
    fn remote(&self) -> &RemoteObject {
        &self.remote
    }

    fn type_name(&self) -> &'static str {
        "Label"
    }

    fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError> {
        let args = Args::new(method, args);
        match method {
            "uiSetText" => {
                self.text = args.string(0)?;
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
    fn set_text_replaces_text() {
        let (hive, _transport) = scripted_hive();
        let label = Label::construct(
            &Weak::new(),
            &hive,
            ObjectId(4),
            &[Resolved::Str("Total:".into())],
        )
        .unwrap();

        label
            .borrow_mut()
            .invoke("uiSetText", &[Resolved::Str("Sum:".into())])
            .unwrap();

        let label = label.borrow();
        let label = label.as_any().downcast_ref::<Label>().unwrap();
        assert_eq!(label.text(), "Sum:");
        assert_eq!(label.alignment(), "left");
    }
}
