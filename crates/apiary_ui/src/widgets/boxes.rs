//! Layout containers.
//!
//! Vertical and horizontal boxes share one state shape; the server adds
//! children by object reference, which is where back-reference resolution
//! earns its keep.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use apiary_rpc::{
    Args, CallbackError, FactoryError, Hive, ObjectId, ObjectRc, RemoteObject, Resolved,
    ServerObject,
};

use crate::desktop::Desktop;

struct BoxState {
    remote: RemoteObject,
    label: String,
    titled: bool,
    children: Vec<ObjectRc>,
}

impl BoxState {
    fn construct(
        type_name: &'static str,
        hive: &Rc<Hive>,
        id: ObjectId,
        args: &[Resolved],
    ) -> Result<Self, FactoryError> {
        let args = Args::new(type_name, args);
        let fail = |e: CallbackError| FactoryError::construction(type_name, e);
        let label = args.opt(0, Args::string).map_err(fail)?.unwrap_or_default();
        let titled = args.opt(1, Args::bool).map_err(fail)?.unwrap_or(false);
        Ok(Self {
            remote: RemoteObject::new(hive, id),
            label,
            titled,
            children: Vec::new(),
        })
    }

    fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError> {
        let args = Args::new(method, args);
        match method {
            "uiAdd" => {
                self.children.push(Rc::clone(args.object(0)?));
                Ok(())
            }
            _ => Err(CallbackError::UnknownMethod {
                target: self.remote.id(),
                method: method.to_string(),
            }),
        }
    }
}

macro_rules! box_widget {
    ($ty:ident, $name:literal) => {
        pub struct $ty {
            state: BoxState,
        }

        impl $ty {
            /// Constructor arguments: `([label[, titled]])`.
            pub(crate) fn construct(
                _desktop: &Weak<Desktop>,
                hive: &Rc<Hive>,
                id: ObjectId,
                args: &[Resolved],
            ) -> Result<ObjectRc, FactoryError> {
                Ok(Rc::new(RefCell::new(Self {
                    state: BoxState::construct($name, hive, id, args)?,
                })))
            }

            pub fn label(&self) -> &str {
                &self.state.label
            }

            pub fn is_titled(&self) -> bool {
                self.state.titled
            }

            pub fn children(&self) -> &[ObjectRc] {
                &self.state.children
            }
        }

        impl ServerObject for $ty {
            fn remote(&self) -> &RemoteObject {
                &self.state.remote
            }

            fn type_name(&self) -> &'static str {
                $name
            }

            fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError> {
                self.state.invoke(method, args)
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }
    };
}

box_widget!(VBox, "VBox");
box_widget!(HBox, "HBox");

#[cfg(test)]
mod tests {
    use super::*;
    use apiary_rpc::testing::{Probe, scripted_hive};

    #[test]
    fn add_keeps_the_referenced_instance() {
        let (hive, _transport) = scripted_hive();
        let vbox = VBox::construct(&Weak::new(), &hive, ObjectId(1), &[]).unwrap();
        let child = Probe::construct(&hive, ObjectId(2), &[]).unwrap();

        vbox.borrow_mut()
            .invoke("uiAdd", &[Resolved::Object(Rc::clone(&child))])
            .unwrap();

        let vbox = vbox.borrow();
        let vbox = vbox.as_any().downcast_ref::<VBox>().unwrap();
        assert_eq!(vbox.children().len(), 1);
        assert!(Rc::ptr_eq(&vbox.children()[0], &child));
    }

    #[test]
    fn add_requires_an_object_reference() {
        let (hive, _transport) = scripted_hive();
        let hbox = HBox::construct(
            &Weak::new(),
            &hive,
            ObjectId(1),
            &[Resolved::Str("row".into()), Resolved::Bool(true)],
        )
        .unwrap();

        {
            let hbox = hbox.borrow();
            let hbox = hbox.as_any().downcast_ref::<HBox>().unwrap();
            assert_eq!(hbox.label(), "row");
            assert!(hbox.is_titled());
        }

        let err = hbox
            .borrow_mut()
            .invoke("uiAdd", &[Resolved::Int(2)])
            .unwrap_err();
        assert!(matches!(err, CallbackError::ArgumentMismatch { .. }));
    }
}
