//! Headless server-constructible widget set.
//!
//! These types are the collaborator boundary: each one embeds a
//! [`RemoteObject`](apiary_rpc::RemoteObject), takes its constructor
//! arguments from a `"new <Type>"` callback, dispatches server-invoked
//! methods by name, and reports user input back through the engine. They
//! hold widget state only; rendering belongs to whatever sits behind the
//! desktop's shell.

mod boxes;
mod button;
mod dialog;
mod entry;
mod frame;
mod label;
mod status_bar;

pub use boxes::{HBox, VBox};
pub use button::Button;
pub use dialog::Dialog;
pub use entry::Entry;
pub use frame::Frame;
pub use label::Label;
pub use status_bar::StatusBar;

use std::rc::Rc;

use apiary_rpc::Namespace;

use crate::desktop::Desktop;

/// The constructor table the desktop installs on its hive.
pub fn namespace(desktop: &Rc<Desktop>) -> Namespace {
    let mut namespace = Namespace::new("widgets");

    macro_rules! register {
        ($name:literal, $ty:ty) => {{
            let desktop = Rc::downgrade(desktop);
            namespace.register($name, move |hive, id, args| {
                <$ty>::construct(&desktop, hive, id, args)
            });
        }};
    }

    register!("Frame", Frame);
    register!("Dialog", Dialog);
    register!("VBox", VBox);
    register!("HBox", HBox);
    register!("Label", Label);
    register!("Entry", Entry);
    register!("Button", Button);
    register!("StatusBar", StatusBar);

    namespace
}
