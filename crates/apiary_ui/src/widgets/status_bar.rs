//! Status bar with positional sections.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use apiary_rpc::{
    Args, CallbackError, FactoryError, Hive, ObjectId, ObjectRc, RemoteObject, Resolved,
    ServerObject,
};

use crate::desktop::Desktop;

pub struct StatusBar {
    remote: RemoteObject,
    sections: HashMap<i64, String>,
}

impl StatusBar {
    pub(crate) fn construct(
        _desktop: &Weak<Desktop>,
        hive: &Rc<Hive>,
        id: ObjectId,
        _args: &[Resolved],
    ) -> Result<ObjectRc, FactoryError> {
        Ok(Rc::new(RefCell::new(Self {
            remote: RemoteObject::new(hive, id),
            sections: HashMap::new(),
        })))
    }

    pub fn section(&self, position: i64) -> Option<&str> {
        self.sections.get(&position).map(String::as_str)
    }
}

impl ServerObject for StatusBar {
    fn remote(&self) -> &RemoteObject {
        &self.remote
    }

    fn type_name(&self) -> &'static str {
        "StatusBar"
    }

    fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError> {
        let args = Args::new(method, args);
        match method {
            "uiSetStatusText" => {
                let text = args.string(0)?;
                let position = args.opt(1, Args::int)?.unwrap_or(0);
                self.sections.insert(position, text);
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
