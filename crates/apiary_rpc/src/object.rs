//! Remote-object identity and the server-facing capability trait.
//!
//! Every server-visible object embeds a [`RemoteObject`]: the id the
//! server assigned at construction plus a weak back-reference to the
//! owning hive (the hive always outlives its objects). The object layer
//! is best-effort: round-trip failures are reported through the hive's
//! error sink instead of propagating into UI event code.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::call::{Arg, RemoteCall};
use crate::error::CallbackError;
use crate::hive::Hive;
use crate::value::Resolved;

/// Server-assigned object identity, unique within a hive's lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub i64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered, server-drivable object.
pub type ObjectRc = Rc<RefCell<dyn ServerObject>>;

/// Capability interface every server-constructible type implements.
///
/// The method surface is the object's own: the server picks methods by
/// string name and `invoke` dispatches them against resolved argument
/// values. Implementations keep no transport or registry state beyond
/// the embedded [`RemoteObject`].
pub trait ServerObject: Any {
    fn remote(&self) -> &RemoteObject;

    /// Short type label for traces, e.g. `"Button"`.
    fn type_name(&self) -> &'static str;

    /// Dispatch a server-invoked method by name.
    fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Identity-bearing proxy base embedded in every server-visible object.
pub struct RemoteObject {
    id: ObjectId,
    hive: Weak<Hive>,
}

impl RemoteObject {
    pub fn new(hive: &Rc<Hive>, id: ObjectId) -> Self {
        Self {
            id,
            hive: Rc::downgrade(hive),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The owning hive. `None` only if the hive was torn down while the
    /// object lived on, which the ownership model rules out.
    pub fn hive(&self) -> Option<Rc<Hive>> {
        self.hive.upgrade()
    }

    fn hive_for(&self, method: &str) -> Option<Rc<Hive>> {
        let hive = self.hive.upgrade();
        if hive.is_none() {
            error!("object {}: hive gone, dropping {method}", self.id);
        }
        hive
    }

    /// Build a call descriptor targeting this object.
    pub fn create_call(&self, method: &str, args: Vec<Arg>) -> RemoteCall {
        RemoteCall::new(self.id, method, args)
    }

    /// Queue a call without flushing.
    pub fn append(&self, method: &str, args: Vec<Arg>) {
        if let Some(hive) = self.hive_for(method) {
            hive.append_call(self.create_call(method, args));
        }
    }

    /// Queue a call and flush immediately, returning the server's value
    /// for the last call in the batch. Best-effort: an `RpcError` is
    /// reported locally and `Null` returned.
    pub fn call(&self, method: &str, args: Vec<Arg>) -> Value {
        let Some(hive) = self.hive_for(method) else {
            return Value::Null;
        };
        hive.append_call(self.create_call(method, args));
        match hive.flush() {
            Ok(value) => value,
            Err(e) => {
                hive.report(&format!("call {method} on object {}", self.id), &e);
                Value::Null
            }
        }
    }

    /// Queue a call to be appended and flushed on the next turn of the
    /// UI event loop (see the deferred-call queue).
    pub fn call_after(&self, method: &str, args: Vec<Arg>) {
        if let Some(hive) = self.hive_for(method) {
            hive.call_after(self.create_call(method, args));
        }
    }

    /// Flush whatever is queued. Best-effort like [`Self::call`].
    pub fn flush(&self) -> Value {
        let Some(hive) = self.hive_for("flush") else {
            return Value::Null;
        };
        match hive.flush() {
            Ok(value) => value,
            Err(e) => {
                hive.report("flush", &e);
                Value::Null
            }
        }
    }

    /// Flush only if calls are pending, to settle appended events before
    /// reading server-dependent state.
    pub fn flush_if_pending(&self) {
        if let Some(hive) = self.hive_for("flush_if_pending") {
            if hive.is_pending() {
                self.flush();
            }
        }
    }
}

impl fmt::Debug for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<object {}>", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scripted_hive;
    use serde_json::json;

    #[test]
    fn object_id_serializes_transparently() {
        assert_eq!(serde_json::to_value(ObjectId(42)).unwrap(), json!(42));
        let id: ObjectId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(id, ObjectId(7));
    }

    #[test]
    fn append_queues_without_sending() {
        let (hive, transport) = scripted_hive();
        let object = RemoteObject::new(&hive, ObjectId(5));

        object.append("onKeyPressed", crate::args![13, false, true, false]);
        assert!(hive.is_pending());
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn call_flushes_and_returns_last_value() {
        let (hive, transport) = scripted_hive();
        transport.push_result(json!([[], 0, "clicked"]));
        let object = RemoteObject::new(&hive, ObjectId(5));

        let value = object.call("onButton", crate::args![]);
        assert_eq!(value, json!("clicked"));
        assert!(!hive.is_pending());
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn call_swallows_and_reports_failures() {
        let (hive, transport) = scripted_hive();
        transport.push_error(json!("AccessError: denied"));
        let object = RemoteObject::new(&hive, ObjectId(5));

        // The error must not propagate into event-handling code.
        let value = object.call("onButton", crate::args![]);
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn flush_if_pending_is_a_noop_on_empty_queue() {
        let (hive, transport) = scripted_hive();
        let object = RemoteObject::new(&hive, ObjectId(5));

        object.flush_if_pending();
        assert_eq!(transport.request_count(), 0);

        object.append("onTextChanged", crate::args!["abc", 3]);
        object.flush_if_pending();
        assert_eq!(transport.request_count(), 1);
        let _ = hive;
    }

    #[test]
    fn orphaned_object_degrades_to_null() {
        let object = {
            let (hive, _transport) = scripted_hive();
            RemoteObject::new(&hive, ObjectId(5))
        };
        // Hive dropped: calls report locally and return Null.
        assert_eq!(object.call("onButton", crate::args![]), Value::Null);
        object.append("onButton", crate::args![]);
        object.flush_if_pending();
    }
}
