//! Call descriptors and their wire encoding.
//!
//! One descriptor is one pending client-to-server invocation: target
//! object id, method name, positional arguments, keyword arguments.
//! Arguments are encoded at construction time; a remote-object argument
//! becomes the single-key record `{"__roid__": id}` instead of being
//! inlined. Descriptors are immutable once built.

use std::fmt;

use serde_json::{Map, Value, json};

use crate::object::{ObjectId, RemoteObject};

/// The sole textual marker for object back-references in wire data.
pub const ROID_KEY: &str = "__roid__";

/// One encoded positional argument.
///
/// Scalars and plain JSON pass through; `&RemoteObject` encodes as an
/// object reference. Only one level of reference encoding exists;
/// arguments are values or direct object references, never graphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg(Value);

impl Arg {
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<&RemoteObject> for Arg {
    fn from(object: &RemoteObject) -> Self {
        Arg(json!({ ROID_KEY: object.id() }))
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg(value)
    }
}

impl From<()> for Arg {
    fn from(_: ()) -> Self {
        Arg(Value::Null)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg(Value::Bool(v))
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg(json!(v))
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg(json!(v))
    }
}

impl From<u32> for Arg {
    fn from(v: u32) -> Self {
        Arg(json!(v))
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg(json!(v))
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg(Value::String(v.to_string()))
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg(Value::String(v))
    }
}

/// Build a `Vec<Arg>` from mixed argument expressions.
///
/// ```ignore
/// button.append("onKeyPressed", args![13, false, true, false]);
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::call::Arg>::new() };
    ($($arg:expr),+ $(,)?) => {
        vec![$($crate::call::Arg::from($arg)),+]
    };
}

/// One queued client-to-server invocation, immutable once created.
#[derive(Debug, Clone)]
pub struct RemoteCall {
    target: ObjectId,
    method: String,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

impl RemoteCall {
    pub fn new(target: ObjectId, method: &str, args: Vec<Arg>) -> Self {
        Self {
            target,
            method: method.to_string(),
            args: args.into_iter().map(Arg::into_value).collect(),
            kwargs: Map::new(),
        }
    }

    /// Attach keyword arguments. Rarely used; the map is always present
    /// on the wire regardless.
    pub fn with_kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn target(&self) -> ObjectId {
        self.target
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The ordered 4-element wire record:
    /// `[targetId, method, args, kwargs]`.
    pub fn to_wire(&self) -> Value {
        json!([self.target, self.method, self.args, self.kwargs])
    }
}

// Display is `<id>.method(arg, arg)`, used by debug traces.
impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>.{}(", self.target, self.method)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::RemoteObject;
    use crate::testing::scripted_hive;

    #[test]
    fn wire_form_is_a_four_tuple() {
        let call = RemoteCall::new(ObjectId(5), "onButton", args![]);
        assert_eq!(call.to_wire(), json!([5, "onButton", [], {}]));
    }

    #[test]
    fn scalar_args_pass_through() {
        let call = RemoteCall::new(
            ObjectId(9),
            "onKeyPressed",
            args![13, true, 1.5, "x", ()],
        );
        assert_eq!(
            call.to_wire(),
            json!([9, "onKeyPressed", [13, true, 1.5, "x", null], {}])
        );
    }

    #[test]
    fn remote_object_arg_encodes_as_roid_record() {
        let (hive, _transport) = scripted_hive();
        let other = RemoteObject::new(&hive, ObjectId(7));

        let call = RemoteCall::new(ObjectId(3), "uiAdd", args![&other]);
        assert_eq!(call.to_wire(), json!([3, "uiAdd", [{ "__roid__": 7 }], {}]));
    }

    #[test]
    fn kwargs_ride_the_fourth_slot() {
        let mut kwargs = Map::new();
        kwargs.insert("flush".into(), json!(true));
        let call = RemoteCall::new(ObjectId(2), "onClose", args![]).with_kwargs(kwargs);
        assert_eq!(call.to_wire(), json!([2, "onClose", [], { "flush": true }]));
    }

    #[test]
    fn display_names_target_and_method() {
        let call = RemoteCall::new(ObjectId(5), "onTextChanged", args!["abc", 3]);
        assert_eq!(call.to_string(), "<5>.onTextChanged(\"abc\", 3)");
    }
}
