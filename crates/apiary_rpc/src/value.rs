//! Resolved callback arguments and argument-kind normalization.
//!
//! Server callback arguments arrive as JSON with `{"__roid__": id}`
//! back-references. The hive resolves them into [`Resolved`] trees whose
//! object nodes are the live registered instances. Before dispatch each
//! argument is normalized through the hive's alias table so that method
//! signatures match argument runtime kinds (a server encoding integers
//! as floats, say).

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::CallbackError;
use crate::object::ObjectRc;

/// The runtime kind of one resolved argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Object,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::List => "list",
            Self::Map => "map",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A callback argument with object references resolved to live instances.
#[derive(Clone)]
pub enum Resolved {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Resolved>),
    /// A plain JSON object that is not a back-reference.
    Map(Map<String, Value>),
    /// A resolved back-reference: the registered instance itself, not a
    /// copy.
    Object(ObjectRc),
}

impl Resolved {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
            Self::Object(_) => ValueKind::Object,
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => v.fmt(f),
            Self::Int(v) => v.fmt(f),
            Self::Float(v) => v.fmt(f),
            Self::Str(v) => v.fmt(f),
            Self::List(v) => v.fmt(f),
            Self::Map(v) => write!(f, "{}", Value::Object(v.clone())),
            Self::Object(o) => match o.try_borrow() {
                Ok(o) => write!(f, "<{} {}>", o.type_name(), o.remote().id()),
                Err(_) => f.write_str("<object>"),
            },
        }
    }
}

/// Kind-to-kind translation table applied to every callback argument
/// before dispatch.
///
/// An alias that cannot be applied losslessly leaves the argument
/// unchanged and lets dispatch report the mismatch.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    map: HashMap<ValueKind, ValueKind>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: ValueKind, to: ValueKind) {
        self.map.insert(from, to);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn normalize(&self, arg: Resolved) -> Resolved {
        match self.map.get(&arg.kind()) {
            Some(&to) => coerce(&arg, to).unwrap_or(arg),
            None => arg,
        }
    }
}

/// Lossless kind coercions; anything else is `None`.
fn coerce(arg: &Resolved, to: ValueKind) -> Option<Resolved> {
    match (arg, to) {
        (Resolved::Float(f), ValueKind::Int) if f.fract() == 0.0 => Some(Resolved::Int(*f as i64)),
        (Resolved::Int(i), ValueKind::Float) => Some(Resolved::Float(*i as f64)),
        (Resolved::Int(0), ValueKind::Bool) => Some(Resolved::Bool(false)),
        (Resolved::Int(1), ValueKind::Bool) => Some(Resolved::Bool(true)),
        (Resolved::Bool(b), ValueKind::Int) => Some(Resolved::Int(i64::from(*b))),
        _ => None,
    }
}

/// Typed accessors over one callback's argument list.
///
/// Mismatches carry the method name and argument index so dispatch
/// failures name the offending call.
pub struct Args<'a> {
    method: &'a str,
    args: &'a [Resolved],
}

impl<'a> Args<'a> {
    pub fn new(method: &'a str, args: &'a [Resolved]) -> Self {
        Self { method, args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    fn mismatch(&self, index: usize, expected: &'static str, got: String) -> CallbackError {
        CallbackError::ArgumentMismatch {
            method: self.method.to_string(),
            index,
            expected,
            got,
        }
    }

    pub fn get(&self, index: usize) -> Result<&'a Resolved, CallbackError> {
        self.args
            .get(index)
            .ok_or_else(|| self.mismatch(index, "an argument", "end of arguments".into()))
    }

    pub fn str(&self, index: usize) -> Result<&'a str, CallbackError> {
        match self.get(index)? {
            Resolved::Str(s) => Ok(s),
            other => Err(self.mismatch(index, "string", other.kind().to_string())),
        }
    }

    pub fn string(&self, index: usize) -> Result<String, CallbackError> {
        self.str(index).map(str::to_string)
    }

    pub fn int(&self, index: usize) -> Result<i64, CallbackError> {
        match self.get(index)? {
            Resolved::Int(i) => Ok(*i),
            other => Err(self.mismatch(index, "int", other.kind().to_string())),
        }
    }

    /// Floats accept ints losslessly; the reverse needs an alias.
    pub fn float(&self, index: usize) -> Result<f64, CallbackError> {
        match self.get(index)? {
            Resolved::Float(f) => Ok(*f),
            Resolved::Int(i) => Ok(*i as f64),
            other => Err(self.mismatch(index, "float", other.kind().to_string())),
        }
    }

    pub fn bool(&self, index: usize) -> Result<bool, CallbackError> {
        match self.get(index)? {
            Resolved::Bool(b) => Ok(*b),
            other => Err(self.mismatch(index, "bool", other.kind().to_string())),
        }
    }

    pub fn object(&self, index: usize) -> Result<&'a ObjectRc, CallbackError> {
        match self.get(index)? {
            Resolved::Object(o) => Ok(o),
            other => Err(self.mismatch(index, "object reference", other.kind().to_string())),
        }
    }

    pub fn list(&self, index: usize) -> Result<&'a [Resolved], CallbackError> {
        match self.get(index)? {
            Resolved::List(items) => Ok(items),
            other => Err(self.mismatch(index, "list", other.kind().to_string())),
        }
    }

    /// `Null` reads as `None`, anything else through the given accessor.
    pub fn opt<T>(
        &self,
        index: usize,
        accessor: impl Fn(&Self, usize) -> Result<T, CallbackError>,
    ) -> Result<Option<T>, CallbackError> {
        match self.args.get(index) {
            None | Some(Resolved::Null) => Ok(None),
            Some(_) => accessor(self, index).map(Some),
        }
    }
}
