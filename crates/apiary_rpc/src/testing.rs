//! Test support: a scripted transport, a hand-pumped event loop, and a
//! probe object.
//!
//! Used by this crate's own test suite and by downstream crates testing
//! against the engine. Not part of the protocol surface.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::{Value, json};

use crate::defer::EventLoopHandle;
use crate::error::{CallbackError, FactoryError, TransportError};
use crate::factory::Namespace;
use crate::hive::Hive;
use crate::object::{ObjectId, ObjectRc, RemoteObject, ServerObject};
use crate::transport::Transport;
use crate::value::{Args, Resolved};

type RequestProbe = Box<dyn Fn(usize)>;

/// Transport that answers from a canned script and records every request.
///
/// Exhausting the script yields empty success responses, so tests only
/// script the exchanges they care about.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<String, TransportError>>>,
    requests: RefCell<Vec<Value>>,
    probe: RefCell<Option<RequestProbe>>,
}

impl ScriptedTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Script a success envelope with the given `result` payload.
    pub fn push_result(&self, result: Value) {
        self.push_raw(json!({ "result": result }).to_string());
    }

    /// Script an error envelope with the given `error` payload.
    pub fn push_error(&self, error: Value) {
        self.push_raw(json!({ "error": error }).to_string());
    }

    /// Script a raw response body, valid JSON or not.
    pub fn push_raw(&self, body: impl Into<String>) {
        self.responses.borrow_mut().push_back(Ok(body.into()));
    }

    /// Script a transport-level failure.
    pub fn push_transport_error(&self, error: TransportError) {
        self.responses.borrow_mut().push_back(Err(error));
    }

    /// Observe each request as it arrives; `n` is 1-based.
    pub fn on_request(&self, probe: impl Fn(usize) + 'static) {
        *self.probe.borrow_mut() = Some(Box::new(probe));
    }

    /// Every request envelope received so far, parsed.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// The calls array (`params[1]`) of the i-th request.
    pub fn request_calls(&self, index: usize) -> Value {
        self.requests.borrow()[index]["params"][1].clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, body: &str) -> Result<String, TransportError> {
        let parsed: Value =
            serde_json::from_str(body).expect("scripted transport received non-JSON request");
        let count = {
            let mut requests = self.requests.borrow_mut();
            requests.push(parsed);
            requests.len()
        };
        if let Some(probe) = &*self.probe.borrow() {
            probe(count);
        }
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "result": [[], 0, Value::Null] }).to_string()))
    }
}

/// Event loop pumped by hand: posted tasks run when the test says so.
#[derive(Default)]
pub struct ManualLoop {
    tasks: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl ManualLoop {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run tasks until none remain, including ones posted while running.
    /// Returns how many ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl EventLoopHandle for ManualLoop {
    fn post(&self, task: Box<dyn FnOnce()>) {
        self.tasks.borrow_mut().push_back(task);
    }
}

/// Server-constructible object that records what the server did to it.
pub struct Probe {
    remote: RemoteObject,
    pub label: String,
    pub count: i64,
    /// `"method/arity"` per invocation, in order.
    pub calls: Vec<String>,
    pub children: Vec<ObjectRc>,
}

impl Probe {
    /// Constructor registered under `"Probe"`; takes an optional string
    /// label.
    pub fn construct(
        hive: &Rc<Hive>,
        id: ObjectId,
        args: &[Resolved],
    ) -> Result<ObjectRc, FactoryError> {
        let args = Args::new("new Probe", args);
        let label = match args.len() {
            0 => String::new(),
            _ => args
                .string(0)
                .map_err(|e| FactoryError::construction("Probe", e))?,
        };
        Ok(Rc::new(RefCell::new(Self {
            remote: RemoteObject::new(hive, id),
            label,
            count: 0,
            calls: Vec::new(),
            children: Vec::new(),
        })))
    }

    /// A namespace containing just `Probe`.
    pub fn namespace() -> Namespace {
        let mut namespace = Namespace::new("testing");
        namespace.register("Probe", Probe::construct);
        namespace
    }
}

impl ServerObject for Probe {
    fn remote(&self) -> &RemoteObject {
        &self.remote
    }

    fn type_name(&self) -> &'static str {
        "Probe"
    }

    fn invoke(&mut self, method: &str, args: &[Resolved]) -> Result<(), CallbackError> {
        self.calls.push(format!("{method}/{}", args.len()));
        let args = Args::new(method, args);
        match method {
            "ping" | "keep" => Ok(()),
            "set_label" => {
                self.label = args.string(0)?;
                Ok(())
            }
            "set_count" => {
                self.count = args.int(0)?;
                Ok(())
            }
            "adopt" => {
                self.children.push(Rc::clone(args.object(0)?));
                Ok(())
            }
            "adopt_all" => {
                for (index, item) in args.list(0)?.iter().enumerate() {
                    match item {
                        Resolved::Object(object) => self.children.push(Rc::clone(object)),
                        other => {
                            return Err(CallbackError::ArgumentMismatch {
                                method: method.to_string(),
                                index,
                                expected: "object reference",
                                got: other.kind().to_string(),
                            });
                        }
                    }
                }
                Ok(())
            }
            "boom" => Err(CallbackError::Invocation {
                method: method.to_string(),
                message: "probe exploded".into(),
            }),
            _ => Err(CallbackError::UnknownMethod {
                target: self.remote.id(),
                method: method.to_string(),
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A hive wired to a scripted transport with the `Probe` namespace
/// installed.
pub fn scripted_hive() -> (Rc<Hive>, Rc<ScriptedTransport>) {
    let transport = ScriptedTransport::new();
    let hive = Hive::with_session_id(Box::new(Rc::clone(&transport)), 1_700_000_000_000);
    hive.add_namespace(Probe::namespace());
    (hive, transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_transport_defaults_to_empty_success() {
        let transport = ScriptedTransport::new();
        let body = transport.send(r#"{"params":[1,[]]}"#).unwrap();
        assert_eq!(body, r#"{"result":[[],0,null]}"#);
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn manual_loop_runs_tasks_posted_during_run() {
        let event_loop = ManualLoop::new();
        let inner = Rc::clone(&event_loop);
        event_loop.post(Box::new(move || {
            inner.post(Box::new(|| {}));
        }));
        assert_eq!(event_loop.run_all(), 2);
        assert_eq!(event_loop.pending(), 0);
    }

    #[test]
    fn probe_rejects_unknown_methods() {
        let (hive, _transport) = scripted_hive();
        let probe = Probe::construct(&hive, ObjectId(1), &[]).unwrap();
        let err = probe.borrow_mut().invoke("vanish", &[]).unwrap_err();
        assert!(matches!(err, CallbackError::UnknownMethod { .. }));
    }
}
