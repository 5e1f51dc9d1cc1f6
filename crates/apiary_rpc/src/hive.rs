//! The hive: session-scoped object registry and flush engine.
//!
//! Owns the id-to-object registry, the pending call queue, the type
//! registry, and the flush cycle that drives them: send the queued batch,
//! apply the server's callbacks in wire order, keep draining while the
//! server reports callbacks remaining, and hand back the return value of
//! the batch's last call. Session loss is recovered here by resetting and
//! replaying the identical batch once.
//!
//! Everything is single-threaded and cooperatively scheduled with the
//! host UI event loop; `flush` blocks its caller until the full
//! round-trip chain completes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::call::{ROID_KEY, RemoteCall};
use crate::defer::{DeferredQueue, EventLoopHandle};
use crate::error::{CallbackError, RpcError};
use crate::factory::{Namespace, TypeRegistry};
use crate::object::{ObjectId, ObjectRc};
use crate::service::RpcService;
use crate::transport::Transport;
use crate::value::{AliasMap, Resolved, ValueKind};

/// Construction callbacks arrive as `"new TypeName"`.
pub const CONSTRUCTOR_PREFIX: &str = "new ";

/// Visible busy indication around a flush, stack-disciplined so a nested
/// flush preserves the outer busy state.
pub trait BusyIndicator {
    fn begin_wait(&self);
    fn end_wait(&self);
}

/// Receives errors the best-effort object layer swallowed, for log plus
/// user-visible notification.
pub trait ErrorSink {
    fn report(&self, context: &str, error: &RpcError);
}

/// Notified after the registry is cleared so dependent view state
/// (frames, dialogs) can dispose.
pub trait ResetObserver {
    fn on_reset(&self);
}

pub struct Hive {
    session_id: i64,
    service: RpcService,
    registry: RefCell<HashMap<ObjectId, ObjectRc>>,
    queue: RefCell<Vec<RemoteCall>>,
    types: RefCell<TypeRegistry>,
    aliases: RefCell<AliasMap>,
    deferred: DeferredQueue,
    event_loop: RefCell<Option<Rc<dyn EventLoopHandle>>>,
    // Hooks are weak: the controller installing them owns the hive, not
    // the other way around.
    busy: RefCell<Option<Weak<dyn BusyIndicator>>>,
    sink: RefCell<Option<Weak<dyn ErrorSink>>>,
    reset_observer: RefCell<Option<Weak<dyn ResetObserver>>>,
}

impl Hive {
    /// A hive with a fresh session id (millisecond timestamp, constant
    /// for the hive's lifetime).
    pub fn new(transport: Box<dyn Transport>) -> Rc<Self> {
        Self::with_session_id(transport, chrono::Utc::now().timestamp_millis())
    }

    pub fn with_session_id(transport: Box<dyn Transport>, session_id: i64) -> Rc<Self> {
        Rc::new(Self {
            session_id,
            service: RpcService::new(transport),
            registry: RefCell::new(HashMap::new()),
            queue: RefCell::new(Vec::new()),
            types: RefCell::new(TypeRegistry::new()),
            aliases: RefCell::new(AliasMap::new()),
            deferred: DeferredQueue::new(),
            event_loop: RefCell::new(None),
            busy: RefCell::new(None),
            sink: RefCell::new(None),
            reset_observer: RefCell::new(None),
        })
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    // -- Configuration ------------------------------------------------------

    pub fn add_namespace(&self, namespace: Namespace) {
        self.types.borrow_mut().add_namespace(namespace);
    }

    pub fn add_type_alias(&self, from: ValueKind, to: ValueKind) {
        self.aliases.borrow_mut().insert(from, to);
    }

    pub fn set_event_loop(&self, event_loop: Rc<dyn EventLoopHandle>) {
        *self.event_loop.borrow_mut() = Some(event_loop);
    }

    pub fn set_busy_indicator(&self, busy: Weak<dyn BusyIndicator>) {
        *self.busy.borrow_mut() = Some(busy);
    }

    pub fn set_error_sink(&self, sink: Weak<dyn ErrorSink>) {
        *self.sink.borrow_mut() = Some(sink);
    }

    pub fn set_reset_observer(&self, observer: Weak<dyn ResetObserver>) {
        *self.reset_observer.borrow_mut() = Some(observer);
    }

    // -- Registry -----------------------------------------------------------

    /// Register a client-created object. Server-constructed objects are
    /// registered by the flush cycle itself.
    pub fn register(&self, object: ObjectRc) {
        let id = object.borrow().remote().id();
        debug!("registering object {id}");
        self.registry.borrow_mut().insert(id, object);
    }

    pub fn object(&self, id: ObjectId) -> Option<ObjectRc> {
        self.registry.borrow().get(&id).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Drop all objects and notify the reset observer so dependent views
    /// dispose. The pending queue is left alone: a reset happens
    /// mid-flush, after the in-flight batch was already drained from it.
    pub fn reset(&self) {
        debug!("reset: dropping {} object(s)", self.object_count());
        self.registry.borrow_mut().clear();
        let observer = self.reset_observer.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(observer) = observer {
            observer.on_reset();
        }
    }

    // -- Pending queue ------------------------------------------------------

    pub fn append_call(&self, call: RemoteCall) {
        debug!("append {call}");
        self.queue.borrow_mut().push(call);
    }

    pub fn is_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    /// Queue a call for the next turn of the UI event loop; one drain is
    /// scheduled no matter how many calls coalesce into it. Without an
    /// installed event loop the drain runs immediately (degraded mode).
    pub fn call_after(self: &Rc<Self>, call: RemoteCall) {
        debug!("calling after {call}");
        if !self.deferred.offer(call) {
            return;
        }
        let event_loop = self.event_loop.borrow().clone();
        match event_loop {
            Some(event_loop) => {
                let hive = Rc::clone(self);
                event_loop.post(Box::new(move || hive.drain_deferred()));
            }
            None => {
                warn!("no event loop installed, draining deferred calls now");
                self.drain_deferred();
            }
        }
    }

    /// Append every deferred call in FIFO order, then flush once if
    /// anything is pending. Runs as the posted event-loop task.
    pub fn drain_deferred(self: &Rc<Self>) {
        let calls = self.deferred.take();
        if calls.is_empty() {
            return;
        }
        debug!("draining {} deferred call(s)", calls.len());
        for call in calls {
            self.append_call(call);
        }
        if self.is_pending() {
            if let Err(e) = self.flush() {
                self.report("deferred flush", &e);
            }
        }
    }

    /// Log an error and hand it to the installed sink. Used by the
    /// best-effort object layer.
    pub fn report(&self, context: &str, error: &RpcError) {
        tracing::error!("{context}: {error}");
        let sink = self.sink.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(sink) = sink {
            sink.report(context, error);
        }
    }

    // -- Flush cycle --------------------------------------------------------

    /// Send the pending queue and drain all resulting callbacks until the
    /// server reports none remaining. Returns the server's value for the
    /// last call of the batch (`Null` for an empty batch).
    ///
    /// A session-not-found application error resets the hive and replays
    /// the identical batch once, silently on success; its second failure,
    /// like every other taxonomy member, propagates.
    pub fn flush(self: &Rc<Self>) -> Result<Value, RpcError> {
        let batch: Vec<Value> = {
            let mut queue = self.queue.borrow_mut();
            let drained = std::mem::take(&mut *queue);
            drained.iter().map(RemoteCall::to_wire).collect()
        };

        let _busy = BusyScope::enter(self);
        match self.run_rounds(&batch) {
            Err(e) if e.is_session_not_found() => {
                warn!("server session lost ({e}), resetting and replaying batch");
                self.reset();
                self.run_rounds(&batch)
            }
            other => other,
        }
    }

    fn run_rounds(self: &Rc<Self>, batch: &[Value]) -> Result<Value, RpcError> {
        let mut return_value = Value::Null;
        let mut outgoing: &[Value] = batch;
        let mut first_round = true;

        loop {
            let response = self
                .service
                .call("process", json!([self.session_id, outgoing]))?;
            let (callbacks, remaining, last) = split_response(response)?;

            // The return value belongs to the last call of the original
            // batch; drain rounds carry no calls and no meaningful value.
            if first_round && !batch.is_empty() {
                return_value = last;
            }
            first_round = false;

            for callback in &callbacks {
                self.apply_callback(callback)?;
            }

            if remaining == 0 {
                break;
            }
            debug!("{remaining} callback(s) left on server, draining");
            outgoing = &[];
        }

        Ok(return_value)
    }

    fn apply_callback(self: &Rc<Self>, callback: &Value) -> Result<(), RpcError> {
        let malformed = || RpcError::Protocol(format!("malformed callback record: {callback}"));

        let parts = callback.as_array().ok_or_else(malformed)?;
        if parts.len() != 3 {
            return Err(malformed());
        }
        let target = ObjectId(parts[0].as_i64().ok_or_else(malformed)?);
        let method = parts[1].as_str().ok_or_else(malformed)?;
        let raw_args = parts[2].as_array().ok_or_else(malformed)?;

        let args = raw_args
            .iter()
            .map(|value| self.resolve(value))
            .collect::<Result<Vec<_>, CallbackError>>()?;

        if let Some(type_name) = method.strip_prefix(CONSTRUCTOR_PREFIX) {
            let object = self
                .types
                .borrow()
                .create(self, type_name, target, &args)
                .map_err(CallbackError::from)?;
            self.registry.borrow_mut().insert(target, object);
            return Ok(());
        }

        let object = self
            .registry
            .borrow()
            .get(&target)
            .cloned()
            .ok_or(CallbackError::UnknownTarget(target))?;

        let args: Vec<Resolved> = {
            let aliases = self.aliases.borrow();
            args.into_iter().map(|arg| aliases.normalize(arg)).collect()
        };

        debug!("callback <{target}>.{method}({} arg(s))", args.len());
        let mut object = object.try_borrow_mut().map_err(|_| {
            CallbackError::ReentrantTarget {
                target,
                method: method.to_string(),
            }
        })?;
        object.invoke(method, &args).map_err(RpcError::from)
    }

    /// Resolve one decoded wire value: `{"__roid__": id}` becomes the
    /// registered instance itself, recursively inside arrays. Plain maps
    /// of any other shape pass through untouched.
    fn resolve(&self, value: &Value) -> Result<Resolved, CallbackError> {
        Ok(match value {
            Value::Null => Resolved::Null,
            Value::Bool(b) => Resolved::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Resolved::Int(i),
                None => Resolved::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Resolved::Str(s.clone()),
            Value::Array(items) => Resolved::List(
                items
                    .iter()
                    .map(|item| self.resolve(item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(id) = map.get(ROID_KEY).and_then(Value::as_i64) {
                        let id = ObjectId(id);
                        let object = self
                            .registry
                            .borrow()
                            .get(&id)
                            .cloned()
                            .ok_or(CallbackError::DanglingReference(id))?;
                        return Ok(Resolved::Object(object));
                    }
                }
                Resolved::Map(map.clone())
            }
        })
    }
}

/// Pushes the busy indicator on entry, pops it on drop, so every exit
/// path of a flush unwinds the stack correctly.
struct BusyScope {
    hook: Option<Rc<dyn BusyIndicator>>,
}

impl BusyScope {
    fn enter(hive: &Hive) -> Self {
        let hook = hive.busy.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(hook) = &hook {
            hook.begin_wait();
        }
        Self { hook }
    }
}

impl Drop for BusyScope {
    fn drop(&mut self) {
        if let Some(hook) = &self.hook {
            hook.end_wait();
        }
    }
}

/// Split the 3-element result record `[callbacks, remaining, last]`.
fn split_response(result: Value) -> Result<(Vec<Value>, u64, Value), RpcError> {
    let Value::Array(parts) = result else {
        return Err(RpcError::Protocol("result is not an array".into()));
    };
    let [callbacks, remaining, last]: [Value; 3] = parts
        .try_into()
        .map_err(|parts: Vec<Value>| {
            RpcError::Protocol(format!("expected a 3-element result, got {}", parts.len()))
        })?;
    let Value::Array(callbacks) = callbacks else {
        return Err(RpcError::Protocol("callbacks field is not an array".into()));
    };
    let remaining = remaining
        .as_u64()
        .ok_or_else(|| RpcError::Protocol("calls-remaining field is not a count".into()))?;
    Ok((callbacks, remaining, last))
}
