//! Remote-object call/callback protocol engine for server-driven UIs.
//!
//! The server owns application state and drives a dynamically-typed
//! object graph in this process: client code queues calls on a session
//! hive and flushes them in batches; the server answers with callbacks
//! that construct new objects by type name or invoke methods on existing
//! ones, addressed by integer object id.

pub mod call;
pub mod defer;
pub mod error;
pub mod factory;
pub mod hive;
pub mod object;
pub mod service;
pub mod testing;
pub mod transport;
pub mod value;

pub use call::{Arg, ROID_KEY, RemoteCall};
pub use defer::{DeferredQueue, EventLoopHandle};
pub use error::{
    CallbackError, FactoryError, RpcError, SESSION_NOT_FOUND_PREFIX, ServerError, TransportError,
};
pub use factory::{Namespace, TypeRegistry};
pub use hive::{BusyIndicator, CONSTRUCTOR_PREFIX, ErrorSink, Hive, ResetObserver};
pub use object::{ObjectId, ObjectRc, RemoteObject, ServerObject};
pub use service::{PROTOCOL_VERSION, RpcService};
pub use transport::{HttpTransport, Transport};
pub use value::{AliasMap, Args, Resolved, ValueKind};
