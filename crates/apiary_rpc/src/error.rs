//! Error taxonomy for the protocol engine.
//!
//! Four families: transport (network/channel), protocol (malformed
//! envelopes), server (the response's `error` field), and callback
//! (local dispatch of a server callback). Only one server error class,
//! session-not-found, is recoverable; everything else is fatal to the
//! flush that hit it.

use serde_json::Value;

use crate::object::ObjectId;

/// Message prefix the server puts on the one recoverable application error.
pub const SESSION_NOT_FOUND_PREFIX: &str = "SessionNotFoundError: ";

/// Network-level failure while performing a request/response exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection establishment timed out. Transient, retried.
    #[error("connection timed out")]
    ConnectTimeout,

    /// Connection establishment failed (refused, unreachable, DNS).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-success HTTP status.
    /// Status 400 is treated as a transient bad-handshake signal.
    #[error("HTTP error {0}")]
    Status(u16),

    /// Any other channel failure (body read, TLS, client build).
    #[error("I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// The two conditions the transport retries: connect timeout and
    /// HTTP 400. Everything else is fatal on first occurrence.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectTimeout | Self::Status(400))
    }
}

/// A populated `error` field in the server's response envelope.
///
/// Only the server-supplied message is meaningful to a user; no local
/// stack context is attached.
#[derive(Debug, Clone)]
pub struct ServerError {
    payload: Value,
}

impl ServerError {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// The server-supplied message: string payloads verbatim, anything
    /// else rendered as compact JSON.
    pub fn message(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// The raw error payload as received.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The recoverable subtype: the hive resets and replays the batch
    /// once when it sees this.
    pub fn is_session_not_found(&self) -> bool {
        self.message().starts_with(SESSION_NOT_FOUND_PREFIX)
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Failure while resolving a type name to a constructor, or while running
/// the constructor itself. The two cases are deliberately distinct.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// No configured namespace knows the type.
    #[error("type not found: {type_name} (searched {searched:?})")]
    TypeNotFound {
        type_name: String,
        searched: Vec<String>,
    },

    /// The type exists but could not be constructed (argument shape
    /// mismatch, constructor refused).
    #[error("cannot construct {type_name}: {reason}")]
    Construction { type_name: String, reason: String },
}

impl FactoryError {
    pub fn construction(type_name: &str, reason: impl std::fmt::Display) -> Self {
        Self::Construction {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Local dispatch failure while applying a server callback. Always fatal
/// to the current flush: later callbacks in the batch may depend on the
/// failed one having succeeded.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// A `__roid__` marker referenced an id that is not registered.
    #[error("reference to unregistered object id {0}")]
    DanglingReference(ObjectId),

    /// An invocation callback targeted an id that is not registered.
    #[error("callback target not in registry: id {0}")]
    UnknownTarget(ObjectId),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    /// The target object does not dispatch the named method.
    #[error("object {target} has no method {method:?}")]
    UnknownMethod { target: ObjectId, method: String },

    /// An argument's kind did not match what the method expects.
    #[error("{method}: argument {index}: expected {expected}, got {got}")]
    ArgumentMismatch {
        method: String,
        index: usize,
        expected: &'static str,
        got: String,
    },

    /// The server drove a method on an object whose own method is still
    /// on the stack. Handlers avoid this with the deferred-call queue.
    #[error("reentrant callback to object {target} during {method}")]
    ReentrantTarget { target: ObjectId, method: String },

    /// The invoked method itself failed.
    #[error("{method} failed: {message}")]
    Invocation { method: String, message: String },
}

/// Top-level error for everything a flush can hit.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Malformed or empty response envelope. Always fatal.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server reported an application error.
    #[error("server error: {0}")]
    Server(ServerError),

    #[error("callback dispatch failed: {0}")]
    Callback(#[from] CallbackError),
}

impl RpcError {
    pub fn is_session_not_found(&self) -> bool {
        matches!(self, Self::Server(e) if e.is_session_not_found())
    }

    /// Message suitable for user display: server errors surface the
    /// server-supplied text verbatim, the rest their own description.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server(e) => e.message(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transient_conditions_are_exactly_two() {
        assert!(TransportError::ConnectTimeout.is_transient());
        assert!(TransportError::Status(400).is_transient());

        assert!(!TransportError::Status(403).is_transient());
        assert!(!TransportError::Status(500).is_transient());
        assert!(!TransportError::Connect("refused".into()).is_transient());
        assert!(!TransportError::Io("broken pipe".into()).is_transient());
    }

    #[test]
    fn server_error_message_string_verbatim() {
        let err = ServerError::new(json!("DbError: relation missing"));
        assert_eq!(err.message(), "DbError: relation missing");
        assert!(!err.is_session_not_found());
    }

    #[test]
    fn server_error_message_structured_payload() {
        let err = ServerError::new(json!({"code": 17, "detail": "bad"}));
        assert_eq!(err.message(), r#"{"code":17,"detail":"bad"}"#);
    }

    #[test]
    fn session_not_found_detected_by_prefix() {
        let err = ServerError::new(json!("SessionNotFoundError: 1716113"));
        assert!(err.is_session_not_found());

        let wrapped = RpcError::Server(err);
        assert!(wrapped.is_session_not_found());
        assert!(!RpcError::Protocol("empty".into()).is_session_not_found());
    }

    #[test]
    fn user_message_surfaces_server_text_only() {
        let err = RpcError::Server(ServerError::new(json!("AccessError: denied")));
        assert_eq!(err.user_message(), "AccessError: denied");

        let err = RpcError::Protocol("response is not an object".into());
        assert_eq!(err.user_message(), "protocol error: response is not an object");
    }

    #[test]
    fn factory_errors_are_distinct_variants() {
        let not_found = FactoryError::TypeNotFound {
            type_name: "Gauge".into(),
            searched: vec!["widgets".into()],
        };
        let not_constructible = FactoryError::construction("Gauge", "expected 2 arguments");
        assert!(matches!(not_found, FactoryError::TypeNotFound { .. }));
        assert!(matches!(not_constructible, FactoryError::Construction { .. }));
    }
}
