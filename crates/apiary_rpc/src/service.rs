//! Request/response envelope over a [`Transport`].
//!
//! Requests are `{version, id, method, params}` records; responses carry
//! either `result` or `error`. A populated `error` becomes a
//! [`ServerError`]; a response with neither, or that is not JSON at all,
//! is a protocol error.

use std::cell::Cell;

use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::error::{RpcError, ServerError};
use crate::transport::Transport;

/// Wire protocol version constant sent with every request.
pub const PROTOCOL_VERSION: &str = "1.1";

pub struct RpcService {
    transport: Box<dyn Transport>,
    next_id: Cell<u64>,
}

impl RpcService {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            next_id: Cell::new(0),
        }
    }

    /// Perform one exchange and return the `result` payload.
    pub fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let request = json!({
            "version": PROTOCOL_VERSION,
            "id": id,
            "method": method,
            "params": params,
        });
        let body = request.to_string();
        trace!("request {id}: {body}");

        let text = self.transport.send(&body)?;
        trace!("response {id}: {text}");

        let envelope: Value = serde_json::from_str(&text)
            .map_err(|e| RpcError::Protocol(format!("unparseable response: {e}")))?;
        let Value::Object(mut envelope) = envelope else {
            return Err(RpcError::Protocol("response is not an object".into()));
        };

        match envelope.remove("error") {
            Some(error) if !error.is_null() => {
                debug!("request {id} failed server-side");
                return Err(RpcError::Server(ServerError::new(error)));
            }
            _ => {}
        }

        envelope
            .remove("result")
            .ok_or_else(|| RpcError::Protocol("response has neither result nor error".into()))
    }
}
