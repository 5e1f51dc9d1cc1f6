//! Blocking request/response transport.
//!
//! One logical exchange: send a text payload, get a text payload back.
//! The HTTP implementation retries a bounded number of times for exactly
//! two transient conditions (connection-establishment timeout, HTTP 400)
//! and opens a fresh connection per attempt. Cookies and TLS trust are
//! transport configuration, not protocol concerns.

use std::rc::Rc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use tracing::{debug, warn};
use url::Url;

use crate::error::TransportError;

/// Attempt bound for the transient failure classes.
const RETRY_COUNT: u32 = 5;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single logical request/response exchange over a text channel.
pub trait Transport {
    fn send(&self, body: &str) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(&self, body: &str) -> Result<String, TransportError> {
        (**self).send(body)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, body: &str) -> Result<String, TransportError> {
        (**self).send(body)
    }
}

/// HTTP POST transport for the batch endpoint.
pub struct HttpTransport {
    client: Client,
    url: Url,
}

impl HttpTransport {
    pub fn new(url: Url) -> Result<Self, TransportError> {
        Self::with_connect_timeout(url, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_connect_timeout(
        url: Url,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            // Fresh connection per attempt; responses are never cached.
            .pool_max_idle_per_host(0)
            // Redirects are server misbehavior here, surfaced as status
            // errors rather than followed.
            .redirect(Policy::none())
            // Session cookie jar, for servers correlating by HTTP session.
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn post_once(&self, body: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .post(self.url.clone())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("Cache-Control", "no-cache")
            .body(body.to_string())
            .send()
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        response.text().map_err(|e| TransportError::Io(e.to_string()))
    }
}

/// Only a connect timeout is configured on the client, so a timeout here
/// is a connection-establishment timeout.
fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::ConnectTimeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Io(error.to_string())
    }
}

impl Transport for HttpTransport {
    fn send(&self, body: &str) -> Result<String, TransportError> {
        let mut attempts_left = RETRY_COUNT;
        loop {
            match self.post_once(body) {
                Ok(text) => {
                    debug!("{} bytes out, {} bytes back", body.len(), text.len());
                    return Ok(text);
                }
                Err(e) if e.is_transient() => {
                    attempts_left -= 1;
                    if attempts_left == 0 {
                        return Err(e);
                    }
                    warn!("retrying request: {e}");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
