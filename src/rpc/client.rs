//! JSON-RPC client bound to a single server endpoint.
//!
//! Clients are handed out by the registry for the chains and witnesses it
//! tracks. They know the address and how to frame a request; building
//! transaction payloads is left to the callers.

use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

/// Default bound on a single request, connect through body read
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Host and port of a server's RPC (or streaming) listener
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn http_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    /// Parse `http://host:port`, with or without a trailing slash
    pub fn from_http_url(url: &str) -> Option<Self> {
        let authority = url.strip_prefix("http://")?.trim_end_matches('/');
        let (host, port) = authority.rsplit_once(':')?;
        if host.is_empty() || host.contains('/') {
            return None;
        }
        let port = port.parse().ok()?;
        Some(Self::new(host, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Errors below the HTTP layer: nothing usable came back from the server
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport error talking to {url}: {message}")]
    Transport { url: String, message: String },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Any HTTP-level answer, successful or not
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    pub status: u16,
    pub body: String,
}

impl RpcReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, if it is JSON
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Blocking JSON-RPC client for one endpoint
#[derive(Clone)]
pub struct RpcClient {
    endpoint: Endpoint,
    url: String,
    agent: ureq::Agent,
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient").field("url", &self.url).finish()
    }
}

impl RpcClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_timeout(endpoint, DEFAULT_RPC_TIMEOUT)
    }

    pub fn with_timeout(endpoint: Endpoint, timeout: Duration) -> Self {
        // A 3xx is the server's own answer, not a pointer to follow
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(0)
            .build();
        let url = endpoint.http_url();
        Self {
            endpoint,
            url,
            agent,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request. HTTP error statuses are replies, not errors.
    pub fn request(&self, method: &str, params: Option<Value>) -> Result<RpcReply, RpcError> {
        let payload = match params {
            Some(params) => json!({ "method": method, "params": [params] }),
            None => json!({ "method": method }),
        };

        let result = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(&payload.to_string());

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(other) => {
                return Err(RpcError::Transport {
                    url: self.url.clone(),
                    message: other.to_string(),
                })
            }
        };

        let status = response.status();
        let body = response.into_string().map_err(|source| RpcError::Body {
            url: self.url.clone(),
            source,
        })?;

        Ok(RpcReply { status, body })
    }
}
