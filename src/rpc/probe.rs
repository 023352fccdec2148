//! Liveness probing of registered servers.
//!
//! A probe sends a bare `server_info` request. Any HTTP answer, including
//! an error status or an RPC error body, means something is listening.
//! Transport failures never escape: they are the `Dead` outcome.

use super::client::{Endpoint, RpcClient, DEFAULT_RPC_TIMEOUT};
use log::debug;

/// Outcome of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Dead,
}

impl Liveness {
    pub fn is_alive(self) -> bool {
        self == Liveness::Alive
    }
}

/// Classifies an endpoint as alive or dead. Must not fail.
pub trait Probe: Sync {
    fn probe(&self, endpoint: &Endpoint) -> Liveness;
}

/// Probe over HTTP JSON-RPC, one attempt per call bounded by
/// [`DEFAULT_RPC_TIMEOUT`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProbe;

impl HttpProbe {
    pub fn new() -> Self {
        HttpProbe
    }
}

impl Probe for HttpProbe {
    fn probe(&self, endpoint: &Endpoint) -> Liveness {
        let client = RpcClient::with_timeout(endpoint.clone(), DEFAULT_RPC_TIMEOUT);
        match client.request("server_info", None) {
            Ok(reply) => {
                debug!("{} answered server_info with HTTP {}", endpoint, reply.status);
                Liveness::Alive
            }
            Err(e) => {
                debug!("{} is unreachable: {}", endpoint, e);
                Liveness::Dead
            }
        }
    }
}

impl<F> Probe for F
where
    F: Fn(&Endpoint) -> Liveness + Sync,
{
    fn probe(&self, endpoint: &Endpoint) -> Liveness {
        self(endpoint)
    }
}
