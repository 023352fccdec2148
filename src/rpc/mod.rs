//! RPC plumbing: per-endpoint clients and the liveness probe built on them.

pub mod client;
pub mod probe;

pub use client::{Endpoint, RpcClient, RpcError, RpcReply, DEFAULT_RPC_TIMEOUT};
pub use probe::{HttpProbe, Liveness, Probe};
