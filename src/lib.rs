//! # sidechain-registry - Local registry of chain nodes, witnesses and bridges
//!
//! This library keeps track of the ledger nodes ("chains") and cross-chain
//! witness servers started for a local test network, plus the bridges that
//! link two chains. The state lives in a single JSON document under the
//! user's config folder (`~/.config/sidechain-cli/config.json` by default).
//!
//! ## Overview
//!
//! - Loading the registry probes every chain and witness with a `server_info`
//!   request and silently drops the ones that no longer answer
//! - Lookups by name per category, with a union lookup over servers
//! - Registration and removal, each followed by a full rewrite of the document
//! - Derivation of the protocol-level bridge descriptor from a bridge record
//!
//! ## Architecture
//!
//! - `rpc`: per-endpoint JSON-RPC clients and the liveness probe
//! - `records`: server (chain/witness) and bridge record types
//! - `store`: the registry store, its configuration and the document codec
//! - `error`: registry error type
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sidechain_registry::{ConfigStore, StoreConfig};
//!
//! let config = StoreConfig::from_home()?;
//! let store = ConfigStore::load(&config)?;
//!
//! let chain = store.get_chain("locking_chain")?;
//! println!("locking chain RPC at {}", chain.client().url());
//!
//! let bridge = store.get_bridge("test_bridge")?;
//! println!("{}", bridge.to_xrpl());
//! # Ok::<(), sidechain_registry::RegistryError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`Result<T, RegistryError>`](RegistryError).
//! Probe failures are never errors: they only decide whether a server stays
//! in the registry.

pub mod error;
pub mod records;
pub mod rpc;
pub mod store;

pub use error::{Category, RegistryError};
pub use records::{
    derive_bridge_descriptor, BridgeDescriptor, BridgeRecord, ChainRecord, Issue, IssuedCurrency,
    ServerInfo, ServerKind, ServerRecord, ServerRef, WitnessRecord, XChainCurrency,
};
pub use rpc::{Endpoint, HttpProbe, Liveness, Probe, RpcClient, RpcError};
pub use store::{ConfigStore, Document, ProbeMode, StoreConfig};
