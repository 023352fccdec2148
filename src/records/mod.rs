//! Record types held by the registry.

pub mod bridge;
pub mod server;

pub use bridge::{
    derive_bridge_descriptor, BridgeDescriptor, BridgeRecord, Issue, IssuedCurrency,
    NativeSpelling, XChainCurrency, NATIVE_CURRENCY,
};
pub use server::{
    ChainRecord, ServerInfo, ServerKind, ServerRecord, ServerRef, WitnessRecord, DOCKER_EXE,
};
