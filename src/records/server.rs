//! Chain and witness server records.
//!
//! Both kinds share a [`ServerInfo`] base. A chain adds the endpoint of its
//! streaming (websocket) listener; a witness adds nothing.

use crate::error::{RegistryError, Result};
use crate::rpc::{Endpoint, RpcClient};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Executable value recorded for servers running inside a container
pub const DOCKER_EXE: &str = "docker";

/// Server kind, persisted as the `type` field of each server entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerKind {
    #[serde(rename = "rippled")]
    Chain,
    #[serde(rename = "witness")]
    Witness,
}

impl ServerKind {
    pub fn as_tag(&self) -> &'static str {
        match self {
            ServerKind::Chain => "rippled",
            ServerKind::Witness => "witness",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerKind::Chain => f.write_str("chain"),
            ServerKind::Witness => f.write_str("witness"),
        }
    }
}

/// Fields common to every running server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    /// OS process id of the node, informational only
    pub pid: u32,
    /// Path to the node binary, or [`DOCKER_EXE`]
    pub exe: String,
    /// The node's own configuration file
    pub config: PathBuf,
    pub http_ip: String,
    pub http_port: u16,
}

impl ServerInfo {
    pub fn is_docker(&self) -> bool {
        self.exe == DOCKER_EXE
    }

    pub fn rpc_endpoint(&self) -> Endpoint {
        Endpoint::new(self.http_ip.clone(), self.http_port)
    }

    /// RPC client bound to this server's HTTP listener
    pub fn client(&self) -> RpcClient {
        RpcClient::new(self.rpc_endpoint())
    }
}

/// A validating chain node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRecord {
    pub server: ServerInfo,
    pub ws_ip: String,
    pub ws_port: u16,
}

impl ChainRecord {
    pub fn name(&self) -> &str {
        &self.server.name
    }

    /// The rippled executable. Alias for `exe`.
    pub fn rippled(&self) -> &str {
        &self.server.exe
    }

    pub fn config_path(&self) -> &Path {
        &self.server.config
    }

    pub fn ws_endpoint(&self) -> Endpoint {
        Endpoint::new(self.ws_ip.clone(), self.ws_port)
    }

    pub fn ws_url(&self) -> String {
        self.ws_endpoint().ws_url()
    }

    pub fn client(&self) -> RpcClient {
        self.server.client()
    }
}

/// A cross-chain witness server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessRecord {
    pub server: ServerInfo,
}

impl WitnessRecord {
    pub fn name(&self) -> &str {
        &self.server.name
    }

    /// The witnessd executable. Alias for `exe`.
    pub fn witnessd(&self) -> &str {
        &self.server.exe
    }

    /// Read the witness's own JSON config file as-is.
    pub fn load_config(&self) -> Result<serde_json::Value> {
        let path = &self.server.config;
        let file = File::open(path).map_err(|e| RegistryError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| RegistryError::Json {
            path: path.clone(),
            source,
        })
    }

    pub fn client(&self) -> RpcClient {
        self.server.client()
    }
}

impl AsRef<ServerInfo> for ChainRecord {
    fn as_ref(&self) -> &ServerInfo {
        &self.server
    }
}

impl AsRef<ServerInfo> for WitnessRecord {
    fn as_ref(&self) -> &ServerInfo {
        &self.server
    }
}

/// An owned server of either kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerRecord {
    Chain(ChainRecord),
    Witness(WitnessRecord),
}

impl ServerRecord {
    pub fn kind(&self) -> ServerKind {
        match self {
            ServerRecord::Chain(_) => ServerKind::Chain,
            ServerRecord::Witness(_) => ServerKind::Witness,
        }
    }

    pub fn info(&self) -> &ServerInfo {
        match self {
            ServerRecord::Chain(chain) => &chain.server,
            ServerRecord::Witness(witness) => &witness.server,
        }
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn is_docker(&self) -> bool {
        self.info().is_docker()
    }

    pub fn client(&self) -> RpcClient {
        self.info().client()
    }
}

impl From<ChainRecord> for ServerRecord {
    fn from(chain: ChainRecord) -> Self {
        ServerRecord::Chain(chain)
    }
}

impl From<WitnessRecord> for ServerRecord {
    fn from(witness: WitnessRecord) -> Self {
        ServerRecord::Witness(witness)
    }
}

/// A borrowed server of either kind, as returned by union lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerRef<'a> {
    Chain(&'a ChainRecord),
    Witness(&'a WitnessRecord),
}

impl<'a> ServerRef<'a> {
    pub fn kind(&self) -> ServerKind {
        match self {
            ServerRef::Chain(_) => ServerKind::Chain,
            ServerRef::Witness(_) => ServerKind::Witness,
        }
    }

    pub fn info(&self) -> &'a ServerInfo {
        match *self {
            ServerRef::Chain(chain) => &chain.server,
            ServerRef::Witness(witness) => &witness.server,
        }
    }

    pub fn name(&self) -> &'a str {
        &self.info().name
    }

    pub fn is_docker(&self) -> bool {
        self.info().is_docker()
    }

    pub fn client(&self) -> RpcClient {
        self.info().client()
    }

    pub fn to_owned_record(&self) -> ServerRecord {
        match *self {
            ServerRef::Chain(chain) => ServerRecord::Chain(chain.clone()),
            ServerRef::Witness(witness) => ServerRecord::Witness(witness.clone()),
        }
    }
}
