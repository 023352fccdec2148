//! # Registry Store
//!
//! The store owns the in-memory view of the registry document and writes it
//! back after every change.
//!
//! ## Load
//!
//! 1. Ensure the config folder and document exist (seeding an empty one)
//! 2. Decode every entry
//! 3. Probe each chain, then each witness, and drop those that are dead
//! 4. Persist the pruned set straight away
//!
//! A node that crashed or was killed therefore disappears on the next load
//! even if nobody stopped it. Bridges are never probed.
//!
//! ## Names
//!
//! Names are the lookup key within each collection. Plain registration does
//! not check for duplicates; lookups return the first match in insertion
//! order. The `try_register_*` operations reject a name that is taken.
//!
//! ## Concurrency
//!
//! The document is owned by whichever process persisted last. There is no
//! locking: two invocations racing will overwrite each other.

pub mod codec;
pub mod config;

pub use codec::{Document, Records};
pub use config::{ProbeMode, StoreConfig, CONFIG_FILE_NAME};

use crate::error::{Category, RegistryError, Result};
use crate::records::{
    BridgeRecord, ChainRecord, ServerInfo, ServerRecord, ServerRef, WitnessRecord,
};
use crate::rpc::{Endpoint, HttpProbe, Liveness, Probe, RpcClient};
use log::{debug, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Keep the servers whose RPC endpoint answers, preserving order
fn retain_alive<T, P>(servers: Vec<T>, probe: &P, mode: ProbeMode) -> Vec<T>
where
    T: AsRef<ServerInfo> + Sync,
    P: Probe + ?Sized,
{
    let check = |server: &T| {
        let info = server.as_ref();
        let liveness = probe.probe(&info.rpc_endpoint());
        if !liveness.is_alive() {
            info!(
                "Dropping {} from the registry: no response at {}:{}",
                info.name, info.http_ip, info.http_port
            );
        }
        liveness
    };

    let outcomes: Vec<Liveness> = match mode {
        ProbeMode::Sequential => servers.iter().map(check).collect(),
        ProbeMode::Parallel => servers.par_iter().map(check).collect(),
    };

    servers
        .into_iter()
        .zip(outcomes)
        .filter(|(_, liveness)| liveness.is_alive())
        .map(|(server, _)| server)
        .collect()
}

/// In-memory registry of chains, witnesses and bridges
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    chains: Vec<ChainRecord>,
    witnesses: Vec<WitnessRecord>,
    bridges: Vec<BridgeRecord>,
}

impl ConfigStore {
    /// Load the document, probing servers over HTTP
    pub fn load(config: &StoreConfig) -> Result<Self> {
        Self::load_with_probe(config, &HttpProbe::new())
    }

    /// Load the document, classifying servers with `probe`
    pub fn load_with_probe<P: Probe + ?Sized>(config: &StoreConfig, probe: &P) -> Result<Self> {
        let path = config.config_file();
        codec::ensure_document(config.config_dir(), &path)?;

        let records = codec::read_document(&path)?;
        let (total_chains, total_witnesses) = (records.chains.len(), records.witnesses.len());

        let chains = retain_alive(records.chains, probe, config.probe_mode);
        let witnesses = retain_alive(records.witnesses, probe, config.probe_mode);

        info!(
            "Loaded registry {}: {}/{} chains alive, {}/{} witnesses alive, {} bridges",
            path.display(),
            chains.len(),
            total_chains,
            witnesses.len(),
            total_witnesses,
            records.bridges.len()
        );

        let store = Self {
            path,
            chains,
            witnesses,
            bridges: records.bridges,
        };
        store.persist()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn chains(&self) -> &[ChainRecord] {
        &self.chains
    }

    pub fn witnesses(&self) -> &[WitnessRecord] {
        &self.witnesses
    }

    pub fn bridges(&self) -> &[BridgeRecord] {
        &self.bridges
    }

    pub fn find_chain(&self, name: &str) -> Option<&ChainRecord> {
        self.chains.iter().find(|chain| chain.name() == name)
    }

    pub fn find_witness(&self, name: &str) -> Option<&WitnessRecord> {
        self.witnesses.iter().find(|witness| witness.name() == name)
    }

    /// Chains are searched before witnesses
    pub fn find_server(&self, name: &str) -> Option<ServerRef<'_>> {
        self.find_chain(name)
            .map(ServerRef::Chain)
            .or_else(|| self.find_witness(name).map(ServerRef::Witness))
    }

    pub fn find_bridge(&self, name: &str) -> Option<&BridgeRecord> {
        self.bridges.iter().find(|bridge| bridge.name == name)
    }

    pub fn get_chain(&self, name: &str) -> Result<&ChainRecord> {
        self.find_chain(name)
            .ok_or_else(|| RegistryError::not_found(name, Category::Chain))
    }

    pub fn get_witness(&self, name: &str) -> Result<&WitnessRecord> {
        self.find_witness(name)
            .ok_or_else(|| RegistryError::not_found(name, Category::Witness))
    }

    pub fn get_server(&self, name: &str) -> Result<ServerRef<'_>> {
        self.find_server(name)
            .ok_or_else(|| RegistryError::not_found(name, Category::Server))
    }

    pub fn get_bridge(&self, name: &str) -> Result<&BridgeRecord> {
        self.find_bridge(name)
            .ok_or_else(|| RegistryError::not_found(name, Category::Bridge))
    }

    pub fn contains_chain(&self, name: &str) -> bool {
        self.find_chain(name).is_some()
    }

    pub fn contains_witness(&self, name: &str) -> bool {
        self.find_witness(name).is_some()
    }

    pub fn contains_server(&self, name: &str) -> bool {
        self.find_server(name).is_some()
    }

    pub fn contains_bridge(&self, name: &str) -> bool {
        self.find_bridge(name).is_some()
    }

    /// RPC clients for the bridge's (locking, issuing) chains
    pub fn bridge_clients(&self, name: &str) -> Result<(RpcClient, RpcClient)> {
        let bridge = self.get_bridge(name)?;
        let locking = self.chain_client(bridge.locking_chain())?;
        let issuing = self.chain_client(bridge.issuing_chain())?;
        Ok((locking, issuing))
    }

    /// Client for a bridge side: a registered chain name, or the chain's
    /// `http://host:port` URL as older bridge records store it
    fn chain_client(&self, chain: &str) -> Result<RpcClient> {
        if let Some(record) = self.find_chain(chain) {
            return Ok(record.client());
        }
        Endpoint::from_http_url(chain)
            .map(RpcClient::new)
            .ok_or_else(|| RegistryError::not_found(chain, Category::Chain))
    }

    pub fn register_chain(&mut self, chain: ChainRecord) -> Result<()> {
        debug!("Registering chain {}", chain.name());
        self.chains.push(chain);
        self.persist()
    }

    pub fn register_witness(&mut self, witness: WitnessRecord) -> Result<()> {
        debug!("Registering witness {}", witness.name());
        self.witnesses.push(witness);
        self.persist()
    }

    pub fn register_server(&mut self, server: ServerRecord) -> Result<()> {
        match server {
            ServerRecord::Chain(chain) => self.register_chain(chain),
            ServerRecord::Witness(witness) => self.register_witness(witness),
        }
    }

    pub fn register_bridge(&mut self, bridge: BridgeRecord) -> Result<()> {
        debug!("Registering bridge {}", bridge.name);
        self.bridges.push(bridge);
        self.persist()
    }

    /// Like [`register_chain`](Self::register_chain) but rejects a taken name
    pub fn try_register_chain(&mut self, chain: ChainRecord) -> Result<()> {
        if self.contains_chain(chain.name()) {
            return Err(RegistryError::Duplicate {
                name: chain.name().to_string(),
                category: Category::Chain,
            });
        }
        self.register_chain(chain)
    }

    pub fn try_register_witness(&mut self, witness: WitnessRecord) -> Result<()> {
        if self.contains_witness(witness.name()) {
            return Err(RegistryError::Duplicate {
                name: witness.name().to_string(),
                category: Category::Witness,
            });
        }
        self.register_witness(witness)
    }

    pub fn try_register_bridge(&mut self, bridge: BridgeRecord) -> Result<()> {
        if self.contains_bridge(&bridge.name) {
            return Err(RegistryError::Duplicate {
                name: bridge.name,
                category: Category::Bridge,
            });
        }
        self.register_bridge(bridge)
    }

    /// Remove the first chain named `name`. Returns whether one was removed;
    /// nothing is written when there was no match.
    pub fn remove_chain(&mut self, name: &str) -> Result<bool> {
        match self.chains.iter().position(|chain| chain.name() == name) {
            Some(index) => {
                self.chains.remove(index);
                debug!("Removed chain {}", name);
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_witness(&mut self, name: &str) -> Result<bool> {
        match self.witnesses.iter().position(|witness| witness.name() == name) {
            Some(index) => {
                self.witnesses.remove(index);
                debug!("Removed witness {}", name);
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the first chain named `name`, or failing that the first witness
    pub fn remove_server(&mut self, name: &str) -> Result<bool> {
        if self.remove_chain(name)? {
            return Ok(true);
        }
        self.remove_witness(name)
    }

    pub fn remove_bridge(&mut self, name: &str) -> Result<bool> {
        match self.bridges.iter().position(|bridge| bridge.name == name) {
            Some(index) => {
                self.bridges.remove(index);
                debug!("Removed bridge {}", name);
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn to_document(&self) -> Document {
        codec::encode_document(&self.chains, &self.witnesses, &self.bridges)
    }

    /// Write the full document, replacing whatever is on disk
    pub fn persist(&self) -> Result<()> {
        codec::write_document(&self.path, &self.to_document())?;
        debug!(
            "Persisted registry to {} ({} chains, {} witnesses, {} bridges)",
            self.path.display(),
            self.chains.len(),
            self.witnesses.len(),
            self.bridges.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::XChainCurrency;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn alive(_: &Endpoint) -> Liveness {
        Liveness::Alive
    }

    fn info(name: &str, port: u16) -> ServerInfo {
        ServerInfo {
            name: name.to_string(),
            pid: 1000 + port as u32,
            exe: "/usr/local/bin/rippled".to_string(),
            config: PathBuf::from(format!("/tmp/xchain/{}/rippled.cfg", name)),
            http_ip: "127.0.0.1".to_string(),
            http_port: port,
        }
    }

    fn chain(name: &str, port: u16) -> ChainRecord {
        ChainRecord {
            server: info(name, port),
            ws_ip: "127.0.0.1".to_string(),
            ws_port: port + 1000,
        }
    }

    fn witness(name: &str, port: u16) -> WitnessRecord {
        let mut server = info(name, port);
        server.exe = "/usr/local/bin/witnessd".to_string();
        WitnessRecord { server }
    }

    fn bridge(name: &str) -> BridgeRecord {
        BridgeRecord {
            name: name.to_string(),
            chains: ["locking_chain".to_string(), "issuing_chain".to_string()],
            num_witnesses: 1,
            door_accounts: ["rA".to_string(), "rB".to_string()],
            currencies: [XChainCurrency::native(), XChainCurrency::native()],
            signature_reward: "100".to_string(),
            create_account_amounts: ["5000000".to_string(), "5000000".to_string()],
        }
    }

    fn empty_store(dir: &TempDir) -> ConfigStore {
        ConfigStore::load_with_probe(&StoreConfig::new(dir.path()), &alive).unwrap()
    }

    #[test]
    fn test_load_seeds_missing_document() {
        let dir = TempDir::new().unwrap();
        let store = empty_store(&dir);
        assert!(store.chains().is_empty());
        assert!(store.witnesses().is_empty());
        assert!(store.bridges().is_empty());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_invalid_existing_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[]").unwrap();
        let err = ConfigStore::load_with_probe(&StoreConfig::new(dir.path()), &alive).unwrap_err();
        assert!(matches!(err, RegistryError::Json { .. }));
        assert_eq!(fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap(), "[]");
    }

    #[test]
    fn test_lookup_by_category() {
        let dir = TempDir::new().unwrap();
        let mut store = empty_store(&dir);
        store.register_witness(witness("x", 5010)).unwrap();
        store.register_bridge(bridge("x")).unwrap();
        store.register_chain(chain("locking_chain", 5005)).unwrap();

        assert_eq!(store.get_chain("locking_chain").unwrap().ws_port, 6005);

        let err = store.get_chain("x").unwrap_err();
        match err {
            RegistryError::NotFound { name, category } => {
                assert_eq!(name, "x");
                assert_eq!(category, Category::Chain);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store.get_witness("x").is_ok());
        assert!(store.get_bridge("x").is_ok());
        assert_eq!(
            store.get_bridge("missing").unwrap_err().to_string(),
            "No bridge with name missing."
        );
    }

    #[test]
    fn test_server_lookup_prefers_chains() {
        let dir = TempDir::new().unwrap();
        let mut store = empty_store(&dir);
        store.register_witness(witness("shared", 5010)).unwrap();
        store.register_chain(chain("shared", 5005)).unwrap();

        let server = store.get_server("shared").unwrap();
        assert!(matches!(server, ServerRef::Chain(_)));
        assert_eq!(server.info().http_port, 5005);

        store.remove_server("shared").unwrap();
        assert!(matches!(store.get_server("shared").unwrap(), ServerRef::Witness(_)));

        let err = store.get_server("nobody").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::NotFound { category: Category::Server, .. }
        ));
    }

    #[test]
    fn test_duplicate_registration_returns_first() {
        let dir = TempDir::new().unwrap();
        let mut store = empty_store(&dir);
        store.register_chain(chain("locking_chain", 5005)).unwrap();
        store.register_chain(chain("locking_chain", 5006)).unwrap();

        assert_eq!(store.chains().len(), 2);
        assert_eq!(store.get_chain("locking_chain").unwrap().server.http_port, 5005);

        let err = store.try_register_chain(chain("locking_chain", 5007)).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Duplicate { category: Category::Chain, .. }
        ));
        assert_eq!(store.chains().len(), 2);

        store.try_register_bridge(bridge("test_bridge")).unwrap();
        assert!(store.try_register_bridge(bridge("test_bridge")).is_err());
        store.try_register_witness(witness("witness0", 5010)).unwrap();
        assert!(store.try_register_witness(witness("witness0", 5011)).is_err());
    }

    #[test]
    fn test_mutations_are_persisted() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path());
        let mut store = empty_store(&dir);
        store.register_chain(chain("locking_chain", 5005)).unwrap();
        store.register_witness(witness("witness0", 5010)).unwrap();
        store.register_bridge(bridge("test_bridge")).unwrap();

        let reloaded = ConfigStore::load_with_probe(&config, &alive).unwrap();
        assert_eq!(reloaded.to_document(), store.to_document());

        store.remove_bridge("test_bridge").unwrap();
        let reloaded = ConfigStore::load_with_probe(&config, &alive).unwrap();
        assert!(reloaded.bridges().is_empty());
        assert_eq!(reloaded.chains().len(), 1);
    }

    #[test]
    fn test_removing_unknown_name_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = empty_store(&dir);
        store.register_chain(chain("locking_chain", 5005)).unwrap();
        store.register_bridge(bridge("test_bridge")).unwrap();

        let file = dir.path().join(CONFIG_FILE_NAME);
        let before = fs::read_to_string(&file).unwrap();
        let document = store.to_document();

        assert!(!store.remove_server("nobody").unwrap());
        assert!(!store.remove_bridge("nobody").unwrap());
        assert!(!store.remove_witness("locking_chain").unwrap());

        assert_eq!(store.to_document(), document);
        assert_eq!(fs::read_to_string(&file).unwrap(), before);
    }

    #[test]
    fn test_load_prunes_dead_servers_in_order() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path());
        let mut store = empty_store(&dir);
        for (name, port) in [("a", 5001), ("b", 5002), ("c", 5003), ("d", 5004)] {
            store.register_chain(chain(name, port)).unwrap();
        }
        store.register_witness(witness("w0", 5101)).unwrap();
        store.register_witness(witness("w1", 5102)).unwrap();
        store.register_bridge(bridge("test_bridge")).unwrap();

        let probed = AtomicUsize::new(0);
        let odd_ports_alive = |endpoint: &Endpoint| {
            probed.fetch_add(1, Ordering::SeqCst);
            if endpoint.port % 2 == 1 {
                Liveness::Alive
            } else {
                Liveness::Dead
            }
        };

        for mode in [ProbeMode::Sequential, ProbeMode::Parallel] {
            probed.store(0, Ordering::SeqCst);
            let reloaded = ConfigStore::load_with_probe(
                &config.clone().with_probe_mode(mode),
                &odd_ports_alive,
            )
            .unwrap();
            let names: Vec<&str> = reloaded.chains().iter().map(|c| c.name()).collect();
            assert_eq!(names, vec!["a", "c"]);
            assert_eq!(reloaded.witnesses().len(), 1);
            assert_eq!(reloaded.witnesses()[0].name(), "w0");
            assert_eq!(reloaded.bridges().len(), 1);

            let on_disk = codec::read_document(&config.config_file()).unwrap();
            assert_eq!(on_disk.chains, reloaded.chains().to_vec());
        }
        // The first pass already pruned b, d and w1
        assert_eq!(probed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_bridge_clients_resolve_chains() {
        let dir = TempDir::new().unwrap();
        let mut store = empty_store(&dir);
        store.register_bridge(bridge("test_bridge")).unwrap();
        store.register_chain(chain("locking_chain", 5005)).unwrap();

        let err = store.bridge_clients("test_bridge").unwrap_err();
        assert_eq!(err.to_string(), "No chain with name issuing_chain.");

        store.register_chain(chain("issuing_chain", 5006)).unwrap();
        let (locking, issuing) = store.bridge_clients("test_bridge").unwrap();
        assert_eq!(locking.url(), "http://127.0.0.1:5005");
        assert_eq!(issuing.url(), "http://127.0.0.1:5006");
    }

    #[test]
    fn test_bridge_clients_from_chain_urls() {
        let dir = TempDir::new().unwrap();
        let mut store = empty_store(&dir);
        let mut legacy = bridge("legacy_bridge");
        legacy.chains = [
            "http://127.0.0.1:5005".to_string(),
            "http://127.0.0.1:5006/".to_string(),
        ];
        store.register_bridge(legacy).unwrap();

        let (locking, issuing) = store.bridge_clients("legacy_bridge").unwrap();
        assert_eq!(locking.url(), "http://127.0.0.1:5005");
        assert_eq!(issuing.url(), "http://127.0.0.1:5006");

        let mut broken = bridge("broken_bridge");
        broken.chains[1] = "ws://127.0.0.1:6006".to_string();
        store.register_bridge(broken).unwrap();
        let err = store.bridge_clients("broken_bridge").unwrap_err();
        assert_eq!(err.to_string(), "No chain with name ws://127.0.0.1:6006.");
    }
}
