//! Conversion between registry records and the on-disk JSON document.
//!
//! ```json
//! {
//!     "chains":    [{"name", "type": "rippled", "pid", "exe", "config",
//!                    "http_ip", "http_port", "ws_ip", "ws_port"}],
//!     "witnesses": [{"name", "type": "witness", "pid", "exe", "config",
//!                    "http_ip", "http_port"}],
//!     "bridges":   [{"name", "chains", "num_witnesses", "door_accounts",
//!                    "xchain_currencies", "signature_reward",
//!                    "create_account_amounts"}]
//! }
//! ```
//!
//! Entries are decoded one at a time so a bad entry is reported with its
//! section and index.

use crate::error::{RegistryError, Result};
use crate::records::{BridgeRecord, ChainRecord, ServerInfo, ServerKind, WitnessRecord};
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CHAINS: &str = "chains";
pub const WITNESSES: &str = "witnesses";
pub const BRIDGES: &str = "bridges";

/// Persisted shape of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ServerKind,
    pub pid: u32,
    pub exe: String,
    pub config: PathBuf,
    pub http_ip: String,
    pub http_port: u16,
    pub ws_ip: String,
    pub ws_port: u16,
}

/// Persisted shape of a witness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ServerKind,
    pub pid: u32,
    pub exe: String,
    pub config: PathBuf,
    pub http_ip: String,
    pub http_port: u16,
}

/// The whole registry document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub chains: Vec<ChainEntry>,
    pub witnesses: Vec<WitnessEntry>,
    pub bridges: Vec<BridgeRecord>,
}

/// Document with sections parsed but entries not yet decoded
#[derive(Debug, Deserialize)]
struct RawDocument {
    chains: Vec<Value>,
    witnesses: Vec<Value>,
    bridges: Vec<Value>,
}

/// Decoded contents of a document, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    pub chains: Vec<ChainRecord>,
    pub witnesses: Vec<WitnessRecord>,
    pub bridges: Vec<BridgeRecord>,
}

fn decode_entry<T: DeserializeOwned>(
    section: &'static str,
    index: usize,
    value: Value,
) -> Result<T> {
    serde_json::from_value(value).map_err(|e| RegistryError::Malformed {
        section,
        index,
        reason: e.to_string(),
    })
}

fn check_kind(
    section: &'static str,
    index: usize,
    found: ServerKind,
    expected: ServerKind,
) -> Result<()> {
    if found != expected {
        return Err(RegistryError::Malformed {
            section,
            index,
            reason: format!(
                "field `type` is \"{}\", expected \"{}\"",
                found.as_tag(),
                expected.as_tag()
            ),
        });
    }
    Ok(())
}

pub fn decode_chain(index: usize, value: Value) -> Result<ChainRecord> {
    let entry: ChainEntry = decode_entry(CHAINS, index, value)?;
    check_kind(CHAINS, index, entry.kind, ServerKind::Chain)?;
    Ok(ChainRecord {
        server: ServerInfo {
            name: entry.name,
            pid: entry.pid,
            exe: entry.exe,
            config: entry.config,
            http_ip: entry.http_ip,
            http_port: entry.http_port,
        },
        ws_ip: entry.ws_ip,
        ws_port: entry.ws_port,
    })
}

pub fn decode_witness(index: usize, value: Value) -> Result<WitnessRecord> {
    let entry: WitnessEntry = decode_entry(WITNESSES, index, value)?;
    check_kind(WITNESSES, index, entry.kind, ServerKind::Witness)?;
    Ok(WitnessRecord {
        server: ServerInfo {
            name: entry.name,
            pid: entry.pid,
            exe: entry.exe,
            config: entry.config,
            http_ip: entry.http_ip,
            http_port: entry.http_port,
        },
    })
}

pub fn decode_bridge(index: usize, value: Value) -> Result<BridgeRecord> {
    decode_entry(BRIDGES, index, value)
}

pub fn encode_chain(chain: &ChainRecord) -> ChainEntry {
    let server = &chain.server;
    ChainEntry {
        name: server.name.clone(),
        kind: ServerKind::Chain,
        pid: server.pid,
        exe: server.exe.clone(),
        config: server.config.clone(),
        http_ip: server.http_ip.clone(),
        http_port: server.http_port,
        ws_ip: chain.ws_ip.clone(),
        ws_port: chain.ws_port,
    }
}

pub fn encode_witness(witness: &WitnessRecord) -> WitnessEntry {
    let server = &witness.server;
    WitnessEntry {
        name: server.name.clone(),
        kind: ServerKind::Witness,
        pid: server.pid,
        exe: server.exe.clone(),
        config: server.config.clone(),
        http_ip: server.http_ip.clone(),
        http_port: server.http_port,
    }
}

pub fn encode_document(
    chains: &[ChainRecord],
    witnesses: &[WitnessRecord],
    bridges: &[BridgeRecord],
) -> Document {
    Document {
        chains: chains.iter().map(encode_chain).collect(),
        witnesses: witnesses.iter().map(encode_witness).collect(),
        bridges: bridges.to_vec(),
    }
}

/// Decode document text. `path` is only used in error messages.
pub fn parse_document(text: &str, path: &Path) -> Result<Records> {
    let raw: RawDocument = serde_json::from_str(text).map_err(|source| RegistryError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let chains = raw
        .chains
        .into_iter()
        .enumerate()
        .map(|(index, value)| decode_chain(index, value))
        .collect::<Result<Vec<_>>>()?;
    let witnesses = raw
        .witnesses
        .into_iter()
        .enumerate()
        .map(|(index, value)| decode_witness(index, value))
        .collect::<Result<Vec<_>>>()?;
    let bridges = raw
        .bridges
        .into_iter()
        .enumerate()
        .map(|(index, value)| decode_bridge(index, value))
        .collect::<Result<Vec<_>>>()?;

    Ok(Records {
        chains,
        witnesses,
        bridges,
    })
}

pub fn read_document(path: &Path) -> Result<Records> {
    let text = fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
    parse_document(&text, path)
}

/// Render as pretty JSON with 4-space indentation
pub fn render_document(document: &Document) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn write_document(path: &Path, document: &Document) -> Result<()> {
    let text = render_document(document).map_err(|source| RegistryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|e| RegistryError::io(path, e))
}

/// Whether `file` is there. Any failure other than "not found" is an error.
fn document_exists(file: &Path) -> Result<bool> {
    match fs::metadata(file) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RegistryError::io(file, e)),
    }
}

/// Create the config folder and seed an empty document if none exists yet.
/// An existing file is left untouched, valid or not.
pub fn ensure_document(config_dir: &Path, file: &Path) -> Result<()> {
    fs::create_dir_all(config_dir).map_err(|e| RegistryError::io(config_dir, e))?;
    if !document_exists(file)? {
        info!("Initializing empty registry at {}", file.display());
        write_document(file, &Document::default())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn chain_value() -> Value {
        json!({
            "name": "locking_chain",
            "type": "rippled",
            "pid": 1234,
            "exe": "/usr/local/bin/rippled",
            "config": "/tmp/xchain/locking_chain/rippled.cfg",
            "http_ip": "127.0.0.1",
            "http_port": 5005,
            "ws_ip": "127.0.0.1",
            "ws_port": 6005
        })
    }

    #[test]
    fn test_decode_chain() {
        let chain = decode_chain(0, chain_value()).unwrap();
        assert_eq!(chain.name(), "locking_chain");
        assert_eq!(chain.server.pid, 1234);
        assert_eq!(chain.ws_port, 6005);
        assert_eq!(serde_json::to_value(encode_chain(&chain)).unwrap(), chain_value());
    }

    #[test]
    fn test_decode_chain_missing_field() {
        let mut value = chain_value();
        value.as_object_mut().unwrap().remove("ws_port");
        let err = decode_chain(3, value).unwrap_err();
        match err {
            RegistryError::Malformed { section, index, reason } => {
                assert_eq!(section, "chains");
                assert_eq!(index, 3);
                assert!(reason.contains("ws_port"), "reason was: {}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let mut value = chain_value();
        value["type"] = json!("witness");
        value.as_object_mut().unwrap().remove("ws_ip");
        value.as_object_mut().unwrap().remove("ws_port");
        assert!(decode_witness(0, value.clone()).is_ok());

        value["type"] = json!("rippled");
        let err = decode_witness(1, value).unwrap_err();
        assert!(err.to_string().contains("expected \"witness\""));
    }

    #[test]
    fn test_parse_document_requires_sections() {
        let err = parse_document(r#"{"chains": [], "witnesses": []}"#, Path::new("config.json"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Json { .. }));

        let err = parse_document("not json", Path::new("config.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Json { .. }));
    }

    #[test]
    fn test_render_uses_four_space_indent() {
        let text = render_document(&Document::default()).unwrap();
        assert_eq!(text, "{\n    \"chains\": [],\n    \"witnesses\": [],\n    \"bridges\": []\n}");
    }

    #[test]
    fn test_ensure_document_seeds_once() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("nested").join("sidechain-cli");
        let file = config_dir.join("config.json");

        ensure_document(&config_dir, &file).unwrap();
        assert_eq!(read_document(&file).unwrap(), Records::default());

        fs::write(&file, "{ broken").unwrap();
        ensure_document(&config_dir, &file).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "{ broken");
    }

    #[test]
    fn test_document_check_surfaces_io_errors() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a folder").unwrap();
        let file = blocker.join("config.json");

        assert!(!document_exists(&dir.path().join("config.json")).unwrap());
        assert!(document_exists(&blocker).unwrap());
        match document_exists(&file) {
            Err(RegistryError::Io { path, .. }) => assert_eq!(path, file),
            other => panic!("expected Io error, got {:?}", other),
        }
        assert!(matches!(
            ensure_document(&blocker, &file),
            Err(RegistryError::Io { .. })
        ));
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a folder");
    }
}
