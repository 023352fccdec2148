//! Operator CLI for the sidechain registry.
//!
//! Inspects and prunes the registry of running chains, witnesses and
//! bridges. Starting and stopping nodes is done by other tooling.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use log::info;

use sidechain_registry::store::codec;
use sidechain_registry::{
    ConfigStore, Endpoint, HttpProbe, Probe, ProbeMode, ServerRef, StoreConfig,
};

#[derive(Parser, Debug)]
#[command(name = "sidechain-registry")]
#[command(about = "Registry of local chain nodes, witness servers and bridges")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config folder holding config.json (default: ~/.config/sidechain-cli)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Probe servers concurrently while loading
    #[arg(long)]
    parallel: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered chains, witnesses and bridges
    List,

    /// Print one record as JSON
    Show {
        name: String,

        /// Category to search
        #[arg(long, value_enum, default_value = "server")]
        kind: Kind,
    },

    /// Print the XChainBridge object of a bridge
    Bridge { name: String },

    /// Probe a single endpoint with server_info
    Probe { host: String, port: u16 },

    /// Remove a chain or witness
    RemoveServer { name: String },

    /// Remove a bridge
    RemoveBridge { name: String },

    /// Print the registry document after reconciliation
    Dump,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Chain,
    Witness,
    Server,
    Bridge,
}

fn store_config(cli: &Cli) -> Result<StoreConfig> {
    let config = match &cli.config_dir {
        Some(dir) => StoreConfig::new(dir),
        None => StoreConfig::from_home()?,
    };
    let mode = if cli.parallel {
        ProbeMode::Parallel
    } else {
        ProbeMode::Sequential
    };
    Ok(config.with_probe_mode(mode))
}

fn load_store(config: &StoreConfig) -> Result<ConfigStore> {
    ConfigStore::load(config).wrap_err_with(|| {
        format!(
            "Failed to load registry from {}",
            config.config_file().display()
        )
    })
}

fn server_json(server: ServerRef<'_>) -> Result<serde_json::Value> {
    let value = match server {
        ServerRef::Chain(chain) => serde_json::to_value(codec::encode_chain(chain))?,
        ServerRef::Witness(witness) => serde_json::to_value(codec::encode_witness(witness))?,
    };
    Ok(value)
}

fn show(store: &ConfigStore, name: &str, kind: Kind) -> Result<serde_json::Value> {
    let value = match kind {
        Kind::Chain => server_json(ServerRef::Chain(store.get_chain(name)?))?,
        Kind::Witness => server_json(ServerRef::Witness(store.get_witness(name)?))?,
        Kind::Server => server_json(store.get_server(name)?)?,
        Kind::Bridge => serde_json::to_value(store.get_bridge(name)?)?,
    };
    Ok(value)
}

fn list(store: &ConfigStore) {
    println!("Chains:");
    for chain in store.chains() {
        println!(
            "  {:<20} pid {:<8} rpc {}  ws {}{}",
            chain.name(),
            chain.server.pid,
            chain.server.rpc_endpoint(),
            chain.ws_endpoint(),
            if chain.server.is_docker() { "  (docker)" } else { "" }
        );
    }
    println!("Witnesses:");
    for witness in store.witnesses() {
        println!(
            "  {:<20} pid {:<8} rpc {}{}",
            witness.name(),
            witness.server.pid,
            witness.server.rpc_endpoint(),
            if witness.server.is_docker() { "  (docker)" } else { "" }
        );
    }
    println!("Bridges:");
    for bridge in store.bridges() {
        let descriptor = bridge.descriptor();
        println!(
            "  {:<20} {} ({}) <-> {} ({}), {} witnesses",
            bridge.name,
            bridge.locking_chain(),
            descriptor.locking_issue,
            bridge.issuing_chain(),
            descriptor.issuing_issue,
            bridge.num_witnesses
        );
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let config = store_config(&cli)?;

    match &cli.command {
        Commands::List => {
            let store = load_store(&config)?;
            list(&store);
        }
        Commands::Show { name, kind } => {
            let store = load_store(&config)?;
            let value = show(&store, name, *kind)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Bridge { name } => {
            let store = load_store(&config)?;
            let bridge = store.get_bridge(name)?;
            println!("{}", serde_json::to_string_pretty(&bridge.to_xrpl())?);
        }
        Commands::Probe { host, port } => {
            let endpoint = Endpoint::new(host.clone(), *port);
            let liveness = HttpProbe::new().probe(&endpoint);
            println!("{}: {}", endpoint, if liveness.is_alive() { "alive" } else { "dead" });
        }
        Commands::RemoveServer { name } => {
            let mut store = load_store(&config)?;
            if store.remove_server(name)? {
                info!("Removed server {}", name);
            } else {
                info!("No server named {}, registry unchanged", name);
            }
        }
        Commands::RemoveBridge { name } => {
            let mut store = load_store(&config)?;
            if store.remove_bridge(name)? {
                info!("Removed bridge {}", name);
            } else {
                info!("No bridge named {}, registry unchanged", name);
            }
        }
        Commands::Dump => {
            let store = load_store(&config)?;
            println!("{}", codec::render_document(&store.to_document())?);
        }
    }

    Ok(())
}
