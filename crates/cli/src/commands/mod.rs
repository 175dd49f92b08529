//! CLI commands module.

use crate::config::NodeConfig;
use crate::keys::{load_keypair, node_key_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use poachain_chain::{Blockchain, Node};
use poachain_storage::Storage;
use std::path::Path;

mod account;
mod block;
mod init;
mod tx;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a data directory with a node key and config
    Init(init::InitArgs),
    /// Mint the initial supply in a new block
    Genesis(tx::GenesisArgs),
    /// Send value from the node key and mine it into a block
    Send(tx::SendArgs),
    /// Show the balance of a public key or address
    Balance(account::BalanceArgs),
    /// List blocks from the tip back to the first block
    Chain,
    /// Show one block by hash or height
    Block(block::ShowArgs),
    /// Write a block's canonical bytes to a file or stdout
    Export(block::ExportArgs),
    /// Verify and append a block from canonical bytes
    Import(block::ImportArgs),
}

pub fn run(cmd: Commands, data_dir: &Path) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args, data_dir),
        Commands::Genesis(args) => tx::genesis(args, data_dir),
        Commands::Send(args) => tx::send(args, data_dir),
        Commands::Balance(args) => account::balance(args, data_dir),
        Commands::Chain => block::list(data_dir),
        Commands::Block(args) => block::show(args, data_dir),
        Commands::Export(args) => block::export(args, data_dir),
        Commands::Import(args) => block::import(args, data_dir),
    }
}

/// Open the database inside `data_dir`.
fn open_storage(data_dir: &Path) -> Result<Storage> {
    Storage::open(data_dir.join("db"))
        .with_context(|| "Failed to open storage. Did you run 'poachain init'?")
}

/// Open the configured chain on `storage`.
fn open_chain<'s>(storage: &'s Storage, data_dir: &Path) -> Result<Blockchain<'s>> {
    let config = NodeConfig::load(data_dir)?;
    let blockchain = Blockchain::new(storage, config.blockchain_config()?)
        .with_context(|| "Failed to open chain")?;
    Ok(blockchain)
}

/// Open the chain and wrap it in a node using the node key.
fn open_node<'s>(storage: &'s Storage, data_dir: &Path) -> Result<Node<'s>> {
    let keypair = load_keypair(&node_key_path(data_dir))?;
    Ok(Node::new(keypair, open_chain(storage, data_dir)?))
}
