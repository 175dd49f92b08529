//! Block explorer and block exchange commands.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use poachain_core::{Block, Hash};
use poachain_chain::Blockchain;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ShowArgs {
    /// Block height or block hash (hex)
    block_id: String,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Block height or block hash (hex)
    block_id: String,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// File holding a block's canonical bytes
    file: PathBuf,
}

pub fn list(data_dir: &Path) -> Result<()> {
    let storage = super::open_storage(data_dir)?;
    let blockchain = super::open_chain(&storage, data_dir)?;

    println!();
    println!("{}", format!("Chain '{}'", blockchain.id()).bold().cyan());
    println!("{}", "═".repeat(80).bright_black());

    if blockchain.height() == 0 {
        println!("  No blocks yet.");
        println!();
        return Ok(());
    }

    println!(
        "{:>8}  {:<66}  {:>4}",
        "Height".bold(),
        "Hash".bold(),
        "Txs".bold()
    );
    for block in blockchain.iter_back() {
        let block = block?;
        println!(
            "{:>8}  {:<66}  {:>4}",
            block.height.to_string().bright_cyan(),
            block.hash.to_string().bright_yellow(),
            block.txs.len()
        );
    }
    println!();

    Ok(())
}

pub fn show(args: ShowArgs, data_dir: &Path) -> Result<()> {
    let storage = super::open_storage(data_dir)?;
    let blockchain = super::open_chain(&storage, data_dir)?;
    let block = find_block(&blockchain, &args.block_id)?;

    println!();
    println!("{}", format!("Block #{}", block.height).bold().cyan());
    println!("{}", "═".repeat(60).bright_black());
    println!("  Hash:        {}", block.hash.to_string().bright_yellow());
    println!("  Prev Hash:   {}", block.prev_hash.to_string().bright_black());
    println!("  Miner:       {}", block.miner.to_hex().bright_yellow());
    println!("  Timestamp:   {}", block.timestamp);
    println!("  Nonce:       {}", block.nonce);
    println!("  Signature:   {}", hex::encode(&block.signature).bright_black());
    println!("  Txs:         {}", block.txs.len().to_string().bright_cyan());

    if !block.txs.is_empty() {
        println!();
        println!("{}", "Transactions:".bold());
        for (i, tx) in block.txs.iter().enumerate() {
            let kind = if tx.is_genesis() { "mint" } else { "transfer" };
            println!(
                "  {} {} ({})",
                format!("{}.", i + 1).bright_black(),
                tx.tx_id.to_string().bright_yellow(),
                kind
            );
            println!("       to:      {}", tx.to.to_address());
            if !tx.is_genesis() {
                println!("       from:    {}", tx.from.to_address());
            }
            println!(
                "       value:   {}",
                tx.total_output().map_or_else(|| "overflow".to_string(), |v| v.to_string())
            );
        }
    }
    println!();

    Ok(())
}

pub fn export(args: ExportArgs, data_dir: &Path) -> Result<()> {
    let storage = super::open_storage(data_dir)?;
    let blockchain = super::open_chain(&storage, data_dir)?;
    let bytes = find_block(&blockchain, &args.block_id)?.to_bytes();

    match args.out {
        Some(path) => {
            fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{}  Wrote {} bytes to {}",
                "✓".green().bold(),
                bytes.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

pub fn import(args: ImportArgs, data_dir: &Path) -> Result<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let bytes = trim_trailing_newline(&bytes);

    let storage = super::open_storage(data_dir)?;
    let mut node = super::open_node(&storage, data_dir)?;
    let block = node
        .process_block_bytes(bytes)
        .with_context(|| format!("Block from {} was rejected", args.file.display()))?;
    storage.flush()?;

    println!(
        "{}  Imported block #{} {}",
        "✓".green().bold(),
        block.height,
        block.hash.to_string().bright_yellow()
    );
    Ok(())
}

/// Resolve a height or a block hash to a stored block.
fn find_block(blockchain: &Blockchain<'_>, id: &str) -> Result<Block> {
    if let Ok(height) = id.parse::<u64>() {
        return blockchain
            .get_block_by_height(height)?
            .with_context(|| format!("No block at height {}", height));
    }
    let hash = match Hash::from_hex(id) {
        Ok(hash) => hash,
        Err(_) => bail!("Expected a block height or 32-byte hash, got {}", id),
    };
    Ok(blockchain.get_block(&hash)?)
}

fn trim_trailing_newline(bytes: &[u8]) -> &[u8] {
    match bytes {
        [rest @ .., b'\n'] => rest,
        _ => bytes,
    }
}
