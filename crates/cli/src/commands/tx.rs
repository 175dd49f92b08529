//! Commands that produce blocks from the node key.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use poachain_core::{Block, Hash, Input, Output, PublicKey, Transaction};
use std::path::Path;

#[derive(Args)]
pub struct GenesisArgs {
    /// Recipient public key (hex); defaults to the node key
    #[arg(long)]
    to: Option<String>,

    /// Amount to mint
    #[arg(long)]
    amount: u64,
}

#[derive(Args)]
pub struct SendArgs {
    /// Recipient public key (hex)
    #[arg(long)]
    to: String,

    /// Spent output as <tx_id>:<index>:<value>; repeat for several
    #[arg(long = "input", value_parser = parse_input, required = true)]
    inputs: Vec<Input>,

    /// Output value paid to the recipient; repeat for several
    #[arg(long = "output", required = true)]
    outputs: Vec<u64>,
}

pub fn genesis(args: GenesisArgs, data_dir: &Path) -> Result<()> {
    let storage = super::open_storage(data_dir)?;
    let mut node = super::open_node(&storage, data_dir)?;

    let to = match args.to {
        Some(hex) => parse_public_key(&hex)?,
        None => node.public_key(),
    };

    let block = node.create_genesis(to.clone(), args.amount)?;
    node.process_block(&block)
        .with_context(|| "Genesis block was not accepted")?;
    storage.flush()?;

    println!("{}  Minted {} to {}", "✓".green().bold(), args.amount, to.to_address());
    print_block_summary(&block);
    Ok(())
}

pub fn send(args: SendArgs, data_dir: &Path) -> Result<()> {
    let storage = super::open_storage(data_dir)?;
    let mut node = super::open_node(&storage, data_dir)?;

    let to = parse_public_key(&args.to)?;
    let outputs = args.outputs.into_iter().map(Output::new).collect();
    let tx = Transaction::new(node.public_key(), to, args.inputs, outputs);
    let tx_id = tx.tx_id;

    node.add_to_pending_txs(tx);
    let block = node.propose().with_context(|| "Block was not accepted")?;
    storage.flush()?;

    println!("{}  Transaction {}", "✓".green().bold(), tx_id.to_hex().bright_yellow());
    print_block_summary(&block);
    Ok(())
}

fn print_block_summary(block: &Block) {
    println!("    Height: {}", block.height.to_string().bright_cyan());
    println!("    Hash:   {}", block.hash.to_hex().bright_yellow());
    println!("    Nonce:  {}", block.nonce.to_string().bright_black());
}

fn parse_public_key(s: &str) -> Result<PublicKey> {
    PublicKey::from_hex(s).with_context(|| format!("Invalid public key: {}", s))
}

/// Parse `<tx_id>:<index>:<value>`.
fn parse_input(s: &str) -> std::result::Result<Input, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [tx_id, index, value] = parts.as_slice() else {
        return Err(format!("expected <tx_id>:<index>:<value>, got {s}"));
    };
    let tx_id = Hash::from_hex(tx_id).map_err(|e| format!("bad tx id: {e}"))?;
    let index = index.parse().map_err(|e| format!("bad output index: {e}"))?;
    let value = value.parse().map_err(|e| format!("bad value: {e}"))?;
    Ok(Input::new(tx_id, index, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use poachain_core::genesis_tx_input;

    #[test]
    fn test_parse_input() {
        let id = genesis_tx_input();
        let input = parse_input(&format!("{}:0:100", id.to_hex())).unwrap();
        assert_eq!(input, Input::new(id, 0, 100));

        let prefixed = parse_input(&format!("{}:2:5", id)).unwrap();
        assert_eq!(prefixed.output_index, 2);
    }

    #[test]
    fn test_parse_input_errors() {
        let id = genesis_tx_input().to_hex();
        assert!(parse_input("nope").is_err());
        assert!(parse_input(&format!("{id}:0")).is_err());
        assert!(parse_input(&format!("{id}:x:1")).is_err());
        assert!(parse_input(&format!("{id}:0:-1")).is_err());
        assert!(parse_input("abcd:0:1").is_err());
    }
}
