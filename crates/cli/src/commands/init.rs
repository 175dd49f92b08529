//! Initialize data directory command.

use crate::config::NodeConfig;
use crate::keys::{node_key_path, save_keypair};
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use poachain_core::pow::MAX_DIFFICULTY;
use poachain_core::Keypair;
use std::fs;
use std::path::Path;

#[derive(Args)]
pub struct InitArgs {
    /// Chain id used to namespace storage keys
    #[arg(long, default_value = "main")]
    chain_id: String,

    /// Leading zero bytes required of block hashes
    #[arg(long, default_value = "1")]
    difficulty: u64,

    /// Accept blocks from any signer instead of only the node key
    #[arg(long)]
    dev: bool,
}

pub fn run(args: InitArgs, data_dir: &Path) -> Result<()> {
    if NodeConfig::path(data_dir).exists() {
        bail!("{} is already initialized", data_dir.display());
    }
    if args.difficulty > MAX_DIFFICULTY {
        bail!("Difficulty {} exceeds {}", args.difficulty, MAX_DIFFICULTY);
    }

    println!("{}", "Initializing poachain...".bold().cyan());
    println!();

    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
    super::open_storage(data_dir)?;
    println!("{}  Created data directory", "✓".green().bold());

    let keypair = Keypair::generate()?;
    let key_file = node_key_path(data_dir);
    save_keypair(&key_file, &keypair)?;
    println!(
        "{}  Saved node key to: {}",
        "✓".green().bold(),
        key_file.display().to_string().bright_black()
    );
    println!("    Address:    {}", keypair.address().to_hex().bright_yellow());
    println!("    Public Key: {}", keypair.public_key.to_hex().bright_black());

    let config = NodeConfig {
        chain_id: args.chain_id,
        difficulty: args.difficulty,
        auth_miners: if args.dev {
            Vec::new()
        } else {
            vec![keypair.public_key.to_hex()]
        },
        ..NodeConfig::default()
    };
    config.save(data_dir)?;
    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        NodeConfig::path(data_dir).display().to_string().bright_black()
    );

    println!();
    println!("{}", "Chain initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  • Use {} to mint the initial supply",
        "poachain genesis --amount <N>".bright_cyan()
    );
    println!(
        "  • Use {} to move value",
        "poachain send".bright_cyan()
    );
    println!(
        "  • Use {} to explore blocks",
        "poachain chain".bright_cyan()
    );

    Ok(())
}
