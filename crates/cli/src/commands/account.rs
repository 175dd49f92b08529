//! Balance lookup command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use poachain_core::{Address, PublicKey};
use std::path::Path;

#[derive(Args)]
pub struct BalanceArgs {
    /// Packed public key or 32-byte address (hex)
    account: String,
}

pub fn balance(args: BalanceArgs, data_dir: &Path) -> Result<()> {
    let address = parse_account(&args.account)?;

    let storage = super::open_storage(data_dir)?;
    let blockchain = super::open_chain(&storage, data_dir)?;
    let balance = blockchain.get_address_balance(&address)?;

    println!();
    println!("  Address: {}", address.to_hex().bright_yellow());
    println!("  Balance: {}", balance.to_string().bright_cyan());
    println!();

    Ok(())
}

/// A 64-character hex string is an address; anything else is read as a
/// packed public key.
fn parse_account(s: &str) -> Result<Address> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() == 64 {
        return Address::from_hex(digits).with_context(|| format!("Invalid address: {}", s));
    }
    let key = PublicKey::from_hex(digits).with_context(|| format!("Invalid public key: {}", s))?;
    Ok(key.to_address())
}
