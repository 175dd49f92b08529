//! poachain CLI entry point.

use clap::Parser;
use std::path::PathBuf;

mod commands;
mod config;
mod keys;
mod logging;

#[derive(Parser)]
#[command(name = "poachain")]
#[command(about = "A minimal proof-of-authority ledger node", long_about = None)]
struct Cli {
    /// Data directory holding the config, node key and database
    #[arg(short = 'd', long, global = true, env = "POACHAIN_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Log filter, overrides the configured level
    #[arg(long, global = true, env = "POACHAIN_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<commands::Commands>,
}

fn main() {
    let cli = Cli::parse();

    let level = cli.log_level.clone().unwrap_or_else(|| {
        config::NodeConfig::load(&cli.data_dir)
            .map(|config| config.log_level)
            .unwrap_or_else(|_| "info".to_string())
    });
    logging::init_logging(&level);
    tracing::debug!(data_dir = %cli.data_dir.display(), "starting");

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd, &cli.data_dir) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("poachain - A minimal proof-of-authority ledger node");
            println!("Run 'poachain --help' for usage information.");
        }
    }
}
