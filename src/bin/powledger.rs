#![forbid(unsafe_code)]
//! Command-line front end for a powledger snapshot directory

use clap::{Parser, Subcommand};
use colored::*;
use powledger::blockchain::{validate_chain, Blockchain};
use powledger::config::{load_config, Config};
use powledger::error::ChainError;
use powledger::node::{apply_network_config, mine_pending_block, shared};
use powledger::persistence::FsSnapshotStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shows chain height, tip hash and validity
    Status,
    /// Seals funded starting wallets; only works on an empty data directory
    Genesis {
        /// Number of wallets to fund
        #[arg(long, default_value_t = 2)]
        wallets: usize,
        /// Units credited to each wallet
        #[arg(long)]
        amount: u64,
    },
    /// Creates a wallet and seals it into a new block
    Wallet,
    /// Signs a transaction and seals it into a new block
    Send {
        #[arg(long)]
        amount: u64,
        /// Sender public key (hex)
        #[arg(long)]
        from: String,
        /// Recipient public key (hex)
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "")]
        message: String,
        /// Sender private key (hex)
        #[arg(long)]
        key: String,
    },
    /// Shows the confirmed balance and history of an address
    Balance { address: String },
    /// Re-validates the whole chain and lists every problem found
    Validate,
    /// Lists configured peer nodes
    Peers,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_tracing(&config);

    let store = FsSnapshotStore::open(&config.ledger.data_dir)?;
    let mut ledger = Blockchain::new_with_store(Box::new(store))?;
    apply_network_config(&mut ledger, &config);

    match cli.command {
        Commands::Status => status(&ledger),
        Commands::Genesis { wallets, amount } => {
            let funded = ledger.fund_genesis_wallets(wallets, amount)?;
            let ledger = shared(ledger);
            let block = mine_pending_block(&ledger).await?;
            println!("{}", "🌱 Genesis allocation sealed".bright_green().bold());
            for (i, wallet) in funded.iter().enumerate() {
                println!("Wallet {} ({} units)", i + 1, amount);
                println!("  Public key:  {}", wallet.public_key.bright_yellow());
                println!("  Private key: {}", wallet.private_key.bright_red());
            }
            println!("{}", "Keep the private keys safe: they are not stored anywhere.".yellow());
            println!("Allocated in block #{}", block.index);
        }
        Commands::Wallet => {
            let wallet = ledger.create_wallet();
            let ledger = shared(ledger);
            let block = mine_pending_block(&ledger).await?;
            println!("{}", "👛 Wallet created".bright_green().bold());
            println!("Public key:  {}", wallet.public_key.bright_yellow());
            println!("Private key: {}", wallet.private_key.bright_red());
            println!("{}", "Keep the private key safe: it is not stored anywhere.".yellow());
            println!("Registered in block #{}", block.index);
        }
        Commands::Send {
            amount,
            from,
            to,
            message,
            key,
        } => {
            let transaction = ledger.create_transaction(amount, &from, &to, &message, &key)?;
            let id = transaction.transaction_id.clone().unwrap_or_default();
            ledger.admit_transaction(transaction)?;
            let ledger = shared(ledger);
            let block = mine_pending_block(&ledger).await?;
            println!("{}", "✅ Transaction sealed".bright_green().bold());
            println!("Transaction: {}", id);
            println!("Block:       #{} {}", block.index, block.hash);
        }
        Commands::Balance { address } => {
            let history = ledger.address_history(&address);
            println!("Balance: {}", history.balance.to_string().bright_green().bold());
            for tx in &history.transactions {
                let direction = if tx.recipient == address { "IN ".green() } else { "OUT".red() };
                println!("  {} {:>10}  {}", direction, tx.amount, tx.message);
            }
        }
        Commands::Validate => match validate_chain(&ledger.chain) {
            Ok(()) => println!("{}", "✅ Chain is valid".bright_green()),
            Err(ChainError::ChainValidationFailure(problems)) => {
                println!("{}", "❌ Chain is invalid".red().bold());
                for problem in problems {
                    println!("  {} {}", "•".bright_yellow(), problem);
                }
            }
            Err(e) => return Err(e.into()),
        },
        Commands::Peers => {
            println!("This node: {}", ledger.current_node_url.bright_cyan());
            if ledger.network_nodes().is_empty() {
                println!("{}", "No peers configured.".yellow());
            }
            for peer in ledger.network_nodes() {
                println!("  {} {}", "•".bright_yellow(), peer);
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn status(ledger: &Blockchain) {
    let height = ledger.last_block().map_or(0, |b| b.index);
    let tip = ledger.last_block().map_or("-", |b| b.hash.as_str());
    println!("{}", "⛓️  Ledger status".bright_cyan().bold());
    println!("Height:        {}", height);
    println!("Tip hash:      {}", tip);
    println!("Genesis ready: {}", ledger.is_genesis_ready());
    let validity = if ledger.is_valid() { "valid".green() } else { "INVALID".red() };
    println!("Chain:         {}", validity);
}
