use clap::{Parser, Subcommand};

use chain_payments::config::schema::{RetryConfig, RpcConfig};
use chain_payments::rpc::RpcClient;
use chain_payments::transaction::TransactionService;
use chain_payments::wallet::{validate_address, WalletService};

#[derive(Parser)]
#[command(name = "payments-cli")]
#[command(about = "Operator CLI for the blockchain payment core", long_about = None)]
struct Cli {
    /// JSON-RPC endpoint URL.
    #[arg(short, long, default_value = "http://127.0.0.1:8899")]
    endpoint: String,

    /// Commitment level for queries.
    #[arg(short, long, default_value = "confirmed")]
    commitment: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check endpoint health and node version
    Health,
    /// Show balance and account metadata for a wallet
    Wallet { address: String },
    /// List token holdings for a wallet
    Tokens {
        owner: String,
        #[arg(long)]
        mint: Option<String>,
    },
    /// Poll the status of a transaction signature
    Status { signature: String },
    /// Show the total supply of a token mint
    Supply { mint: String },
    /// Syntactically validate an address (no network call)
    Validate { address: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let rpc_config = RpcConfig {
        endpoint: cli.endpoint,
        commitment: cli.commitment,
        ..RpcConfig::default()
    };
    let rpc = RpcClient::new(&rpc_config, RetryConfig::default())?;

    match cli.command {
        Commands::Health => {
            let healthy = rpc.is_healthy().await;
            println!("healthy: {}", healthy);
            if healthy {
                let version = rpc.get_version().await?;
                println!("node version: {}", version.solana_core);
            }
        }
        Commands::Wallet { address } => {
            let wallet = WalletService::new(rpc);
            let info = wallet.get_wallet_info(&address).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Tokens { owner, mint } => {
            let wallet = WalletService::new(rpc);
            let accounts = wallet.get_token_accounts(&owner, mint.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&accounts)?);
        }
        Commands::Status { signature } => {
            let tx = TransactionService::new(rpc, Default::default());
            let status = tx.get_status(&signature).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Supply { mint } => {
            let supply = rpc.get_token_supply(&mint).await?;
            println!("raw amount: {}", supply.amount);
            println!("decimals:   {}", supply.decimals);
            if let Some(ui) = supply.ui_amount {
                println!("supply:     {}", ui);
            }
        }
        Commands::Validate { address } => {
            if validate_address(&address) {
                println!("valid (syntax only; existence requires a wallet lookup)");
            } else {
                println!("invalid");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
