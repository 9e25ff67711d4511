// base-bridge: command line client for the Solana → Base bridge.
// Loads a local keypair, builds the relay payment + bridge message, signs, submits.

mod logger;

use std::path::PathBuf;
use std::time::Duration;

use base_bridge_sdk::{
    amount::{lamports_to_sol, parse_sol},
    BridgeError, BridgeFailure, BridgeOrchestrator, BridgeRequest, BridgeSigner, ContractCall, Network,
    NetworkProfile, RpcChainClient,
};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    signature::{read_keypair_file, Keypair, Signer},
};
use thiserror::Error;

// ── Config ──────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Bridge SOL and contract calls from Solana to Base")]
struct Cli {
    /// Network profile (devnet or mainnet).
    #[arg(long, env = "SOLANA_NETWORK", default_value = "devnet")]
    network: Network,

    /// Override the profile's Solana RPC URL.
    #[arg(long, env = "SOLANA_RPC_URL")]
    rpc_url: Option<String>,

    /// Path to a Solana keypair JSON file.
    #[arg(long, env = "KEYPAIR_PATH", default_value = "keypair.json")]
    keypair: PathBuf,

    /// Gas limit paid for on Base (defaults to the profile's).
    #[arg(long, env = "GAS_LIMIT")]
    gas_limit: Option<u64>,

    /// Give up on a request after this many seconds.
    #[arg(long, env = "BRIDGE_TIMEOUT_SECS", default_value_t = 90)]
    timeout_secs: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bridge SOL to an address on Base.
    Bridge {
        /// Amount in SOL, e.g. 0.1
        #[arg(long)]
        amount: String,
        /// Destination 0x address on Base.
        #[arg(long)]
        to: String,
    },
    /// Invoke a contract on Base through the bridge.
    Call {
        /// Target contract 0x address.
        #[arg(long)]
        target: String,
        /// ABI-encoded call data, hex.
        #[arg(long)]
        data: String,
        /// ETH value attached to the call.
        #[arg(long, default_value = "0")]
        value: String,
        /// SOL bridged alongside the call.
        #[arg(long, default_value = "0")]
        amount: String,
    },
    /// Print the keypair's SOL balance.
    Balance,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Failed to read keypair from {path}: {reason}")]
    Keypair { path: String, reason: String },
    #[error("Logger setup failed: {0}")]
    Logger(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Failed(#[from] BridgeFailure),
}

impl Cli {
    fn profile(&self) -> NetworkProfile {
        let mut profile = NetworkProfile::for_network(self.network);
        if let Some(url) = &self.rpc_url {
            profile = profile.with_rpc_endpoint(url.clone());
        }
        if let Some(gas_limit) = self.gas_limit {
            profile = profile.with_gas_limit(gas_limit);
        }
        profile
    }

    fn load_keypair(&self) -> Result<Keypair, CliError> {
        read_keypair_file(&self.keypair).map_err(|e| CliError::Keypair {
            path: self.keypair.display().to_string(),
            reason: e.to_string(),
        })
    }
}

// ── Commands ────────────────────────────────────────────────────────────────

async fn run(cli: Cli) -> Result<(), CliError> {
    let profile = cli.profile();
    let keypair = cli.load_keypair()?;
    let client = RpcChainClient::new(profile.rpc_endpoint.clone(), CommitmentConfig::confirmed());
    let orchestrator = BridgeOrchestrator::new(client, profile);

    log::info!("Network:   {}", orchestrator.profile().network);
    log::info!("RPC:       {}", orchestrator.client().url());
    log::info!("Bridge:    {}", orchestrator.profile().bridge_program_id);
    log::info!("Relayer:   {}", orchestrator.profile().relayer_program_id);
    log::info!("Signer:    {}", keypair.pubkey());

    let request = match &cli.command {
        Command::Balance => {
            let lamports = orchestrator.balance(&keypair.pubkey()).await?;
            println!("{} SOL ({} lamports)", lamports_to_sol(lamports), lamports);
            return Ok(());
        }
        Command::Bridge { amount, to } => BridgeRequest::transfer(parse_sol(amount)?, to.parse()?),
        Command::Call {
            target,
            data,
            value,
            amount,
        } => BridgeRequest::contract_call(ContractCall::from_hex(target, data, value)?)
            .with_amount(parse_sol(amount)?),
    };

    let signer = BridgeSigner::Local(keypair);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(cli.timeout_secs);
    let receipt = orchestrator.execute(&request, &signer, Some(deadline)).await?;

    println!("Signature: {}", receipt.signature);
    println!("Explorer:  {}", receipt.explorer_url);
    Ok(())
}

// ── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::setup_logger(cli.log_level).map_err(CliError::Logger) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
