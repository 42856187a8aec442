//! Fee controller service entry point

use agent_shared::Agent;
use anyhow::{bail, Context, Result};
use clap::Parser;
use ethers::signers::{LocalWallet, Signer};
use fee_controller::{
    init_logging, FeeController, HttpPriceFeed, LoggingSink, PipelineDeps, RetryPolicy,
    RpcPoolStateReader,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use types::{Address, SystemClock};
use vigil_config::{load_config, resolve_config_path, ControllerConfig};

#[derive(Parser, Debug)]
#[command(name = "fee_controller")]
#[command(about = "Dynamic fee controller for hook-enabled AMM pools", version)]
struct Args {
    /// TOML configuration file (falls back to VIGIL_CONFIG_PATH)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn parse_signer(config: &ControllerConfig) -> Result<LocalWallet> {
    let key = config.signer.private_key.trim();
    if key.is_empty() {
        bail!(
            "signer.private_key is not set ({})",
            vigil_config::defaults::env::SIGNER_KEY_VAR
        );
    }
    key.trim_start_matches("0x")
        .parse::<LocalWallet>()
        .context("Invalid signer private key")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs)?;

    info!("🚀 Starting fee controller v{}", env!("CARGO_PKG_VERSION"));

    let config_path = resolve_config_path(args.config);
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        let mut printable = config.clone();
        if !printable.signer.private_key.is_empty() {
            printable.signer.private_key = "<redacted>".to_string();
        }
        println!("{}", toml::to_string_pretty(&printable)?);
        return Ok(());
    }

    let wallet = parse_signer(&config)?;
    info!(
        "🔑 Signing as {:?} for pool {}",
        wallet.address(),
        config.network.pool_id
    );

    let network = &config.network;
    let feed = HttpPriceFeed::new(network.price_feed_url.clone(), network.request_timeout())
        .context("Failed to build price feed client")?;
    let state_view: Address = network
        .state_view_address
        .parse()
        .context("Invalid state view address")?;
    let pool_reader = RpcPoolStateReader::new(
        &network.rpc_url,
        state_view,
        network.request_timeout(),
        RetryPolicy {
            attempts: network.rpc_retry_attempts,
            delay: network.rpc_retry_delay(),
        },
    )
    .context("Failed to build RPC pool reader")?;

    let deps = PipelineDeps {
        feed: Arc::new(feed),
        pool_reader: Arc::new(pool_reader),
        sink: Arc::new(LoggingSink),
        clock: Arc::new(SystemClock),
    };

    let mut controller = FeeController::new(&config, wallet, deps);
    controller
        .start()
        .await
        .context("Failed to start fee controller")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("🛑 Shutdown requested");

    controller.stop().await?;
    fee_controller::log_success!("Fee controller stopped cleanly");
    Ok(())
}
