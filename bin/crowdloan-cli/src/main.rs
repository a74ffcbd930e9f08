//! Crowdloan reward reconciliation binary.
//!
//! Reads the crowdloan child trie of a parachain at its closure block, merges in
//! the contributions recorded off-chain by an aggregator, and writes the
//! contribution, reward and summary reports.

#![allow(missing_docs, rustdoc::missing_crate_level_docs)]

mod args;

use args::CrowdloanArgs;
use clap::Parser;
use crowdloan_rewards::{pipeline, CrowdloanConfig, RelayChainClient};
use eyre::WrapErr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run(args: CrowdloanArgs) -> eyre::Result<()> {
    let config = match &args.config {
        Some(path) => CrowdloanConfig::load(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => CrowdloanConfig::default(),
    };
    let config = args.apply(config);
    config.validate().wrap_err("invalid configuration")?;

    let client = RelayChainClient::connect(&config.endpoint)
        .await
        .wrap_err_with(|| format!("failed to connect to {}", config.endpoint))?;
    info!(endpoint = client.endpoint(), "connected to relay chain");

    let result = pipeline::run(&config, &client).await;
    drop(client);
    info!("disconnected from relay chain");

    let summary = result.wrap_err("crowdloan reconciliation failed")?;
    for path in &summary.artifacts {
        info!(path = %path.display(), "report ready");
    }
    Ok(())
}

fn main() {
    // Enable backtraces unless a RUST_BACKTRACE value has already been explicitly provided.
    if std::env::var_os("RUST_BACKTRACE").is_none() {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    init_tracing();
    let args = CrowdloanArgs::parse();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to start async runtime")
        .and_then(|runtime| runtime.block_on(run(args)));

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
