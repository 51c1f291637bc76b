//! # Margin Provisioner
//!
//! Client tool that makes sure a Tensor escrow margin account exists for the
//! configured wallet, creating it when missing, and prints its state.
//!
//! ## Features
//! - Deterministic margin account PDA derivation
//! - Existence check before any mutating action
//! - Single `init_margin_account` transaction with bounded confirmation wait
//! - Structured logging with tracing (stderr), JSON report (stdout)
//!
//! ## Architecture
//! - `config`: Environment variable configuration management
//! - `escrow`: PDA derivation, instruction building and account decoding
//! - `rpc`: Chain access trait, Solana RPC implementation, confirmation polling
//! - `services`: The provisioning workflow
//!
//! ## Environment Setup
//! Copy `.env.example` to `.env` and configure:
//! ```bash
//! cp .env.example .env
//! # Set PRIVATE_KEY and RPC_URL
//! ```
//!
//! ## Running
//! ```bash
//! cargo run
//! ```

mod config;
mod error;
mod escrow;
mod rpc;
mod services;

use anyhow::Context;
use solana_sdk::signature::Signer;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt, EnvFilter };

use crate::config::Config;
use crate::escrow::MarginAccountSeeds;
use crate::rpc::SolanaRpc;
use crate::services::{ProvisionSettings, Provisioner};

/// Application entry point.
///
/// Loads configuration, runs one provisioning pass and prints the report.
/// Any error that aborts the workflow makes the process exit non-zero.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout only carries the JSON report
    tracing_subscriber
        ::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt
                ::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
        )
        .init();

    tracing::info!("🏁 Starting margin provisioner...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let seeds = MarginAccountSeeds::new(
        &config.margin.tswap_address,
        config.signer.pubkey(),
        config.margin.margin_nr,
    )?;

    let rpc = SolanaRpc::new(config.cluster.url(), config.commitment);
    tracing::info!("🌐 RPC endpoint: {} ({:?})", rpc.url(), config.commitment.commitment);
    tracing::info!("👛 Owner: {}", config.signer.pubkey());

    let provisioner = Provisioner::new(rpc, ProvisionSettings {
        margin_name: config.margin.name.clone(),
        confirmation: config.confirmation,
    });

    let report = provisioner
        .ensure_provisioned(&seeds, &config.signer)
        .await
        .context("Margin account provisioning failed")?;

    if let Some(confirmation) = &report.confirmation {
        println!("{}", serde_json::to_string_pretty(confirmation)?);
    }
    if let Some(reason) = report.advisory() {
        tracing::error!("transaction failed with error: {}", reason);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
