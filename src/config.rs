//! Configuration module for environment variables and application settings

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anchor_client::Cluster;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    signature::{Keypair, Signer},
};

use crate::error::{ProvisionError, Result};

/// tswap singleton used as the first margin seed when `TSWAP_ADDRESS` is unset
pub const DEFAULT_TSWAP_ADDRESS: &str = "4zdNGgAtFsW1cQgHqkiWyRsxaAgxrSRRynnuunxzjxue";

/// Upper bound for `CONFIRM_TIMEOUT_SECS`; blockhashes expire long before this
pub const MAX_CONFIRM_TIMEOUT_SECS: u64 = 3_600;

/// Accepted range for `CONFIRM_POLL_MS`
pub const CONFIRM_POLL_MS_RANGE: std::ops::RangeInclusive<u64> = 1..=60_000;

pub struct Config {
    /// Signing identity, also the margin account owner and fee payer
    pub signer: Keypair,

    /// RPC endpoint
    pub cluster: Cluster,

    pub commitment: CommitmentConfig,

    /// Margin seed inputs, validated when the seeds are built
    pub margin: MarginConfig,

    pub confirmation: ConfirmationConfig,
}

#[derive(Debug, Clone)]
pub struct MarginConfig {
    pub tswap_address: String,
    pub margin_nr: u64,
    pub name: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfirmationConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("signer", &self.signer.pubkey())
            .field("cluster", &self.cluster)
            .field("commitment", &self.commitment.commitment)
            .field("margin", &self.margin)
            .field("confirmation", &self.confirmation)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let private_key = var("PRIVATE_KEY").ok_or_else(|| {
            ProvisionError::Configuration("PRIVATE_KEY environment variable is required".to_string())
        })?;
        let signer = parse_keypair(&private_key)?;

        let rpc_url = var("RPC_URL").ok_or_else(|| {
            ProvisionError::Configuration("RPC_URL environment variable is required".to_string())
        })?;
        let cluster = Cluster::from_str(rpc_url.trim())
            .map_err(|e| ProvisionError::Configuration(format!("invalid RPC_URL '{}': {}", rpc_url, e)))?;

        let commitment = match var("COMMITMENT") {
            Some(level) => CommitmentLevel::from_str(level.trim())
                .map(|commitment| CommitmentConfig { commitment })
                .map_err(|_| ProvisionError::Configuration(format!("unknown COMMITMENT '{}'", level)))?,
            None => CommitmentConfig::confirmed(),
        };

        let defaults = ConfirmationConfig::default();

        Ok(Self {
            signer,
            cluster,
            commitment,
            margin: MarginConfig {
                tswap_address: var("TSWAP_ADDRESS").unwrap_or_else(|| DEFAULT_TSWAP_ADDRESS.to_string()),
                margin_nr: parse_or("MARGIN_NR", var("MARGIN_NR"), 0)?,
                name: var("MARGIN_NAME").unwrap_or_default(),
            },
            confirmation: ConfirmationConfig {
                timeout: var("CONFIRM_TIMEOUT_SECS")
                    .map(|v| parse_in_range("CONFIRM_TIMEOUT_SECS", &v, 1..=MAX_CONFIRM_TIMEOUT_SECS))
                    .transpose()?
                    .map_or(defaults.timeout, Duration::from_secs),
                poll_interval: var("CONFIRM_POLL_MS")
                    .map(|v| parse_in_range("CONFIRM_POLL_MS", &v, CONFIRM_POLL_MS_RANGE))
                    .transpose()?
                    .map_or(defaults.poll_interval, Duration::from_millis),
            },
        })
    }
}

/// Decode a base58 encoded 64-byte keypair
fn parse_keypair(encoded: &str) -> Result<Keypair> {
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|_| ProvisionError::Configuration("PRIVATE_KEY is not valid base58".to_string()))?;

    Keypair::try_from(&bytes[..])
        .map_err(|_| ProvisionError::Configuration("PRIVATE_KEY is not a valid keypair".to_string()))
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(v) => parse_number(key, &v),
        None => Ok(default),
    }
}

fn parse_in_range(key: &str, value: &str, range: std::ops::RangeInclusive<u64>) -> Result<u64> {
    let parsed: u64 = parse_number(key, value)?;
    if !range.contains(&parsed) {
        return Err(ProvisionError::Configuration(format!(
            "{} must be between {} and {}, got {}",
            key,
            range.start(),
            range.end(),
            parsed
        )));
    }
    Ok(parsed)
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ProvisionError::Configuration(format!("{} must be a non-negative integer, got '{}'", key, value)))
}
