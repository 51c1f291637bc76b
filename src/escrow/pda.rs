use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use super::ESCROW_PROGRAM_ID;
use crate::error::{ProvisionError, Result};

pub const MARGIN_SEED: &[u8] = b"margin";

/// Inputs to margin account derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginAccountSeeds {
    pub tswap: Pubkey,
    pub owner: Pubkey,
    pub margin_nr: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

impl MarginAccountSeeds {
    /// Validate textual inputs. `margin_nr` is stored on-chain as a u16.
    pub fn new(tswap: &str, owner: Pubkey, margin_nr: u64) -> Result<Self> {
        let tswap = Pubkey::from_str(tswap.trim())
            .map_err(|_| ProvisionError::InvalidSeeds(format!("tswap address '{}' is not a valid pubkey", tswap)))?;
        let margin_nr = u16::try_from(margin_nr).map_err(|_| {
            ProvisionError::InvalidSeeds(format!("margin number {} exceeds {}", margin_nr, u16::MAX))
        })?;

        Ok(Self { tswap, owner, margin_nr })
    }
}

/// Derive the margin account PDA: `["margin", tswap, owner, margin_nr (u16 LE)]`
pub fn find_margin_account_pda(seeds: &MarginAccountSeeds) -> Result<DerivedAddress> {
    let nr = seeds.margin_nr.to_le_bytes();
    Pubkey::try_find_program_address(
        &[MARGIN_SEED, seeds.tswap.as_ref(), seeds.owner.as_ref(), &nr],
        &ESCROW_PROGRAM_ID,
    )
    .map(|(address, bump)| DerivedAddress { address, bump })
    .ok_or_else(|| ProvisionError::InvalidSeeds("no viable bump seed for margin account".to_string()))
}
