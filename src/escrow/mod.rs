//! # Escrow Program Module
//!
//! Client-side bindings for the Tensor escrow (tswap) program, limited to what
//! margin account provisioning needs.
//!
//! ## Features
//! - Margin account PDA derivation
//! - `init_margin_account` instruction building
//! - Margin account decoding for reporting

use solana_sdk::{hash::hash, pubkey::Pubkey};

/// Seed derivation for margin accounts
pub mod pda;

/// Instruction builders
pub mod instruction;

/// On-chain account layouts
pub mod state;

pub use instruction::init_margin_account;
pub use pda::{find_margin_account_pda, MarginAccountSeeds};
pub use state::AccountState;

/// Escrow program id
pub const ESCROW_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("TSWAPaqyCSx2KABk68Shruf4rp7CxcNi8hAsbdwmHbN");

/// System program, rent payer for `init`
pub const SYSTEM_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("11111111111111111111111111111111");

/// Anchor discriminator: first 8 bytes of `sha256("<namespace>:<name>")`
pub(crate) fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = hash(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.to_bytes()[..8]);
    out
}
