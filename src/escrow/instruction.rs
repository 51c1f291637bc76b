use borsh::BorshSerialize;
use solana_sdk::instruction::{AccountMeta, Instruction};

use super::{discriminator, pda::find_margin_account_pda, MarginAccountSeeds, ESCROW_PROGRAM_ID, SYSTEM_PROGRAM_ID};
use crate::error::{ProvisionError, Result};

pub const MARGIN_NAME_LEN: usize = 32;

#[derive(BorshSerialize)]
struct InitMarginAccountArgs {
    margin_nr: u16,
    name: [u8; MARGIN_NAME_LEN],
}

/// Encode a display name into the fixed 32-byte field, NUL padded
pub fn encode_margin_name(name: &str) -> Result<[u8; MARGIN_NAME_LEN]> {
    let bytes = name.as_bytes();
    if bytes.len() > MARGIN_NAME_LEN {
        return Err(ProvisionError::BuilderRejected(format!(
            "margin name is {} bytes, at most {} allowed",
            bytes.len(),
            MARGIN_NAME_LEN
        )));
    }
    let mut out = [0u8; MARGIN_NAME_LEN];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Build `init_margin_account`. The owner in `seeds` signs and pays rent.
pub fn init_margin_account(seeds: &MarginAccountSeeds, name: &str) -> Result<Instruction> {
    if seeds.owner == solana_sdk::pubkey::Pubkey::default() {
        return Err(ProvisionError::BuilderRejected("owner must not be the default pubkey".to_string()));
    }

    let margin_account = find_margin_account_pda(seeds)?.address;
    let args = InitMarginAccountArgs {
        margin_nr: seeds.margin_nr,
        name: encode_margin_name(name)?,
    };

    let mut data = discriminator("global", "init_margin_account").to_vec();
    args.serialize(&mut data)
        .map_err(|e| ProvisionError::BuilderRejected(format!("failed to encode arguments: {}", e)))?;

    Ok(Instruction {
        program_id: ESCROW_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(seeds.tswap, false),
            AccountMeta::new(margin_account, false),
            AccountMeta::new(seeds.owner, true),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data,
    })
}
