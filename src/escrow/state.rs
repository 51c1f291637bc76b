// --- On-chain account structs matching the escrow program ---
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Serialize, Serializer};
use solana_sdk::{account::Account, pubkey::Pubkey};

use super::{discriminator, instruction::MARGIN_NAME_LEN, ESCROW_PROGRAM_ID};
use crate::error::ProvisionError;

/// Margin account body, following the 8-byte discriminator.
/// Reserved bytes after `bump` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MarginAccount {
    pub owner: Pubkey,
    pub name: [u8; MARGIN_NAME_LEN],
    pub nr: u16,
    pub bump: [u8; 1],
}

impl MarginAccount {
    pub fn discriminator() -> [u8; 8] {
        discriminator("account", "MarginAccount")
    }

    /// Decode raw account data, checking the discriminator
    pub fn try_from_account_data(data: &[u8]) -> Result<Self, String> {
        if data.len() < 8 {
            return Err(format!("data is {} bytes, shorter than the discriminator", data.len()));
        }
        let (disc, mut body) = data.split_at(8);
        if disc != Self::discriminator() {
            return Err("discriminator mismatch".to_string());
        }
        Self::deserialize(&mut body).map_err(|e| format!("failed to decode margin account: {}", e))
    }

    /// Name with trailing NUL padding removed
    pub fn display_name(&self) -> String {
        let end = self.name.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// Snapshot of the margin account address, fetched fresh on every read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountState {
    #[serde(serialize_with = "serialize_pubkey")]
    pub address: Pubkey,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lamports: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<MarginAccountInfo>,
}

/// Reporting view of a decoded margin account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarginAccountInfo {
    #[serde(serialize_with = "serialize_pubkey")]
    pub owner: Pubkey,
    pub name: String,
    pub nr: u16,
    pub bump: u8,
}

impl From<&MarginAccount> for MarginAccountInfo {
    fn from(src: &MarginAccount) -> Self {
        MarginAccountInfo {
            owner: src.owner,
            name: src.display_name(),
            nr: src.nr,
            bump: src.bump[0],
        }
    }
}

impl AccountState {
    pub fn missing(address: Pubkey) -> Self {
        Self { address, exists: false, lamports: None, margin: None }
    }

    /// Build a snapshot from an RPC read. `None` means no account at `address`.
    pub fn from_account(address: Pubkey, account: Option<&Account>) -> Result<Self, ProvisionError> {
        let Some(account) = account else {
            return Ok(Self::missing(address));
        };

        let invalid = |reason: String| ProvisionError::InvalidAccountData {
            address: address.to_string(),
            reason,
        };

        if account.owner != ESCROW_PROGRAM_ID {
            return Err(invalid(format!("owned by {}, expected {}", account.owner, ESCROW_PROGRAM_ID)));
        }
        let margin = MarginAccount::try_from_account_data(&account.data).map_err(invalid)?;

        Ok(Self {
            address,
            exists: true,
            lamports: Some(account.lamports),
            margin: Some(MarginAccountInfo::from(&margin)),
        })
    }
}

pub(crate) fn serialize_pubkey<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

#[cfg(test)]
impl MarginAccount {
    /// Account data as the program writes it, including reserved padding
    pub(crate) fn to_account_data(&self) -> Vec<u8> {
        let mut data = Self::discriminator().to_vec();
        self.serialize(&mut data).expect("vec write");
        data.extend_from_slice(&[0u8; 64]);
        data
    }
}
