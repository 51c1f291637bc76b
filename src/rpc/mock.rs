//! In-memory chain used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use solana_sdk::{
    account::Account,
    hash::Hash,
    instruction::InstructionError,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError},
};

use super::{ChainRpc, TransactionStatus};
use crate::error::{ProvisionError, Result};
use crate::escrow::{find_margin_account_pda, state::MarginAccount, MarginAccountSeeds, ESCROW_PROGRAM_ID};

const MARGIN_RENT: u64 = 1_559_040;

#[derive(Default)]
pub(crate) struct MockChain {
    accounts: Mutex<HashMap<Pubkey, Account>>,
    statuses: Mutex<HashMap<Signature, (TransactionStatus, usize)>>,
    get_account_calls: AtomicUsize,
    blockhash_calls: AtomicUsize,
    send_calls: AtomicUsize,
    status_polls: AtomicUsize,
    pub offline: AtomicBool,
    pub reject_sends: AtomicBool,
    /// Simulation fails before the transaction is forwarded
    pub preflight_revert: AtomicBool,
    pub never_confirm: AtomicBool,
    /// Another actor initializes the same margin account right before ours lands
    pub racer: AtomicBool,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_margin_account(&self, seeds: &MarginAccountSeeds, name: [u8; 32]) -> Pubkey {
        let derived = find_margin_account_pda(seeds).unwrap();
        let margin = MarginAccount {
            owner: seeds.owner,
            name,
            nr: seeds.margin_nr,
            bump: [derived.bump],
        };
        self.accounts.lock().unwrap().insert(
            derived.address,
            Account {
                lamports: MARGIN_RENT,
                data: margin.to_account_data(),
                owner: ESCROW_PROGRAM_ID,
                executable: false,
                rent_epoch: 0,
            },
        );
        derived.address
    }

    pub fn insert_raw_account(&self, address: Pubkey, account: Account) {
        self.accounts.lock().unwrap().insert(address, account);
    }

    pub fn set_status_after(&self, signature: Signature, status: TransactionStatus, pending_polls: usize) {
        self.statuses.lock().unwrap().insert(signature, (status, pending_polls));
    }

    pub fn network_calls(&self) -> usize {
        self.get_account_calls.load(Ordering::SeqCst)
            + self.blockhash_calls.load(Ordering::SeqCst)
            + self.send_calls.load(Ordering::SeqCst)
            + self.status_polls.load(Ordering::SeqCst)
    }

    pub fn get_account_calls(&self) -> usize {
        self.get_account_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProvisionError::NetworkUnavailable("connection refused".to_string()));
        }
        Ok(())
    }

    /// Execute an `init_margin_account` transaction against the account map
    fn execute(&self, transaction: &Transaction) -> TransactionStatus {
        let message = &transaction.message;
        let ix = &message.instructions[0];
        assert_eq!(message.account_keys[ix.program_id_index as usize], ESCROW_PROGRAM_ID);

        let key = |i: usize| message.account_keys[ix.accounts[i] as usize];
        let seeds = MarginAccountSeeds {
            tswap: key(0),
            owner: key(2),
            margin_nr: u16::from_le_bytes([ix.data[8], ix.data[9]]),
        };
        let mut name = [0u8; 32];
        name.copy_from_slice(&ix.data[10..42]);

        if self.racer.load(Ordering::SeqCst) {
            self.insert_margin_account(&seeds, [0u8; 32]);
        }

        if self.accounts.lock().unwrap().contains_key(&key(1)) {
            return Err(TransactionError::InstructionError(0, InstructionError::Custom(0)));
        }
        self.insert_margin_account(&seeds, name);
        Ok(())
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        // Give concurrent callers a chance to interleave
        tokio::task::yield_now().await;
        self.get_account_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        tokio::task::yield_now().await;
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(Hash::new_unique())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(ProvisionError::SubmissionFailed("node is behind".to_string()));
        }
        if self.preflight_revert.load(Ordering::SeqCst) {
            return Err(ProvisionError::ExecutionReverted(
                "Error processing Instruction 0: account already in use".to_string(),
            ));
        }
        transaction
            .verify()
            .map_err(|e| ProvisionError::SubmissionFailed(e.to_string()))?;

        let signature = transaction.signatures[0];
        let status = self.execute(transaction);
        if !self.never_confirm.load(Ordering::SeqCst) {
            self.set_status_after(signature, status, 1);
        }
        Ok(signature)
    }

    async fn signature_status(&self, signature: &Signature) -> Result<Option<TransactionStatus>> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        Ok(match statuses.get_mut(signature) {
            Some((_, pending)) if *pending > 0 => {
                *pending -= 1;
                None
            }
            Some((status, _)) => Some(status.clone()),
            None => None,
        })
    }
}
