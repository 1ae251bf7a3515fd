//! In-Memory Reaction Ledger
//!
//! Implements `ReactionLedger` with the SecretReactions contract rules:
//! encrypted per-key totals and per-user tallies, where the latest reactor
//! may read the new total and every reactor may read their own tally.

use super::vault::CiphertextVault;
use crate::algorithms::keccak256;
use crate::domain::{
    Address, Handle, ReactionKey, ReactionSyncError, TxHash, TxReceipt, TxStatus,
};
use crate::ports::outbound::ReactionLedger;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct LedgerState {
    totals: HashMap<ReactionKey, Handle>,
    tallies: HashMap<(ReactionKey, Address), Handle>,
    receipts: HashMap<TxHash, TxReceipt>,
    block_number: u64,
}

impl LedgerState {
    fn mine(&mut self, status: TxStatus) -> TxHash {
        self.block_number += 1;
        let mut seed = b"sr.ledger.tx".to_vec();
        seed.extend_from_slice(&self.block_number.to_be_bytes());
        let tx_hash = TxHash::new(keccak256(&seed));
        self.receipts.insert(
            tx_hash,
            TxReceipt {
                tx_hash,
                block_number: self.block_number,
                status,
            },
        );
        tx_hash
    }
}

/// In-memory SecretReactions deployment.
pub struct InMemoryReactionLedger {
    contract: Address,
    vault: Arc<CiphertextVault>,
    state: Mutex<LedgerState>,
    read_delay: Mutex<Duration>,
    confirm_delay: Mutex<Duration>,
    fail_reads: AtomicBool,
    fail_submissions: AtomicBool,
    revert_transactions: AtomicBool,
    reads: AtomicUsize,
    submitted: AtomicUsize,
}

impl InMemoryReactionLedger {
    /// Deploy at `contract` over `vault`.
    pub fn new(contract: Address, vault: Arc<CiphertextVault>) -> Self {
        Self {
            contract,
            vault,
            state: Mutex::new(LedgerState::default()),
            read_delay: Mutex::new(Duration::ZERO),
            confirm_delay: Mutex::new(Duration::ZERO),
            fail_reads: AtomicBool::new(false),
            fail_submissions: AtomicBool::new(false),
            revert_transactions: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            submitted: AtomicUsize::new(0),
        }
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.contract
    }

    /// Latency of every handle read.
    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock() = delay;
    }

    /// Latency of every confirmation.
    pub fn set_confirm_delay(&self, delay: Duration) {
        *self.confirm_delay.lock() = delay;
    }

    /// Make handle reads fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make transaction submission fail.
    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    /// Mine every accepted transaction as reverted, without state changes.
    pub fn revert_transactions(&self, revert: bool) {
        self.revert_transactions.store(revert, Ordering::SeqCst);
    }

    fn forced_revert(&self) -> Option<TxStatus> {
        self.revert_transactions
            .load(Ordering::SeqCst)
            .then(|| TxStatus::Reverted("execution reverted".to_string()))
    }

    /// Handle reads served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Transactions accepted so far.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Current total handle of `key`, without read accounting.
    pub fn total_of(&self, key: &ReactionKey) -> Handle {
        self.state
            .lock()
            .totals
            .get(key)
            .copied()
            .unwrap_or(Handle::ZERO)
    }

    fn check_contract(&self, contract: Address) -> Result<(), ReactionSyncError> {
        if contract != self.contract {
            return Err(ReactionSyncError::NetworkError(format!(
                "no contract code at {}",
                contract
            )));
        }
        Ok(())
    }

    async fn before_read(&self, contract: Address) -> Result<(), ReactionSyncError> {
        let delay = *self.read_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ReactionSyncError::NetworkError("read timed out".to_string()));
        }
        self.check_contract(contract)
    }

    fn before_submit(&self, contract: Address) -> Result<(), ReactionSyncError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(ReactionSyncError::NetworkError(
                "transaction submission rejected".to_string(),
            ));
        }
        self.check_contract(contract)?;
        self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn apply_reaction(
        &self,
        caller: Address,
        key: &ReactionKey,
        ciphertext: Handle,
        input_proof: &[u8],
    ) -> Result<(), ReactionSyncError> {
        let amount = self
            .vault
            .consume_input(ciphertext, input_proof, self.contract, caller)?;

        let mut state = self.state.lock();
        let total = state.totals.get(key).copied().unwrap_or(Handle::ZERO);
        let tally = state
            .tallies
            .get(&(*key, caller))
            .copied()
            .unwrap_or(Handle::ZERO);

        let new_total = self.vault.add(total, amount)?;
        let new_tally = self.vault.add(tally, amount)?;
        self.vault.allow(new_total, caller);
        self.vault.allow(new_tally, caller);

        state.totals.insert(*key, new_total);
        state.tallies.insert((*key, caller), new_tally);
        Ok(())
    }
}

#[async_trait]
impl ReactionLedger for InMemoryReactionLedger {
    async fn get_total(
        &self,
        contract: Address,
        key: &ReactionKey,
    ) -> Result<Handle, ReactionSyncError> {
        self.before_read(contract).await?;
        Ok(self.total_of(key))
    }

    async fn get_my_tally(
        &self,
        contract: Address,
        caller: Address,
        key: &ReactionKey,
    ) -> Result<Handle, ReactionSyncError> {
        self.before_read(contract).await?;
        Ok(self
            .state
            .lock()
            .tallies
            .get(&(*key, caller))
            .copied()
            .unwrap_or(Handle::ZERO))
    }

    async fn react(
        &self,
        contract: Address,
        caller: Address,
        key: &ReactionKey,
        ciphertext: Handle,
        input_proof: &[u8],
    ) -> Result<TxHash, ReactionSyncError> {
        self.before_submit(contract)?;

        let status = match self.forced_revert() {
            Some(reverted) => reverted,
            None => match self.apply_reaction(caller, key, ciphertext, input_proof) {
                Ok(()) => TxStatus::Success,
                Err(e) => TxStatus::Reverted(e.to_string()),
            },
        };
        let tx_hash = self.state.lock().mine(status);
        debug!("[sr-ledger] react from {} mined as {}", caller, tx_hash);
        Ok(tx_hash)
    }

    async fn request_total_access(
        &self,
        contract: Address,
        caller: Address,
        key: &ReactionKey,
    ) -> Result<TxHash, ReactionSyncError> {
        self.before_submit(contract)?;

        let mut state = self.state.lock();
        if let Some(reverted) = self.forced_revert() {
            return Ok(state.mine(reverted));
        }
        if let Some(total) = state.totals.get(key).copied() {
            self.vault.allow(total, caller);
        }
        let tx_hash = state.mine(TxStatus::Success);
        debug!("[sr-ledger] total access granted to {}", caller);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ReactionSyncError> {
        let delay = *self.confirm_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state
            .lock()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or(ReactionSyncError::TransactionNotFound(tx_hash))
    }
}
