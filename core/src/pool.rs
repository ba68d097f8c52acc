//! Commitment pool
//!
//! One lock guards the tree, the append log, the recent roots, the spent set
//! and the record of accepted deposits. Witnesses are never advanced in
//! place: they are replayed from the append log on request, so a witness
//! cannot drift from the tree.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::merkle::{IncrementalTree, IncrementalWitness};
use crate::note::{Commitment, NoteHeader, Nullifier, U256};
use crate::oracle::{ProofOracle, VerificationKey};
use crate::protocol::{
    BalanceTransaction, DepositTransaction, MemoryNullifierSet, NullifierSet, WithdrawTransaction,
    verify_balance, verify_deposit, verify_withdraw,
};

/// Default number of recent roots a withdraw may prove against
pub const ROOT_HISTORY_SIZE: usize = 100;

/// Bounded FIFO of recent roots
#[derive(Debug, Clone)]
pub struct RootHistory {
    roots: VecDeque<[u8; 32]>,
    capacity: usize,
}

impl RootHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            roots: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, root: [u8; 32]) {
        if self.roots.len() == self.capacity {
            self.roots.pop_front();
        }
        self.roots.push_back(root);
    }

    pub fn contains(&self, root: &[u8; 32]) -> bool {
        self.roots.contains(root)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

struct PoolState<N> {
    tree: IncrementalTree,
    leaves: Vec<Commitment>,
    roots: RootHistory,
    spent: N,
    /// Old-note nullifiers of accepted deposits, not yet spent
    deposits: HashSet<Nullifier>,
}

impl<N: NullifierSet> PoolState<N> {
    fn append(&mut self, leaf: Commitment) -> Result<u64> {
        let position = self.tree.append(leaf)?;
        self.leaves.push(leaf);
        self.roots.push(self.tree.root());
        Ok(position)
    }
}

/// Ledger-side view of the shielded pool
pub struct CommitmentPool<N: NullifierSet = MemoryNullifierSet> {
    state: Mutex<PoolState<N>>,
}

impl CommitmentPool<MemoryNullifierSet> {
    pub fn new(depth: usize, root_history_size: usize) -> Result<Self> {
        Self::with_nullifier_set(depth, root_history_size, MemoryNullifierSet::new())
    }
}

impl<N: NullifierSet> CommitmentPool<N> {
    pub fn with_nullifier_set(depth: usize, root_history_size: usize, spent: N) -> Result<Self> {
        let tree = IncrementalTree::with_depth(depth)?;
        let mut roots = RootHistory::new(root_history_size);
        roots.push(tree.root());

        Ok(Self {
            state: Mutex::new(PoolState {
                tree,
                leaves: Vec::new(),
                roots,
                spent,
                deposits: HashSet::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<N>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append one commitment, returning its position
    pub fn append(&self, leaf: Commitment) -> Result<u64> {
        self.lock().append(leaf)
    }

    /// Append in order. Stops at the first failure; earlier leaves stay.
    pub fn append_all(&self, leaves: &[Commitment]) -> Result<Vec<u64>> {
        let mut state = self.lock();
        leaves.iter().map(|leaf| state.append(*leaf)).collect()
    }

    pub fn root(&self) -> [u8; 32] {
        self.lock().tree.root()
    }

    pub fn size(&self) -> u64 {
        self.lock().tree.size()
    }

    pub fn depth(&self) -> usize {
        self.lock().tree.depth()
    }

    pub fn is_known_root(&self, root: &[u8; 32]) -> bool {
        self.lock().roots.contains(root)
    }

    pub fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.lock().spent.contains(nullifier)
    }

    /// First position holding `leaf`
    pub fn position_of(&self, leaf: &Commitment) -> Option<u64> {
        self.lock()
            .leaves
            .iter()
            .position(|candidate| candidate == leaf)
            .map(|index| index as u64)
    }

    /// Witness for `position`, replayed from the append log up to the
    /// current size
    pub fn witness(&self, position: u64) -> Result<IncrementalWitness> {
        let state = self.lock();
        let size = state.tree.size();
        if position >= size {
            return Err(Error::UnknownPosition { position, size });
        }

        let split = position as usize;
        let prefix = IncrementalTree::from_leaves(state.tree.depth(), &state.leaves[..split])?;
        let mut witness = prefix.witness();
        for leaf in &state.leaves[split..] {
            witness.append(*leaf)?;
        }
        debug!("Replayed witness for position {position} over {} leaves", size - position);
        Ok(witness)
    }

    /// Header over the current root
    pub fn header(&self, prev_ref: U256, next_ref: U256) -> NoteHeader {
        NoteHeader::new(prev_ref, next_ref, self.root())
    }

    /// Verify a deposit and append its shielding commitment
    ///
    /// At most one deposit is accepted per old note: its nullifier is held
    /// back until the matching withdraw spends it.
    pub fn accept_deposit(
        &self,
        oracle: &dyn ProofOracle,
        vk: &VerificationKey,
        transaction: &DepositTransaction,
    ) -> Result<u64> {
        if !verify_deposit(oracle, vk, transaction) {
            warn!("Deposit rejected: proof does not verify");
            return Err(Error::VerificationFailed);
        }

        let mut state = self.lock();
        let nullifier = transaction.nullifier();
        if state.spent.contains(&nullifier) {
            warn!("Deposit rejected: nullifier {nullifier} already spent");
            return Err(Error::NullifierSpent(nullifier));
        }
        if state.deposits.contains(&nullifier) {
            warn!("Deposit rejected: nullifier {nullifier} already deposited");
            return Err(Error::DuplicateDeposit(nullifier));
        }
        let position = state.append(transaction.public_inputs.shielding_commitment)?;
        state.deposits.insert(nullifier);
        info!("Accepted deposit at position {position}");
        Ok(position)
    }

    pub fn is_deposited(&self, nullifier: &Nullifier) -> bool {
        self.lock().deposits.contains(nullifier)
    }

    /// Verify a withdraw against `header` and record its nullifier
    pub fn accept_withdraw(
        &self,
        oracle: &dyn ProofOracle,
        vk: &VerificationKey,
        transaction: &WithdrawTransaction,
        header: &NoteHeader,
    ) -> Result<()> {
        let mut expected = transaction.public_inputs.clone();
        expected.header_commitment = header.commitment();
        if !verify_withdraw(oracle, vk, &expected, &transaction.proof) {
            warn!("Withdraw rejected: proof does not verify against header");
            return Err(Error::VerificationFailed);
        }

        let mut state = self.lock();
        if !state.roots.contains(&header.root) {
            warn!("Withdraw rejected: root is not recent");
            return Err(Error::UnknownRoot);
        }
        let nullifier = transaction.nullifier();
        if !state.spent.insert(nullifier) {
            warn!("Withdraw rejected: nullifier {nullifier} already spent");
            return Err(Error::NullifierSpent(nullifier));
        }
        state.deposits.remove(&nullifier);
        info!("Accepted withdraw, nullifier {nullifier}");
        Ok(())
    }

    /// Verify a convert or redeem and record its nullifier
    ///
    /// A note with a deposit still waiting on its withdraw is refused.
    pub fn accept_balance(
        &self,
        oracle: &dyn ProofOracle,
        vk: &VerificationKey,
        transaction: &BalanceTransaction,
    ) -> Result<()> {
        let relation = transaction.relation();
        if !verify_balance(oracle, vk, transaction) {
            warn!("{relation} rejected: proof does not verify");
            return Err(Error::VerificationFailed);
        }

        let mut state = self.lock();
        let nullifier = transaction.nullifier();
        if state.deposits.contains(&nullifier) {
            warn!("{relation} rejected: nullifier {nullifier} has a pending deposit");
            return Err(Error::DuplicateDeposit(nullifier));
        }
        if !state.spent.insert(nullifier) {
            warn!("{relation} rejected: nullifier {nullifier} already spent");
            return Err(Error::NullifierSpent(nullifier));
        }
        info!("Accepted {relation} of {} units", transaction.public_inputs.value);
        Ok(())
    }
}
