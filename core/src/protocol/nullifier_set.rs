use std::collections::HashSet;

use crate::note::Nullifier;

/// Spent-nullifier store owned by the ledger
pub trait NullifierSet {
    fn contains(&self, nullifier: &Nullifier) -> bool;

    /// Record a nullifier. Returns `false` if it was already present.
    fn insert(&mut self, nullifier: Nullifier) -> bool;
}

/// In-memory set for tests and local wiring
#[derive(Debug, Clone, Default)]
pub struct MemoryNullifierSet {
    spent: HashSet<Nullifier>,
}

impl MemoryNullifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}

impl NullifierSet for MemoryNullifierSet {
    fn contains(&self, nullifier: &Nullifier) -> bool {
        self.spent.contains(nullifier)
    }

    fn insert(&mut self, nullifier: Nullifier) -> bool {
        self.spent.insert(nullifier)
    }
}
