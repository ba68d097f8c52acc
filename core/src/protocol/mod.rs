//! Deposit, withdraw, convert and redeem state transitions
//!
//! Each protocol turns a request (plaintext notes) into public inputs and a
//! private witness, checks the injected spent set, and asks the oracle for a
//! proof. Appending commitments and recording nullifiers is left to the
//! ledger; see [`crate::pool::CommitmentPool`].

pub mod balance;
pub mod deposit;
pub mod nullifier_set;
pub mod withdraw;

pub use balance::{
    BalanceKind, BalanceRequest, BalanceTransaction, prove_balance, verify_balance,
};
pub use deposit::{DepositRequest, DepositTransaction, prove_deposit, verify_deposit};
pub use nullifier_set::{MemoryNullifierSet, NullifierSet};
pub use withdraw::{WithdrawRequest, WithdrawTransaction, prove_withdraw, verify_withdraw};
