//! R1CS circuits for the deposit, withdraw, convert and redeem relations
//!
//! Hashes are recomputed in-circuit with the same Poseidon parameters and
//! field order as `zktx_core::note`, so a native commitment and its circuit
//! counterpart are the same field element.

pub mod balance;
pub mod deposit;
pub mod gadgets;
pub mod merkle;
pub mod withdraw;

pub use balance::BalanceCircuit;
pub use deposit::DepositCircuit;
pub use withdraw::WithdrawCircuit;
