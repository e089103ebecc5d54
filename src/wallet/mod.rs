//! Wallet service: address validation, balances, token holdings.
//!
//! Built only on the RPC client; network errors surface to the caller and
//! a balance is never guessed.

pub mod service;
pub mod types;

pub use service::{validate_address, WalletService};
pub use types::{TokenAccount, WalletInfo, LAMPORTS_PER_UNIT};
