//! Wallet and token account snapshots.

use serde::{Deserialize, Serialize};

/// Lamports per display unit.
pub const LAMPORTS_PER_UNIT: u64 = 1_000_000_000;

/// Snapshot of a chain account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    /// Base58 account address.
    pub address: String,
    /// Balance in lamports. Zero when the account does not exist.
    pub lamports: u64,
    /// Balance in display units.
    pub display_balance: f64,
    /// Whether the chain has ever seen this address. A syntactically valid
    /// but unused address yields `false`, not an error.
    pub exists: bool,
    /// Owning program, if the account exists.
    pub owner: Option<String>,
    /// Whether the account holds executable program code.
    pub executable: bool,
}

impl WalletInfo {
    /// Snapshot for an address unknown to the chain.
    pub fn absent(address: &str) -> Self {
        Self {
            address: address.to_string(),
            lamports: 0,
            display_balance: 0.0,
            exists: false,
            owner: None,
            executable: false,
        }
    }
}

/// An SPL-style token holding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAccount {
    /// Address of the token account itself.
    pub address: String,
    /// Wallet that owns the holding.
    pub owner: String,
    /// Token mint identifier.
    pub mint: String,
    /// Raw amount in the mint's smallest unit.
    pub amount: u64,
    /// Mint decimal places.
    pub decimals: u8,
    /// Display amount: `amount / 10^decimals`.
    pub display_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_wallet_is_zeroed() {
        let info = WalletInfo::absent("someaddress");
        assert!(!info.exists);
        assert_eq!(info.lamports, 0);
        assert_eq!(info.display_balance, 0.0);
        assert!(info.owner.is_none());
    }
}
