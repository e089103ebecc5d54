//! Wallet lookups over the RPC client.

use crate::rpc::{RpcClient, RpcResult};
use crate::wallet::types::{TokenAccount, WalletInfo, LAMPORTS_PER_UNIT};

/// Syntactic address check: base58 charset, 32-44 characters, decoding to
/// exactly 32 bytes. No network call.
///
/// A `true` result is a precondition, not a guarantee, that the account
/// exists on-chain.
pub fn validate_address(address: &str) -> bool {
    if !(32..=44).contains(&address.len()) {
        return false;
    }
    match bs58::decode(address).into_vec() {
        Ok(bytes) => bytes.len() == 32,
        Err(_) => false,
    }
}

/// Read-only wallet queries.
#[derive(Debug, Clone)]
pub struct WalletService {
    rpc: RpcClient,
}

impl WalletService {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    /// Resolve balance and account metadata.
    ///
    /// An address the chain has never seen returns `exists=false` with a
    /// zero balance; only transport/protocol failures are errors.
    pub async fn get_wallet_info(&self, address: &str) -> RpcResult<WalletInfo> {
        let account = self.rpc.get_account_info(address).await?;

        Ok(match account {
            Some(account) => WalletInfo {
                address: address.to_string(),
                lamports: account.lamports,
                display_balance: account.lamports as f64 / LAMPORTS_PER_UNIT as f64,
                exists: true,
                owner: Some(account.owner),
                executable: account.executable,
            },
            None => WalletInfo::absent(address),
        })
    }

    /// Enumerate token holdings, optionally filtered by mint.
    ///
    /// Zero-balance accounts are included; filtering is the caller's call.
    pub async fn get_token_accounts(
        &self,
        owner: &str,
        mint: Option<&str>,
    ) -> RpcResult<Vec<TokenAccount>> {
        let keyed = self.rpc.get_token_accounts_by_owner(owner, mint).await?;

        let accounts = keyed
            .into_iter()
            .map(|entry| {
                let info = entry.account.data.parsed.info;
                let amount: u64 = info.token_amount.amount.parse().unwrap_or(0);
                let decimals = info.token_amount.decimals;
                let display_amount = info
                    .token_amount
                    .ui_amount
                    .unwrap_or(amount as f64 / 10f64.powi(decimals as i32));
                TokenAccount {
                    address: entry.pubkey,
                    owner: info.owner,
                    mint: info.mint,
                    amount,
                    decimals,
                    display_amount,
                }
            })
            .collect();

        Ok(accounts)
    }
}
