//! Typed JSON-RPC envelopes and method-specific response values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Incoming JSON-RPC 2.0 response: either `result` or `error`.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Protocol-level error object.
#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Slot context attached to most query responses.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcContext {
    pub slot: u64,
}

/// Wrapper for responses of the form `{context, value}`.
#[derive(Debug, Deserialize)]
pub struct WithContext<T> {
    pub context: RpcContext,
    pub value: T,
}

/// `getAccountInfo` value (absent account ⇒ `null` ⇒ `None` upstream).
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfoValue {
    pub lamports: u64,
    pub owner: String,
    pub executable: bool,
    #[serde(default, rename = "rentEpoch")]
    pub rent_epoch: u64,
}

/// One entry of a `getSignatureStatuses` value array.
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureStatusValue {
    pub slot: u64,
    /// Confirmation depth; `null` once the transaction is rooted.
    #[serde(default)]
    pub confirmations: Option<u64>,
    /// Error detail if the transaction failed on-chain.
    #[serde(default)]
    pub err: Option<Value>,
    /// "processed", "confirmed" or "finalized".
    #[serde(default, rename = "confirmationStatus")]
    pub confirmation_status: Option<String>,
}

/// `getLatestBlockhash` value.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockhashValue {
    pub blockhash: String,
    #[serde(rename = "lastValidBlockHeight")]
    pub last_valid_block_height: u64,
}

/// Token amount triple used by `getTokenSupply` and parsed token accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenAmountValue {
    /// Raw amount as a decimal string (may exceed u53).
    pub amount: String,
    pub decimals: u8,
    #[serde(default, rename = "uiAmount")]
    pub ui_amount: Option<f64>,
}

/// One keyed account from `getTokenAccountsByOwner` (jsonParsed encoding).
#[derive(Debug, Clone, Deserialize)]
pub struct KeyedTokenAccount {
    pub pubkey: String,
    pub account: ParsedTokenAccount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedTokenAccount {
    pub data: ParsedAccountData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedAccountData {
    pub parsed: ParsedTokenData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedTokenData {
    pub info: TokenAccountInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenAccountInfo {
    pub mint: String,
    pub owner: String,
    #[serde(rename = "tokenAmount")]
    pub token_amount: TokenAmountValue,
}

/// `getTransaction` response (json encoding).
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDetail {
    pub slot: u64,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    pub transaction: TransactionEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default, rename = "preBalances")]
    pub pre_balances: Vec<u64>,
    #[serde(default, rename = "postBalances")]
    pub post_balances: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEnvelope {
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionMessage {
    #[serde(rename = "accountKeys")]
    pub account_keys: Vec<String>,
}

/// `getVersion` response.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "solana-core")]
    pub solana_core: String,
}
