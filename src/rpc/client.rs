//! Pooled JSON-RPC client with timeout and error normalization.
//!
//! # Responsibilities
//! - One network round trip per `call`, with connect and total timeouts
//! - Strictly increasing request ids for log correlation
//! - Bounded concurrency: pooled connections plus an in-flight cap
//! - Retry with jittered backoff for idempotent read methods only

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::config::schema::{RetryConfig, RpcConfig};
use crate::observability::metrics;
use crate::resilience::retry_delay;
use crate::rpc::error::{RpcError, RpcResult};
use crate::rpc::types::{
    AccountInfoValue, BlockhashValue, KeyedTokenAccount, RpcRequest, RpcResponse,
    SignatureStatusValue, TokenAmountValue, TransactionDetail, VersionInfo, WithContext,
};

/// JSON-RPC 2.0 client over pooled HTTPS.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: url::Url,
    commitment: String,
    retry: RetryConfig,
    request_timeout_secs: u64,
    next_id: Arc<AtomicU64>,
    /// Caps concurrent in-flight requests across all components.
    permits: Arc<Semaphore>,
}

impl RpcClient {
    /// Create a new client with an explicit lifecycle.
    ///
    /// The client owns the connection pool; every component that talks to
    /// the chain receives a clone of this instance rather than a global
    /// session.
    pub fn new(rpc: &RpcConfig, retry: RetryConfig) -> RpcResult<Self> {
        let endpoint: url::Url = rpc
            .endpoint
            .parse()
            .map_err(|e| RpcError::Endpoint(format!("{}: {}", rpc.endpoint, e)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(rpc.connect_timeout_secs))
            .timeout(Duration::from_secs(rpc.request_timeout_secs))
            .pool_max_idle_per_host(rpc.max_idle_per_host)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        tracing::info!(
            endpoint = %endpoint,
            network = %rpc.network,
            commitment = %rpc.commitment,
            "RPC client initialized"
        );

        Ok(Self {
            http,
            endpoint,
            commitment: rpc.commitment.clone(),
            retry,
            request_timeout_secs: rpc.request_timeout_secs,
            next_id: Arc::new(AtomicU64::new(1)),
            permits: Arc::new(Semaphore::new(rpc.max_concurrent_requests)),
        })
    }

    /// Default commitment level used for queries.
    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    /// One JSON-RPC round trip. No retry; safe for non-idempotent methods.
    pub async fn call(&self, method: &str, params: Value) -> RpcResult<Value> {
        // Closed only on drop, so acquire cannot fail while self is alive.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| RpcError::Transport("client closed".to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);

        let response = match self.http.post(self.endpoint.clone()).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                metrics::record_rpc_call(method, false);
                return Err(normalize_reqwest(e, self.request_timeout_secs));
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics::record_rpc_call(method, false);
            return Err(RpcError::Http(status.as_u16()));
        }

        let body: RpcResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                metrics::record_rpc_call(method, false);
                return Err(RpcError::Decode(e.to_string()));
            }
        };

        if let Some(err) = body.error {
            metrics::record_rpc_call(method, false);
            tracing::debug!(id, method, code = err.code, "RPC protocol error");
            return Err(RpcError::Protocol {
                code: err.code,
                message: err.message,
            });
        }

        metrics::record_rpc_call(method, true);
        // `result: null` is a legitimate reply (getTransaction for an
        // unknown signature); only an `error` object is a failure.
        Ok(body.result.unwrap_or(Value::Null))
    }

    /// Round trip with retry for idempotent read methods.
    async fn call_read(&self, method: &str, params: Value) -> RpcResult<Value> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.call(method, params.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    metrics::record_rpc_retry(method);
                    let delay =
                        retry_delay(attempt, self.retry.base_delay_ms, self.retry.max_delay_ms);
                    tracing::warn!(
                        method,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying read call"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(value: Value) -> RpcResult<T> {
        serde_json::from_value(value).map_err(|e| RpcError::Decode(e.to_string()))
    }

    /// Balance of an address in lamports. Unknown addresses report 0.
    pub async fn get_balance(&self, address: &str) -> RpcResult<u64> {
        let params = json!([address, {"commitment": self.commitment}]);
        let value = self.call_read("getBalance", params).await?;
        let wrapped: WithContext<u64> = Self::decode(value)?;
        Ok(wrapped.value)
    }

    /// Account metadata, or `None` if the chain has never seen the address.
    pub async fn get_account_info(&self, address: &str) -> RpcResult<Option<AccountInfoValue>> {
        let params = json!([address, {"commitment": self.commitment, "encoding": "base64"}]);
        let value = self.call_read("getAccountInfo", params).await?;
        let wrapped: WithContext<Option<AccountInfoValue>> = Self::decode(value)?;
        Ok(wrapped.value)
    }

    /// Submit a signed transaction. Never retried here: resubmission after
    /// a perceived timeout can duplicate the on-chain effect.
    pub async fn send_transaction(&self, signed_tx_base64: &str) -> RpcResult<String> {
        let params = json!([signed_tx_base64, {"encoding": "base64"}]);
        let value = self.call("sendTransaction", params).await?;
        Self::decode(value)
    }

    /// Lifecycle status for each signature; `None` entries are unknown to
    /// the node.
    pub async fn get_signature_statuses(
        &self,
        signatures: &[&str],
    ) -> RpcResult<Vec<Option<SignatureStatusValue>>> {
        let params = json!([signatures, {"searchTransactionHistory": true}]);
        let value = self.call_read("getSignatureStatuses", params).await?;
        let wrapped: WithContext<Vec<Option<SignatureStatusValue>>> = Self::decode(value)?;
        Ok(wrapped.value)
    }

    /// Full transaction detail, or `None` if not found.
    pub async fn get_transaction(&self, signature: &str) -> RpcResult<Option<TransactionDetail>> {
        let params = json!([signature, {"encoding": "json", "commitment": self.commitment}]);
        let value = self.call_read("getTransaction", params).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(Self::decode(value)?))
    }

    /// Token accounts held by `owner`, optionally filtered to one mint.
    pub async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        mint: Option<&str>,
    ) -> RpcResult<Vec<KeyedTokenAccount>> {
        const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
        let filter = match mint {
            Some(mint) => json!({"mint": mint}),
            None => json!({"programId": TOKEN_PROGRAM_ID}),
        };
        let params = json!([owner, filter, {"encoding": "jsonParsed", "commitment": self.commitment}]);
        let value = self.call_read("getTokenAccountsByOwner", params).await?;
        let wrapped: WithContext<Vec<KeyedTokenAccount>> = Self::decode(value)?;
        Ok(wrapped.value)
    }

    /// Total supply of a token mint.
    pub async fn get_token_supply(&self, mint: &str) -> RpcResult<TokenAmountValue> {
        let params = json!([mint, {"commitment": self.commitment}]);
        let value = self.call_read("getTokenSupply", params).await?;
        let wrapped: WithContext<TokenAmountValue> = Self::decode(value)?;
        Ok(wrapped.value)
    }

    /// Recent blockhash for transaction construction.
    pub async fn get_latest_blockhash(&self) -> RpcResult<BlockhashValue> {
        let params = json!([{"commitment": self.commitment}]);
        let value = self.call_read("getLatestBlockhash", params).await?;
        let wrapped: WithContext<BlockhashValue> = Self::decode(value)?;
        Ok(wrapped.value)
    }

    /// Node software version.
    pub async fn get_version(&self) -> RpcResult<VersionInfo> {
        let value = self.call_read("getVersion", json!([])).await?;
        Self::decode(value)
    }

    /// Whether the endpoint reports itself healthy.
    pub async fn is_healthy(&self) -> bool {
        let healthy = matches!(
            self.call("getHealth", json!([])).await,
            Ok(Value::String(s)) if s == "ok"
        );
        metrics::record_endpoint_health(healthy);
        healthy
    }
}

fn normalize_reqwest(e: reqwest::Error, timeout_secs: u64) -> RpcError {
    if e.is_timeout() {
        RpcError::Timeout(timeout_secs)
    } else {
        RpcError::Transport(e.to_string())
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("commitment", &self.commitment)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
