//! External transaction-signing boundary.
//!
//! The core never holds private keys. Transfers are described to an
//! external key-management service which returns a fully signed,
//! base64-encoded transaction ready for `sendTransaction`.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::SignerConfig;

/// A transfer to be signed by the external wallet boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub lamports: u64,
    pub memo: Option<String>,
    /// Recent blockhash anchoring the transaction.
    pub recent_blockhash: String,
}

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("signer unreachable: {0}")]
    Transport(String),

    #[error("signer rejected the transfer: {0}")]
    Rejected(String),
}

/// Produces signed transactions for transfer requests.
pub trait TransferSigner: Send + Sync + 'static {
    /// Sign a transfer, returning the base64-encoded signed transaction.
    fn sign_transfer(
        &self,
        request: TransferRequest,
    ) -> impl Future<Output = Result<String, SignerError>> + Send;
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signed_tx: String,
}

/// Signer backed by an HTTP key-management service.
#[derive(Debug, Clone)]
pub struct HttpSigner {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpSigner {
    pub fn new(config: &SignerConfig) -> Result<Self, SignerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SignerError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl TransferSigner for HttpSigner {
    fn sign_transfer(
        &self,
        request: TransferRequest,
    ) -> impl Future<Output = Result<String, SignerError>> + Send {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        async move {
            let response = http
                .post(format!("{}/sign/transfer", endpoint.trim_end_matches('/')))
                .json(&request)
                .send()
                .await
                .map_err(|e| SignerError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(SignerError::Rejected(format!("{}: {}", status, detail)));
            }

            let body: SignResponse = response
                .json()
                .await
                .map_err(|e| SignerError::Transport(e.to_string()))?;
            Ok(body.signed_tx)
        }
    }
}
