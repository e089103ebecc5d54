//! Shared test harness: an in-process mock RPC node and a mock signer.
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use chain_payments::config::AppConfig;
use chain_payments::lifecycle::Shutdown;
use chain_payments::payments::{PaymentProcessor, SignerError, TransferRequest, TransferSigner};
use chain_payments::rpc::RpcClient;
use chain_payments::security::SecurityService;
use chain_payments::transaction::TransactionService;
use chain_payments::wallet::WalletService;

use arc_swap::ArcSwap;

// Well-formed base58 addresses (all decode to 32 bytes).
pub const BUYER: &str = "4Nd1mY5jkmsky6iSj3Pf9dHGTRWiDRZvkaab2gAK9CTW";
pub const SELLER: &str = "So11111111111111111111111111111111111111112";
pub const OTHER: &str = "Vote111111111111111111111111111111111111111";

#[derive(Clone)]
pub struct MockStatus {
    pub confirmation_status: String,
    pub err: Option<Value>,
}

/// Programmable in-memory ledger behind the mock JSON-RPC node.
#[derive(Default)]
pub struct MockLedger {
    balances: Mutex<HashMap<String, u64>>,
    statuses: Mutex<HashMap<String, MockStatus>>,
    submissions: AtomicU32,
    next_sig: AtomicU32,
    unhealthy: AtomicBool,
    /// Status a submission lands in ("confirmed" unless overridden).
    on_submit_status: Mutex<Option<String>>,
}

impl MockLedger {
    pub fn fund(&self, address: &str, lamports: u64) {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_string(), lamports);
    }

    pub fn balance(&self, address: &str) -> u64 {
        *self.balances.lock().unwrap().get(address).unwrap_or(&0)
    }

    pub fn submissions(&self) -> u32 {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    /// Make future submissions land in the given confirmation status.
    pub fn set_on_submit_status(&self, status: &str) {
        *self.on_submit_status.lock().unwrap() = Some(status.to_string());
    }

    /// Force the reported status of an existing signature.
    pub fn set_status(&self, signature: &str, confirmation_status: &str, err: Option<Value>) {
        self.statuses.lock().unwrap().insert(
            signature.to_string(),
            MockStatus {
                confirmation_status: confirmation_status.to_string(),
                err,
            },
        );
    }

    fn handle(&self, req: &Value) -> Value {
        let id = req["id"].clone();
        let method = req["method"].as_str().unwrap_or_default();
        let params = &req["params"];

        let result = match method {
            "getHealth" => {
                if self.unhealthy.load(Ordering::SeqCst) {
                    return error_response(id, -32005, "node is behind");
                }
                json!("ok")
            }
            "getVersion" => json!({"solana-core": "1.18.0"}),
            "getLatestBlockhash" => json!({
                "context": {"slot": 1},
                "value": {"blockhash": "GHtXQBsoZHVnNFa9YevAzFr17DJjgHXk3ycTKD5xD3Zi", "lastValidBlockHeight": 100}
            }),
            "getBalance" => {
                let address = params[0].as_str().unwrap_or_default();
                json!({"context": {"slot": 1}, "value": self.balance(address)})
            }
            "getAccountInfo" => {
                let address = params[0].as_str().unwrap_or_default();
                let value = self
                    .balances
                    .lock()
                    .unwrap()
                    .get(address)
                    .map(|lamports| {
                        json!({
                            "lamports": lamports,
                            "owner": "11111111111111111111111111111111",
                            "executable": false,
                            "rentEpoch": 361
                        })
                    })
                    .unwrap_or(Value::Null);
                json!({"context": {"slot": 1}, "value": value})
            }
            "sendTransaction" => {
                // The signed payload is opaque to the core; the mock signer
                // encodes the transfer as JSON so the ledger can apply it.
                let payload = params[0].as_str().unwrap_or_default();
                let transfer: Value = match serde_json::from_str(payload) {
                    Ok(v) => v,
                    Err(_) => return error_response(id, -32602, "invalid transaction payload"),
                };
                let from = transfer["from"].as_str().unwrap_or_default().to_string();
                let to = transfer["to"].as_str().unwrap_or_default().to_string();
                let lamports = transfer["lamports"].as_u64().unwrap_or(0);

                {
                    let mut balances = self.balances.lock().unwrap();
                    let available = *balances.get(&from).unwrap_or(&0);
                    if available < lamports {
                        return error_response(id, -32002, "insufficient funds for transfer");
                    }
                    balances.insert(from.clone(), available - lamports);
                    *balances.entry(to).or_insert(0) += lamports;
                }

                self.submissions.fetch_add(1, Ordering::SeqCst);
                let n = self.next_sig.fetch_add(1, Ordering::SeqCst);
                let signature = format!("MockSig{}", n);
                let status = self
                    .on_submit_status
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| "confirmed".to_string());
                self.set_status(&signature, &status, None);
                json!(signature)
            }
            "getSignatureStatuses" => {
                let statuses = self.statuses.lock().unwrap();
                let entries: Vec<Value> = params[0]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
                    .iter()
                    .map(|sig| {
                        match statuses.get(sig.as_str().unwrap_or_default()) {
                            None => Value::Null,
                            Some(status) => json!({
                                "slot": 1,
                                "confirmations": 1,
                                "err": status.err,
                                "confirmationStatus": status.confirmation_status,
                            }),
                        }
                    })
                    .collect();
                json!({"context": {"slot": 1}, "value": entries})
            }
            "getTokenAccountsByOwner" => {
                json!({"context": {"slot": 1}, "value": []})
            }
            "getTransaction" => Value::Null,
            _ => return error_response(id, -32601, "method not found"),
        };

        json!({"jsonrpc": "2.0", "id": id, "result": result})
    }
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}

async fn rpc_handler(State(ledger): State<Arc<MockLedger>>, Json(req): Json<Value>) -> Json<Value> {
    Json(ledger.handle(&req))
}

/// Start the mock node on an ephemeral port. Returns its URL and ledger.
pub async fn start_mock_node() -> (String, Arc<MockLedger>) {
    let ledger = Arc::new(MockLedger::default());
    let app = Router::new()
        .route("/", post(rpc_handler))
        .with_state(Arc::clone(&ledger));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), ledger)
}

/// Signer that encodes the transfer as JSON; the mock ledger decodes and
/// applies it on submission.
pub struct MockSigner;

impl TransferSigner for MockSigner {
    fn sign_transfer(
        &self,
        request: TransferRequest,
    ) -> impl Future<Output = Result<String, SignerError>> + Send {
        async move {
            serde_json::to_string(&request).map_err(|e| SignerError::Rejected(e.to_string()))
        }
    }
}

pub struct TestStack {
    pub processor: Arc<PaymentProcessor<MockSigner>>,
    pub security: Arc<SecurityService>,
    pub tx: TransactionService,
    pub wallet: WalletService,
    pub rpc: RpcClient,
    pub shutdown: Shutdown,
    pub ledger: Arc<MockLedger>,
}

/// Build the full component stack against a fresh mock node.
pub async fn start_stack(tune: impl FnOnce(&mut AppConfig)) -> TestStack {
    let (url, ledger) = start_mock_node().await;

    let mut config = AppConfig::default();
    config.rpc.endpoint = url;
    config.transaction.poll_interval_ms = 20;
    config.transaction.confirm_timeout_secs = 2;
    config.transaction.verify_timeout_secs = 1;
    config.retry.base_delay_ms = 10;
    // Generous default so only the fraud tests trip velocity on purpose.
    config.security.velocity_limit = 50;
    tune(&mut config);

    let rpc = RpcClient::new(&config.rpc, config.retry.clone()).unwrap();
    let config_handle = Arc::new(ArcSwap::from_pointee(config.clone()));

    let wallet = WalletService::new(rpc.clone());
    let tx = TransactionService::new(rpc.clone(), config.transaction.clone());
    let security = Arc::new(SecurityService::new(
        wallet.clone(),
        rpc.clone(),
        Arc::clone(&config_handle),
    ));
    let shutdown = Shutdown::new();
    let processor = Arc::new(PaymentProcessor::new(
        rpc.clone(),
        wallet.clone(),
        tx.clone(),
        Arc::clone(&security),
        Arc::new(MockSigner),
        config_handle,
        shutdown.sender(),
    ));

    TestStack {
        processor,
        security,
        tx,
        wallet,
        rpc,
        shutdown,
        ledger,
    }
}
