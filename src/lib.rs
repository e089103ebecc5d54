//! Marketplace Blockchain Payment Core

pub mod config;
pub mod rpc;
pub mod wallet;
pub mod transaction;
pub mod payments;
pub mod security;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::AppConfig;
pub use lifecycle::Shutdown;
pub use payments::PaymentProcessor;
pub use rpc::RpcClient;
