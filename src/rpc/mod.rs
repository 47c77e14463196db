//! Node and wallet RPC services.
//!
//! The launch flow talks to a full node (to push the bundle and watch coins)
//! and, optionally, to a funded wallet that feeds the new wallet. Both sit
//! behind traits so the polling logic can run against in-memory fakes.

mod http;
mod types;

use async_trait::async_trait;
use chia::protocol::{Bytes32, SpendBundle};

use crate::error::DriverResult;

pub use http::{ChiaTls, FullNodeClient, WalletClient};
pub use types::{CoinRecord, LogInResponse, PushTxResponse, TransactionRecord, WalletBalance};

/// Full node RPC endpoints used by the launch.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    async fn push_tx(&self, spend_bundle: &SpendBundle) -> DriverResult<PushTxResponse>;

    async fn get_coin_records_by_puzzle_hash(
        &self,
        puzzle_hash: Bytes32,
        include_spent_coins: bool,
    ) -> DriverResult<Vec<CoinRecord>>;
}

/// Wallet RPC endpoints used to feed the new wallet.
#[async_trait]
pub trait WalletRpc: Send + Sync {
    async fn log_in(&self, fingerprint: u32) -> DriverResult<LogInResponse>;

    async fn get_wallet_balance(&self, wallet_id: u32) -> DriverResult<WalletBalance>;

    async fn send_transaction(
        &self,
        wallet_id: u32,
        amount: u64,
        address: &str,
        fee: u64,
    ) -> DriverResult<TransactionRecord>;

    async fn get_transaction(
        &self,
        wallet_id: u32,
        transaction_id: Bytes32,
    ) -> DriverResult<TransactionRecord>;
}
