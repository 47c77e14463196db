//! Request and response bodies of the node and wallet RPC services.

use chia::protocol::{Bytes32, Coin, SpendBundle};
use serde::{Deserialize, Serialize};

/// Outcome of `push_tx`. The node answers `SUCCESS` once the bundle is in
/// its mempool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushTxResponse {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl PushTxResponse {
    pub const SUCCESS: &'static str = "SUCCESS";

    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PushTxRequest<'a> {
    pub spend_bundle: &'a SpendBundle,
}

/// A coin as tracked by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub coin: Coin,
    pub confirmed_block_index: u32,
    #[serde(default)]
    pub spent_block_index: u32,
    #[serde(default)]
    pub spent: bool,
    #[serde(default)]
    pub coinbase: bool,
    #[serde(default)]
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CoinRecordsByPuzzleHashRequest {
    pub puzzle_hash: Bytes32,
    pub include_spent_coins: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CoinRecordsResponse {
    pub coin_records: Vec<CoinRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LogInRequest {
    pub fingerprint: u32,
}

/// Answer to `log_in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogInResponse {
    pub success: bool,
    #[serde(default)]
    pub fingerprint: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct WalletIdRequest {
    pub wallet_id: u32,
}

/// Spendable balances of one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub wallet_id: u32,
    #[serde(default)]
    pub confirmed_wallet_balance: u64,
    #[serde(default)]
    pub spendable_balance: u64,
    pub max_send_amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WalletBalanceResponse {
    pub wallet_balance: WalletBalance,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SendTransactionRequest<'a> {
    pub wallet_id: u32,
    pub amount: u64,
    pub address: &'a str,
    pub fee: u64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GetTransactionRequest {
    pub transaction_id: Bytes32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TransactionResponse {
    pub transaction: TransactionRecord,
}

/// A wallet transaction and its confirmation status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub name: Bytes32,
    pub confirmed: bool,
    #[serde(default)]
    pub confirmed_at_height: u32,
    pub to_puzzle_hash: Bytes32,
    pub amount: u64,
    #[serde(default)]
    pub fee_amount: u64,
    #[serde(default)]
    pub additions: Vec<Coin>,
    #[serde(default)]
    pub removals: Vec<Coin>,
}

impl TransactionRecord {
    /// Coins this transaction created for `puzzle_hash`.
    pub fn additions_to(&self, puzzle_hash: Bytes32) -> Vec<Coin> {
        self.additions
            .iter()
            .filter(|coin| coin.puzzle_hash == puzzle_hash)
            .copied()
            .collect()
    }
}
