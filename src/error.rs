//! Error types for plotnft-driver

use std::time::Duration;

use chia::protocol::Bytes32;
use plotnft_wallet::WalletError;
use thiserror::Error;

/// Result alias used throughout the driver.
pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Wallet couldn't find keys for puzzle hash 0x{}", hex::encode(.0))]
    UnknownPuzzleHash(Bytes32),

    #[error("No signing key registered for puzzle hash 0x{}", hex::encode(.0))]
    UnknownSigner(Bytes32),

    #[error("No coins supplied to spend")]
    NoCoins,

    #[error("Insufficient funds: have {available} mojos, need {required}")]
    InsufficientFunds { available: u128, required: u128 },

    #[error("Output amount does not fit in a coin: {0}")]
    AmountOverflow(u128),

    #[error("Cannot create two identical coins: 0x{} x {amount}", hex::encode(.puzzle_hash))]
    DuplicateOutputs { puzzle_hash: Bytes32, amount: u64 },

    #[error("Invalid initial state: {0}")]
    InvalidInitialState(String),

    #[error("Invalid internal pool state: {0}")]
    InvalidPoolState(String),

    #[error("Node rejected spend bundle: {0}")]
    RejectedByNode(String),

    #[error("Invalid poll configuration: {0}")]
    InvalidPollConfig(String),

    #[error("Confirmation timeout after {}s", .waited.as_secs())]
    ConfirmationTimeout { waited: Duration },

    #[error("Pool endpoint error: {0}")]
    PoolEndpoint(String),

    #[error("Failed to load puzzle into context: {0}")]
    PuzzleLoad(String),

    #[error("Failed to allocate CLVM node: {0}")]
    Alloc(String),

    #[error("Failed to serialize: {0}")]
    Serialize(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Feed wallet error: {0}")]
    FeedWallet(String),

    #[error(transparent)]
    Wallet(WalletError),
}

impl From<WalletError> for DriverError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::UnknownPuzzleHash(puzzle_hash) => DriverError::UnknownPuzzleHash(puzzle_hash),
            WalletError::UnknownSigner(puzzle_hash) => DriverError::UnknownSigner(puzzle_hash),
            WalletError::Signing(msg) => DriverError::Signing(msg),
            other => DriverError::Wallet(other),
        }
    }
}

impl From<reqwest::Error> for DriverError {
    fn from(err: reqwest::Error) -> Self {
        DriverError::Rpc(err.to_string())
    }
}
