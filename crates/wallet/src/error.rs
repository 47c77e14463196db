//! Error types for key and signing operations.

use chia::protocol::Bytes32;
use thiserror::Error;

/// Result type for wallet operations.
pub type WalletResult<T> = std::result::Result<T, WalletError>;

/// Errors that can occur while deriving keys or signing spends.
#[derive(Error, Debug)]
pub enum WalletError {
    /// No derived key produces this puzzle hash
    #[error("Wallet couldn't find keys for puzzle hash 0x{}", hex::encode(.0))]
    UnknownPuzzleHash(Bytes32),

    /// A spend requires a signature from a key this wallet does not hold
    #[error("No signing key registered for puzzle hash 0x{}", hex::encode(.0))]
    UnknownSigner(Bytes32),

    /// Invalid mnemonic
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Seed too short for BLS key generation
    #[error("Seed must be at least 32 bytes, got {0}")]
    SeedTooShort(usize),

    /// Invalid address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Network name not recognised
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// Signing error
    #[error("Signing error: {0}")]
    Signing(String),

    /// BIP39 error
    #[error("BIP39 error: {0}")]
    Bip39(String),

    /// Hex decode error
    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
