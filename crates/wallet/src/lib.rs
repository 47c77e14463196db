//! Plot-NFT Wallet Library
//!
//! Key material and signing for a freshly generated Chia wallet:
//!
//! - **Key Derivation**: HD key derivation following Chia paths (m/12381/8444/{type}/{index})
//! - **Key Registry**: wallet keys indexed by their standard puzzle hash, plus the
//!   farmer, owner, payout and delay identities
//! - **Address Utilities**: puzzle hashes and bech32m addresses from public keys
//! - **Transaction Signing**: aggregate BLS signatures over standard-puzzle spends
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use plotnft_wallet::{Address, KeyDerivation, KeyRegistry, Network};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mnemonic = KeyDerivation::generate_mnemonic()?;
//! let registry = KeyRegistry::from_mnemonic(&mnemonic)?;
//!
//! let first = Address::from_puzzle_hash(
//!     registry.first_puzzle_hash(),
//!     Network::Mainnet.address_prefix(),
//! )?;
//! println!("Address: {}", first);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod keys;
mod network;
mod registry;
mod signer;

pub use address::{Address, AddressUtils};
pub use error::{WalletError, WalletResult};
pub use keys::{KeyDerivation, SyntheticKey};
pub use network::Network;
pub use registry::{
    KeyPair, KeyRegistry, SecretKeyStore, DEFAULT_KEY_COUNT, DELAY_INDEX, FIRST_ADDRESS_INDEX,
    PAYOUT_INDEX,
};
pub use signer::Signer;

/// Re-export commonly used types
pub use chia::bls::{PublicKey, SecretKey, Signature};
pub use chia::protocol::{Coin, CoinSpend};
