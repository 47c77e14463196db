//! Address and puzzle hash utilities.

use bech32::{Bech32m, Hrp};
use chia::bls::PublicKey;
use chia::protocol::Bytes32;
use chia::puzzles::standard::StandardArgs;

use crate::error::{WalletError, WalletResult};
use crate::keys::SyntheticKey;

/// Address utilities for Chia addresses.
pub struct AddressUtils;

impl AddressUtils {
    /// Standard transaction puzzle hash for a wallet public key.
    ///
    /// The key is first turned into its synthetic form, then curried into
    /// `p2_delegated_puzzle_or_hidden_puzzle`.
    pub fn standard_puzzle_hash(public_key: &PublicKey) -> Bytes32 {
        let synthetic = SyntheticKey::compute_synthetic_public_key(public_key);
        StandardArgs::curry_tree_hash(synthetic).into()
    }

    /// Convert a puzzle hash to a bech32m address with the given prefix.
    pub fn encode_puzzle_hash(puzzle_hash: &Bytes32, prefix: &str) -> WalletResult<String> {
        let hrp = Hrp::parse(prefix)
            .map_err(|e| WalletError::InvalidAddress(format!("Invalid prefix {}: {}", prefix, e)))?;
        bech32::encode::<Bech32m>(hrp, puzzle_hash.as_ref())
            .map_err(|e| WalletError::InvalidAddress(format!("Encoding failed: {}", e)))
    }

    /// Parse destination (address or puzzle hash) to puzzle hash bytes.
    pub fn parse_destination(dest: &str) -> WalletResult<Bytes32> {
        let bytes = if dest.starts_with("xch1") || dest.starts_with("txch1") {
            let (_, data) = bech32::decode(dest)
                .map_err(|e| WalletError::InvalidAddress(format!("Invalid address: {:?}", e)))?;
            data
        } else {
            let hex_str = dest.strip_prefix("0x").unwrap_or(dest);
            hex::decode(hex_str)?
        };

        let puzzle_hash: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            WalletError::InvalidAddress(format!(
                "Puzzle hash must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Bytes32::new(puzzle_hash))
    }
}

/// A puzzle hash together with its bech32m encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// The puzzle hash
    pub puzzle_hash: Bytes32,
    /// The bech32m encoded address
    pub bech32: String,
}

impl Address {
    /// Create an address from a puzzle hash.
    pub fn from_puzzle_hash(puzzle_hash: Bytes32, prefix: &str) -> WalletResult<Self> {
        let bech32 = AddressUtils::encode_puzzle_hash(&puzzle_hash, prefix)?;
        Ok(Self {
            puzzle_hash,
            bech32,
        })
    }

    /// Create the standard-transaction address of a wallet public key.
    pub fn from_public_key(public_key: &PublicKey, prefix: &str) -> WalletResult<Self> {
        Self::from_puzzle_hash(AddressUtils::standard_puzzle_hash(public_key), prefix)
    }

    /// Parse an address from a string.
    pub fn from_string(s: &str) -> WalletResult<Self> {
        let puzzle_hash = AddressUtils::parse_destination(s)?;
        Ok(Self {
            puzzle_hash,
            bech32: s.to_string(),
        })
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bech32)
    }
}
