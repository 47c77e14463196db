//! Puzzle-hash indexed key registry.
//!
//! A [`KeyRegistry`] is built once per session from a seed. It owns:
//! - the wallet keys at indices `0..count`, indexed by their standard puzzle hash
//! - a [`SecretKeyStore`] of synthetic signing keys, filled as spends are built
//!
//! Fixed-purpose identities (farmer, plot-NFT owner, payout and delay puzzle
//! hashes) are derived on demand and never enter the spend-authority map.

use std::collections::HashMap;

use chia::bls::{PublicKey, SecretKey};
use chia::protocol::Bytes32;
use tracing::debug;

use crate::address::AddressUtils;
use crate::error::{WalletError, WalletResult};
use crate::keys::{KeyDerivation, SyntheticKey};

/// Number of wallet keys derived for a fresh session.
pub const DEFAULT_KEY_COUNT: u32 = 20;

/// Wallet index whose address receives the feed funds.
pub const FIRST_ADDRESS_INDEX: u32 = 0;
/// Wallet index used for the payout / owner puzzle hash.
pub const PAYOUT_INDEX: u32 = 1;
/// Wallet index whose puzzle hash receives the plot-NFT's delayed escape.
pub const DELAY_INDEX: u32 = 2;

/// A wallet key pair at a fixed derivation index.
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// Derivation index under the wallet path
    pub index: u32,
    /// Public key
    pub public_key: PublicKey,
    /// Secret key
    pub secret_key: SecretKey,
}

impl KeyPair {
    /// Synthetic public key curried into this key's standard puzzle.
    pub fn synthetic_public_key(&self) -> PublicKey {
        SyntheticKey::compute_synthetic_public_key(&self.public_key)
    }
}

/// Synthetic secret keys, looked up by their public key at signing time.
#[derive(Debug, Default, Clone)]
pub struct SecretKeyStore {
    keys: HashMap<PublicKey, SecretKey>,
}

impl SecretKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a secret key under its public key.
    pub fn save_secret_key(&mut self, secret_key: SecretKey) -> PublicKey {
        let public_key = secret_key.public_key();
        self.keys.entry(public_key.clone()).or_insert(secret_key);
        public_key
    }

    /// Resolve a public key to its secret key.
    pub fn secret_key_for_public_key(&self, public_key: &PublicKey) -> Option<&SecretKey> {
        self.keys.get(public_key)
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Wallet keys derived from one seed, indexed by standard puzzle hash.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    master_sk: SecretKey,
    puzzle_hashes: HashMap<Bytes32, KeyPair>,
    secret_key_store: SecretKeyStore,
}

impl KeyRegistry {
    /// Derive `count` wallet keys from a seed.
    pub fn derive(seed: &[u8], count: u32) -> WalletResult<Self> {
        let master_sk = KeyDerivation::master_from_seed(seed)?;
        Ok(Self::from_master_key(master_sk, count))
    }

    /// Derive the default 20 wallet keys from a BIP39 mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> WalletResult<Self> {
        let seed = KeyDerivation::mnemonic_to_seed(mnemonic)?;
        Self::derive(&seed, DEFAULT_KEY_COUNT)
    }

    /// Derive `count` wallet keys below an existing master key.
    pub fn from_master_key(master_sk: SecretKey, count: u32) -> Self {
        let mut puzzle_hashes = HashMap::with_capacity(count as usize);

        for index in 0..count {
            let secret_key = KeyDerivation::derive_wallet_key(&master_sk, index);
            let public_key = secret_key.public_key();
            let puzzle_hash = AddressUtils::standard_puzzle_hash(&public_key);

            // Write-once per puzzle hash; a collision would mean a broken derivation.
            puzzle_hashes.entry(puzzle_hash).or_insert(KeyPair {
                index,
                public_key,
                secret_key,
            });
        }

        debug!(count, "derived wallet keys");

        Self {
            master_sk,
            puzzle_hashes,
            secret_key_store: SecretKeyStore::new(),
        }
    }

    /// Look up the key pair that controls a puzzle hash.
    pub fn lookup(&self, puzzle_hash: &Bytes32) -> WalletResult<&KeyPair> {
        self.puzzle_hashes
            .get(puzzle_hash)
            .ok_or(WalletError::UnknownPuzzleHash(*puzzle_hash))
    }

    /// Whether the registry can spend coins locked to this puzzle hash.
    pub fn contains(&self, puzzle_hash: &Bytes32) -> bool {
        self.puzzle_hashes.contains_key(puzzle_hash)
    }

    /// Derive the synthetic signing key for a puzzle hash and cache it.
    ///
    /// Returns the synthetic public key, which is also the key curried into
    /// the coin's standard puzzle.
    pub fn synthetic_secret_key(&mut self, puzzle_hash: &Bytes32) -> WalletResult<PublicKey> {
        let key_pair = self.lookup(puzzle_hash)?;
        let synthetic_sk = SyntheticKey::compute_synthetic_secret_key(&key_pair.secret_key);
        Ok(self.secret_key_store.save_secret_key(synthetic_sk))
    }

    /// Cached synthetic keys.
    pub fn secret_key_store(&self) -> &SecretKeyStore {
        &self.secret_key_store
    }

    /// Number of spendable puzzle hashes.
    pub fn len(&self) -> usize {
        self.puzzle_hashes.len()
    }

    /// Whether no keys were derived.
    pub fn is_empty(&self) -> bool {
        self.puzzle_hashes.is_empty()
    }

    /// All spendable puzzle hashes.
    pub fn puzzle_hashes(&self) -> impl Iterator<Item = &Bytes32> {
        self.puzzle_hashes.keys()
    }

    /// Fingerprint of the master public key.
    pub fn fingerprint(&self) -> u32 {
        self.master_sk.public_key().get_fingerprint()
    }

    /// Standard puzzle hash of the wallet key at `index`.
    pub fn wallet_puzzle_hash(&self, index: u32) -> Bytes32 {
        let public_key = KeyDerivation::derive_wallet_key(&self.master_sk, index).public_key();
        AddressUtils::standard_puzzle_hash(&public_key)
    }

    /// Puzzle hash that receives the feed funds.
    pub fn first_puzzle_hash(&self) -> Bytes32 {
        self.wallet_puzzle_hash(FIRST_ADDRESS_INDEX)
    }

    /// Payout / owner puzzle hash.
    pub fn payout_puzzle_hash(&self) -> Bytes32 {
        self.wallet_puzzle_hash(PAYOUT_INDEX)
    }

    /// Puzzle hash receiving the plot-NFT's delayed claim.
    pub fn delay_puzzle_hash(&self) -> Bytes32 {
        self.wallet_puzzle_hash(DELAY_INDEX)
    }

    /// Plot-NFT owner public key.
    pub fn owner_public_key(&self, pool_wallet_index: u32) -> PublicKey {
        KeyDerivation::derive_singleton_owner_key(&self.master_sk, pool_wallet_index).public_key()
    }

    /// Farmer public key.
    pub fn farmer_public_key(&self) -> PublicKey {
        KeyDerivation::derive_farmer_key(&self.master_sk).public_key()
    }
}
