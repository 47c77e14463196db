//! Key derivation and synthetic key computation.

use chia::bls::{DerivableKey, PublicKey, SecretKey};
use chia::puzzles::DeriveSynthetic;
use chia_puzzle_types::standard::DEFAULT_HIDDEN_PUZZLE_HASH;

use crate::error::{WalletError, WalletResult};

/// BLS purpose / coin-type prefix shared by every Chia key path.
const PURPOSE: u32 = 12381;
const COIN_TYPE: u32 = 8444;

/// Key-type component of the derivation path.
const FARMER_PATH: u32 = 0;
const WALLET_PATH: u32 = 2;
const SINGLETON_OWNER_PATH: u32 = 5;

/// Key derivation utilities following Chia HD path standards.
///
/// All paths are fully hardened, matching the reference wallet's
/// `master_sk_to_*_sk` helpers.
pub struct KeyDerivation;

impl KeyDerivation {
    /// Derive the master key from a seed (BLS key generation).
    pub fn master_from_seed(seed: &[u8]) -> WalletResult<SecretKey> {
        if seed.len() < 32 {
            return Err(WalletError::SeedTooShort(seed.len()));
        }
        Ok(SecretKey::from_seed(seed))
    }

    /// Wallet key at `m/12381/8444/2/{index}`.
    pub fn derive_wallet_key(master_sk: &SecretKey, index: u32) -> SecretKey {
        Self::derive_path(master_sk, &[PURPOSE, COIN_TYPE, WALLET_PATH, index])
    }

    /// Farmer key at `m/12381/8444/0/0`.
    pub fn derive_farmer_key(master_sk: &SecretKey) -> SecretKey {
        Self::derive_path(master_sk, &[PURPOSE, COIN_TYPE, FARMER_PATH, 0])
    }

    /// Plot-NFT owner key at `m/12381/8444/5/{pool_wallet_index}`.
    pub fn derive_singleton_owner_key(master_sk: &SecretKey, pool_wallet_index: u32) -> SecretKey {
        Self::derive_path(
            master_sk,
            &[PURPOSE, COIN_TYPE, SINGLETON_OWNER_PATH, pool_wallet_index],
        )
    }

    fn derive_path(master_sk: &SecretKey, path: &[u32]) -> SecretKey {
        path.iter()
            .fold(master_sk.clone(), |sk, index| sk.derive_hardened(*index))
    }

    /// Generate a 24-word BIP39 mnemonic from random entropy.
    pub fn generate_mnemonic() -> WalletResult<String> {
        use bip39::{Language, Mnemonic};
        use rand::RngCore;

        let mut entropy = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut entropy);

        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
            .map_err(|e| WalletError::Bip39(format!("Failed to generate mnemonic: {}", e)))?;

        Ok(mnemonic.to_string())
    }

    /// Turn a BIP39 mnemonic into the 64-byte seed (empty passphrase, Chia standard).
    pub fn mnemonic_to_seed(mnemonic: &str) -> WalletResult<[u8; 64]> {
        use bip39::{Language, Mnemonic};

        let mnemonic = Mnemonic::parse_in_normalized(Language::English, mnemonic)
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

        Ok(mnemonic.to_seed(""))
    }
}

/// Synthetic key computation for standard Chia puzzles.
pub struct SyntheticKey;

impl SyntheticKey {
    /// Synthetic public key for the default hidden puzzle.
    ///
    /// This is the key curried into the standard transaction puzzle.
    pub fn compute_synthetic_public_key(public_key: &PublicKey) -> PublicKey {
        public_key.derive_synthetic_hidden(&DEFAULT_HIDDEN_PUZZLE_HASH)
    }

    /// Synthetic secret key: `sk + scalar_from_hash(pk || default_hidden_puzzle_hash)`.
    pub fn compute_synthetic_secret_key(secret_key: &SecretKey) -> SecretKey {
        secret_key.derive_synthetic_hidden(&DEFAULT_HIDDEN_PUZZLE_HASH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

    #[test]
    fn test_synthetic_secret_key_matches_public_key() {
        let sk = SecretKey::from_bytes(&[42u8; 32]).unwrap();
        let pk = sk.public_key();

        let synthetic_pk = SyntheticKey::compute_synthetic_public_key(&pk);
        let synthetic_sk = SyntheticKey::compute_synthetic_secret_key(&sk);

        assert_ne!(synthetic_pk.to_bytes(), pk.to_bytes());
        assert_eq!(synthetic_sk.public_key().to_bytes(), synthetic_pk.to_bytes());
    }

    #[test]
    fn test_mnemonic_generation_roundtrips_to_seed() {
        let mnemonic = KeyDerivation::generate_mnemonic().unwrap();
        assert_eq!(mnemonic.split_whitespace().count(), 24);

        let seed = KeyDerivation::mnemonic_to_seed(&mnemonic).unwrap();
        assert!(KeyDerivation::master_from_seed(&seed).is_ok());
    }

    #[test]
    fn test_mnemonic_seed_is_deterministic() {
        let a = KeyDerivation::mnemonic_to_seed(TEST_MNEMONIC).unwrap();
        let b = KeyDerivation::mnemonic_to_seed(TEST_MNEMONIC).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        let err = KeyDerivation::mnemonic_to_seed("not a real mnemonic").unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn test_short_seed_rejected() {
        let err = KeyDerivation::master_from_seed(&[1u8; 16]).unwrap_err();
        assert!(matches!(err, WalletError::SeedTooShort(16)));
    }

    #[test]
    fn test_key_paths_are_distinct() {
        let master = KeyDerivation::master_from_seed(&[3u8; 64]).unwrap();

        let wallet0 = KeyDerivation::derive_wallet_key(&master, 0);
        let wallet1 = KeyDerivation::derive_wallet_key(&master, 1);
        let farmer = KeyDerivation::derive_farmer_key(&master);
        let owner = KeyDerivation::derive_singleton_owner_key(&master, 0);

        let all = [wallet0, wallet1, farmer, owner];
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a.to_bytes(), b.to_bytes());
            }
        }
    }
}
