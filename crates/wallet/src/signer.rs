//! Transaction signing.

use chia::bls::{sign, Signature};
use chia::protocol::CoinSpend;
use chia_wallet_sdk::signer::RequiredSignature;
use clvmr::Allocator;
use tracing::debug;

use crate::error::{WalletError, WalletResult};
use crate::network::Network;
use crate::registry::KeyRegistry;

/// Signs standard-puzzle spends with keys held by a [`KeyRegistry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Signer {
    network: Network,
}

impl Signer {
    /// Create a signer for the given network's AGG_SIG constants.
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    /// Network whose constants are mixed into every signed message.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Produce the aggregate signature for a set of coin spends.
    ///
    /// Every spend must be locked to a puzzle hash the registry derived. The
    /// result does not depend on spend order.
    pub fn sign(
        &self,
        keys: &mut KeyRegistry,
        coin_spends: &[CoinSpend],
    ) -> WalletResult<Signature> {
        for coin_spend in coin_spends {
            keys.synthetic_secret_key(&coin_spend.coin.puzzle_hash)
                .map_err(|e| match e {
                    WalletError::UnknownPuzzleHash(puzzle_hash) => {
                        WalletError::UnknownSigner(puzzle_hash)
                    }
                    other => other,
                })?;
        }

        let mut allocator = Allocator::new();
        let required_signatures = RequiredSignature::from_coin_spends(
            &mut allocator,
            coin_spends,
            &self.network.agg_sig_constants(),
        )
        .map_err(|e| WalletError::Signing(format!("Failed to parse required signatures: {:?}", e)))?;

        let store = keys.secret_key_store();
        let mut signatures = Vec::new();

        for required in required_signatures {
            match required {
                RequiredSignature::Bls(bls_sig) => {
                    let Some(sk) = store.secret_key_for_public_key(&bls_sig.public_key) else {
                        return Err(WalletError::Signing(format!(
                            "Missing secret key for public key: {}",
                            hex::encode(bls_sig.public_key.to_bytes())
                        )));
                    };
                    signatures.push(sign(sk, bls_sig.message()));
                }
                RequiredSignature::Secp(_) => {
                    return Err(WalletError::Signing(
                        "SECP signatures are not supported".into(),
                    ));
                }
            }
        }

        debug!(
            spends = coin_spends.len(),
            signatures = signatures.len(),
            "aggregated spend signatures"
        );

        Ok(signatures
            .iter()
            .fold(Signature::default(), |acc, sig| acc + sig))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chia::protocol::{Bytes32, Coin};
    use chia_wallet_sdk::driver::{SpendContext, StandardLayer};
    use chia_wallet_sdk::types::Conditions;

    use crate::registry::DEFAULT_KEY_COUNT;

    fn registry() -> KeyRegistry {
        KeyRegistry::derive(&[11u8; 64], DEFAULT_KEY_COUNT).unwrap()
    }

    fn standard_spends(keys: &KeyRegistry, indices: &[u32]) -> Vec<CoinSpend> {
        let ctx = &mut SpendContext::new();

        for (n, index) in indices.iter().enumerate() {
            let puzzle_hash = keys.wallet_puzzle_hash(*index);
            let synthetic_pk = keys.lookup(&puzzle_hash).unwrap().synthetic_public_key();
            let coin = Coin::new(Bytes32::new([n as u8 + 1; 32]), puzzle_hash, 1000);
            let conditions = Conditions::new().reserve_fee(1);

            StandardLayer::new(synthetic_pk)
                .spend(ctx, coin, conditions)
                .unwrap();
        }

        ctx.take()
    }

    #[test]
    fn test_signature_is_order_invariant() {
        let mut keys = registry();
        let spends = standard_spends(&keys, &[0, 3, 7]);

        let signer = Signer::new(Network::Testnet11);
        let forward = signer.sign(&mut keys, &spends).unwrap();

        let mut reversed = spends.clone();
        reversed.reverse();
        let backward = signer.sign(&mut keys, &reversed).unwrap();

        assert_eq!(forward, backward);
        assert_ne!(forward, Signature::default());
    }

    #[test]
    fn test_signature_depends_on_network() {
        let mut keys = registry();
        let spends = standard_spends(&keys, &[1]);

        let mainnet = Signer::new(Network::Mainnet).sign(&mut keys, &spends).unwrap();
        let testnet = Signer::new(Network::Testnet11).sign(&mut keys, &spends).unwrap();
        assert_ne!(mainnet, testnet);
    }

    #[test]
    fn test_unknown_signer() {
        let mut keys = registry();
        let mut spends = standard_spends(&keys, &[0]);

        let foreign = Bytes32::new([0x55; 32]);
        spends[0].coin = Coin::new(spends[0].coin.parent_coin_info, foreign, 1000);

        let err = Signer::default().sign(&mut keys, &spends).unwrap_err();
        assert!(matches!(err, WalletError::UnknownSigner(ph) if ph == foreign));
    }

    #[test]
    fn test_empty_spend_set_signs_to_identity() {
        let mut keys = registry();
        let signature = Signer::default().sign(&mut keys, &[]).unwrap();
        assert_eq!(signature, Signature::default());
    }
}
