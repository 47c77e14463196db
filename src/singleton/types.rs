//! Launcher solution and launch result types

use chia::protocol::{Bytes, Bytes32, Coin, SpendBundle};
use chia::puzzles::{EveProof, Proof};
use clvm_traits::{FromClvm, ToClvm};

use crate::pool::PoolInnerPuzzle;

/// Singleton launcher solution: `(singleton_puzzle_hash amount key_value_list)`.
#[derive(Debug, Clone, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(list)]
pub struct LauncherSolution<T> {
    pub singleton_puzzle_hash: Bytes32,
    pub amount: u64,
    pub key_value_list: T,
}

/// Key-value list a pool launcher carries so the plot-NFT can be recovered
/// from the launcher spend alone.
///
/// `(("p" . pool_state) ("t" . delay_time) ("h" . delay_puzzle_hash))`
#[derive(Debug, Clone, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(list)]
pub struct PoolExtraData {
    pub pool_state: (Bytes, Bytes),
    pub delay_time: (Bytes, u64),
    pub delay_puzzle_hash: (Bytes, Bytes32),
}

impl PoolExtraData {
    pub fn new(pool_state_bytes: Vec<u8>, delay_time: u64, delay_puzzle_hash: Bytes32) -> Self {
        Self {
            pool_state: (Bytes::from(b"p".to_vec()), Bytes::from(pool_state_bytes)),
            delay_time: (Bytes::from(b"t".to_vec()), delay_time),
            delay_puzzle_hash: (Bytes::from(b"h".to_vec()), delay_puzzle_hash),
        }
    }
}

/// A signed plot-NFT launch, ready to push.
#[derive(Debug, Clone)]
pub struct LaunchedPlotNft {
    pub spend_bundle: SpendBundle,
    pub launcher_id: Bytes32,
    pub launcher_coin: Coin,
    pub singleton_puzzle_hash: Bytes32,
    /// Puzzle hash plots pay their pool rewards to.
    pub p2_singleton_puzzle_hash: Bytes32,
    pub inner_puzzle: PoolInnerPuzzle,
    /// Change returned to the wallet by the funding spends.
    pub change: u64,
}

impl LaunchedPlotNft {
    /// The singleton coin created once the launcher is spent.
    pub fn singleton_coin(&self) -> Coin {
        Coin::new(self.launcher_id, self.singleton_puzzle_hash, self.launcher_coin.amount)
    }

    /// Proof for the first spend of the singleton.
    pub fn eve_proof(&self) -> Proof {
        Proof::Eve(EveProof {
            parent_parent_coin_info: self.launcher_coin.parent_coin_info,
            parent_amount: self.launcher_coin.amount,
        })
    }

    /// Name of the spend bundle, used as the transaction id.
    pub fn transaction_id(&self) -> Bytes32 {
        self.spend_bundle.name()
    }
}
