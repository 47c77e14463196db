//! Pool inner puzzles and the plotting puzzle.

use chia::bls::PublicKey;
use chia::protocol::Bytes32;
use chia::puzzles::singleton::{SingletonArgs, SingletonStruct};
use chia_wallet_sdk::driver::SpendContext;
use clvm_traits::{FromClvm, ToClvm};
use clvm_utils::TreeHash;
use clvmr::NodePtr;

use crate::error::DriverResult;
use crate::pool::state::{PoolSingletonState, PoolState};
use crate::puzzle::{
    P2_SINGLETON_OR_DELAYED, POOL_MEMBER, POOL_WAITING_ROOM, SINGLETON_LAUNCHER, SINGLETON_TOP_LAYER,
};

/// Seconds before the owner may claim rewards from the plotting puzzle alone.
pub const DEFAULT_DELAY_TIME: u64 = 604_800;

#[derive(Debug, Clone, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(curry)]
pub struct PoolWaitingRoomArgs {
    pub target_puzzle_hash: Bytes32,
    pub p2_singleton_puzzle_hash: Bytes32,
    pub owner_pubkey: PublicKey,
    pub pool_reward_prefix: Bytes32,
    pub relative_lock_height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(curry)]
pub struct PoolMemberArgs {
    pub target_puzzle_hash: Bytes32,
    pub p2_singleton_puzzle_hash: Bytes32,
    pub owner_pubkey: PublicKey,
    pub pool_reward_prefix: Bytes32,
    pub escape_puzzle_hash: Bytes32,
}

#[derive(Debug, Clone, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(curry)]
pub struct P2SingletonOrDelayedArgs {
    pub singleton_mod_hash: Bytes32,
    pub launcher_id: Bytes32,
    pub launcher_puzzle_hash: Bytes32,
    pub seconds_delay: u64,
    pub delayed_puzzle_hash: Bytes32,
}

impl P2SingletonOrDelayedArgs {
    pub fn new(launcher_id: Bytes32, seconds_delay: u64, delayed_puzzle_hash: Bytes32) -> Self {
        Self {
            singleton_mod_hash: SINGLETON_TOP_LAYER.mod_hash().into(),
            launcher_id,
            launcher_puzzle_hash: SINGLETON_LAUNCHER.mod_hash().into(),
            seconds_delay,
            delayed_puzzle_hash,
        }
    }
}

/// First 16 bytes of the genesis challenge followed by 16 zero bytes.
///
/// Pool reward coins have this as their parent id prefix.
pub fn pool_reward_prefix(genesis_challenge: Bytes32) -> Bytes32 {
    let mut prefix = [0u8; 32];
    prefix[..16].copy_from_slice(&genesis_challenge[..16]);
    Bytes32::new(prefix)
}

/// `(mod_hash launcher_id . launcher_puzzle_hash)` for a pool singleton.
///
/// Pool plot-NFTs run on the v1.0 top layer, not the v1.1 one the SDK
/// defaults to.
pub fn pool_singleton_struct(launcher_id: Bytes32) -> SingletonStruct {
    SingletonStruct {
        mod_hash: SINGLETON_TOP_LAYER.mod_hash().into(),
        launcher_id,
        launcher_puzzle_hash: SINGLETON_LAUNCHER.mod_hash().into(),
    }
}

/// Full puzzle hash of a pool singleton wrapping `inner_puzzle_hash`.
pub fn pool_singleton_puzzle_hash(launcher_id: Bytes32, inner_puzzle_hash: TreeHash) -> Bytes32 {
    SINGLETON_TOP_LAYER
        .curry_tree_hash(&SingletonArgs {
            singleton_struct: pool_singleton_struct(launcher_id),
            inner_puzzle: inner_puzzle_hash,
        })
        .into()
}

/// Puzzle hash plots are created against: pays either the singleton or, after
/// `delay_time`, `delay_puzzle_hash`.
pub fn launcher_id_to_p2_puzzle_hash(
    launcher_id: Bytes32,
    delay_time: u64,
    delay_puzzle_hash: Bytes32,
) -> Bytes32 {
    P2_SINGLETON_OR_DELAYED
        .curry_tree_hash(&P2SingletonOrDelayedArgs::new(
            launcher_id,
            delay_time,
            delay_puzzle_hash,
        ))
        .into()
}

/// The inner puzzle a plot-NFT starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolInnerPuzzle {
    WaitingRoom(PoolWaitingRoomArgs),
    Member(PoolMemberArgs),
}

impl PoolInnerPuzzle {
    /// Waiting-room puzzle for a launcher.
    pub fn waiting_room(
        pool_state: &PoolState,
        launcher_id: Bytes32,
        genesis_challenge: Bytes32,
        delay_time: u64,
        delay_puzzle_hash: Bytes32,
    ) -> Self {
        PoolInnerPuzzle::WaitingRoom(PoolWaitingRoomArgs {
            target_puzzle_hash: pool_state.target_puzzle_hash,
            p2_singleton_puzzle_hash: launcher_id_to_p2_puzzle_hash(
                launcher_id,
                delay_time,
                delay_puzzle_hash,
            ),
            owner_pubkey: pool_state.owner_pubkey.clone(),
            pool_reward_prefix: pool_reward_prefix(genesis_challenge),
            relative_lock_height: pool_state.relative_lock_height,
        })
    }

    /// Pooling puzzle for a launcher; escapes into the waiting room.
    pub fn member(
        pool_state: &PoolState,
        launcher_id: Bytes32,
        genesis_challenge: Bytes32,
        delay_time: u64,
        delay_puzzle_hash: Bytes32,
    ) -> Self {
        let escape = Self::waiting_room(
            pool_state,
            launcher_id,
            genesis_challenge,
            delay_time,
            delay_puzzle_hash,
        );

        PoolInnerPuzzle::Member(PoolMemberArgs {
            target_puzzle_hash: pool_state.target_puzzle_hash,
            p2_singleton_puzzle_hash: launcher_id_to_p2_puzzle_hash(
                launcher_id,
                delay_time,
                delay_puzzle_hash,
            ),
            owner_pubkey: pool_state.owner_pubkey.clone(),
            pool_reward_prefix: pool_reward_prefix(genesis_challenge),
            escape_puzzle_hash: escape.tree_hash().into(),
        })
    }

    /// Select the starting puzzle from the pool state.
    pub fn for_state(
        pool_state: &PoolState,
        launcher_id: Bytes32,
        genesis_challenge: Bytes32,
        delay_time: u64,
        delay_puzzle_hash: Bytes32,
    ) -> DriverResult<Self> {
        let puzzle = match pool_state.singleton_state()? {
            PoolSingletonState::SelfPooling | PoolSingletonState::LeavingPool => {
                Self::waiting_room(
                    pool_state,
                    launcher_id,
                    genesis_challenge,
                    delay_time,
                    delay_puzzle_hash,
                )
            }
            PoolSingletonState::FarmingToPool => Self::member(
                pool_state,
                launcher_id,
                genesis_challenge,
                delay_time,
                delay_puzzle_hash,
            ),
        };
        Ok(puzzle)
    }

    pub fn is_waiting_room(&self) -> bool {
        matches!(self, PoolInnerPuzzle::WaitingRoom(_))
    }

    pub fn tree_hash(&self) -> TreeHash {
        match self {
            PoolInnerPuzzle::WaitingRoom(args) => POOL_WAITING_ROOM.curry_tree_hash(args),
            PoolInnerPuzzle::Member(args) => POOL_MEMBER.curry_tree_hash(args),
        }
    }

    /// Full singleton puzzle hash with this inner puzzle.
    pub fn singleton_puzzle_hash(&self, launcher_id: Bytes32) -> Bytes32 {
        pool_singleton_puzzle_hash(launcher_id, self.tree_hash())
    }

    /// Curried inner puzzle, for when the reveal is needed.
    pub fn curry_puzzle(&self, ctx: &mut SpendContext) -> DriverResult<NodePtr> {
        match self {
            PoolInnerPuzzle::WaitingRoom(args) => POOL_WAITING_ROOM.curry_puzzle(ctx, args.clone()),
            PoolInnerPuzzle::Member(args) => POOL_MEMBER.curry_puzzle(ctx, args.clone()),
        }
    }
}
