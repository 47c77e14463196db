//! Pool enrollment: state, puzzles, and the pool endpoint.

mod info;
mod puzzles;
mod state;

pub use info::{resolve_initial_state, PoolInfo, PoolInfoClient};
pub use puzzles::{
    launcher_id_to_p2_puzzle_hash, pool_reward_prefix, pool_singleton_puzzle_hash,
    pool_singleton_struct, P2SingletonOrDelayedArgs, PoolInnerPuzzle, PoolMemberArgs,
    PoolWaitingRoomArgs, DEFAULT_DELAY_TIME,
};
pub use state::{PoolSingletonState, PoolState, MAX_RELATIVE_LOCK_HEIGHT, POOL_PROTOCOL_VERSION};
