//! Puzzle loading and currying utilities
//!
//! Every puzzle this driver curries ships compiled in `chia_puzzles`, together
//! with its tree hash. [`PuzzleModule`] pairs the two so callers can compute a
//! curried hash without allocating, or build the curried program in a
//! [`SpendContext`] when a reveal is needed.

use chia_wallet_sdk::driver::SpendContext;
use clvm_traits::ToClvm;
use clvm_utils::{CurriedProgram, ToTreeHash, TreeHash};
use clvmr::{Allocator, NodePtr};

use crate::error::{DriverError, DriverResult};

/// A compiled puzzle module that can be curried with typed arguments.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, ToClvm, FromClvm)]
/// #[clvm(curry)]
/// pub struct MyCurryArgs {
///     pub inner_puzzle_hash: Bytes32,
/// }
///
/// let hash = POOL_MEMBER.curry_tree_hash(&MyCurryArgs { inner_puzzle_hash });
/// let ptr = POOL_MEMBER.curry_puzzle(ctx, MyCurryArgs { inner_puzzle_hash })?;
/// ```
#[derive(Clone, Copy)]
pub struct PuzzleModule {
    name: &'static str,
    mod_hash: [u8; 32],
    mod_bytes: &'static [u8],
}

/// `pool_member_innerpuz`: the inner puzzle while farming to a pool.
pub const POOL_MEMBER: PuzzleModule = PuzzleModule::new(
    "pool_member_innerpuz",
    chia_puzzles::POOL_MEMBER_INNERPUZ_HASH,
    &chia_puzzles::POOL_MEMBER_INNERPUZ,
);

/// `pool_waitingroom_innerpuz`: the inner puzzle while self-pooling or leaving a pool.
pub const POOL_WAITING_ROOM: PuzzleModule = PuzzleModule::new(
    "pool_waitingroom_innerpuz",
    chia_puzzles::POOL_WAITINGROOM_INNERPUZ_HASH,
    &chia_puzzles::POOL_WAITINGROOM_INNERPUZ,
);

/// `p2_singleton_or_delayed_puzhash`: the plotting (pool contract) puzzle.
pub const P2_SINGLETON_OR_DELAYED: PuzzleModule = PuzzleModule::new(
    "p2_singleton_or_delayed_puzhash",
    chia_puzzles::P2_SINGLETON_OR_DELAYED_PUZHASH_HASH,
    &chia_puzzles::P2_SINGLETON_OR_DELAYED_PUZHASH,
);

/// `singleton_top_layer`: the v1.0 singleton outer puzzle pool plot-NFTs use.
pub const SINGLETON_TOP_LAYER: PuzzleModule = PuzzleModule::new(
    "singleton_top_layer",
    chia_puzzles::SINGLETON_TOP_LAYER_HASH,
    &chia_puzzles::SINGLETON_TOP_LAYER,
);

/// `singleton_launcher`: spent once to create a singleton.
pub const SINGLETON_LAUNCHER: PuzzleModule = PuzzleModule::new(
    "singleton_launcher",
    chia_puzzles::SINGLETON_LAUNCHER_HASH,
    &chia_puzzles::SINGLETON_LAUNCHER,
);

impl PuzzleModule {
    pub const fn new(name: &'static str, mod_hash: [u8; 32], mod_bytes: &'static [u8]) -> Self {
        Self {
            name,
            mod_hash,
            mod_bytes,
        }
    }

    /// Get the module hash (uncurried puzzle hash)
    pub fn mod_hash(&self) -> TreeHash {
        TreeHash::new(self.mod_hash)
    }

    /// Get the raw puzzle bytes
    pub fn mod_bytes(&self) -> &'static [u8] {
        self.mod_bytes
    }

    /// Tree hash of this module curried with `args`.
    pub fn curry_tree_hash<A>(&self, args: &A) -> TreeHash
    where
        for<'a> CurriedProgram<TreeHash, &'a A>: ToTreeHash,
    {
        CurriedProgram {
            program: self.mod_hash(),
            args,
        }
        .tree_hash()
    }

    /// Load the uncurried module into the spend context.
    pub fn load(&self, ctx: &mut SpendContext) -> DriverResult<NodePtr> {
        ctx.puzzle(self.mod_hash(), self.mod_bytes)
            .map_err(|e| DriverError::PuzzleLoad(format!("{}: {:?}", self.name, e)))
    }

    /// Build a curried puzzle in the spend context.
    pub fn curry_puzzle<A>(&self, ctx: &mut SpendContext, args: A) -> DriverResult<NodePtr>
    where
        A: ToClvm<Allocator>,
    {
        let mod_ptr = self.load(ctx)?;

        ctx.alloc(&CurriedProgram {
            program: mod_ptr,
            args,
        })
        .map_err(|e| DriverError::Alloc(format!("{} curry: {:?}", self.name, e)))
    }
}

impl std::fmt::Debug for PuzzleModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PuzzleModule")
            .field("name", &self.name)
            .field("mod_hash", &hex::encode(self.mod_hash))
            .field("mod_bytes_len", &self.mod_bytes.len())
            .finish()
    }
}
