//! Plot-NFT launch driver
//!
//! Builds, signs and submits the spends that create a Chia pool plot-NFT from
//! a freshly derived wallet:
//! - `TransactionBuilder` - standard-puzzle spends moving a batch of coins atomically
//! - `LauncherSpendBuilder` - the singleton launcher spend carrying the initial pool state
//! - `PoolInnerPuzzle` - waiting-room and pool-member inner puzzles
//! - `SubmissionPoller` - pushes a bundle and waits for it to land
//! - `FeedWallet` - funds the new wallet from an existing one
//!
//! # Example
//!
//! ```rust,ignore
//! let mut keys = KeyRegistry::from_mnemonic(&mnemonic)?;
//! let pool_state = PoolState::self_pooling(keys.owner_public_key(0), keys.payout_puzzle_hash());
//!
//! let ctx = &mut SpendContext::new();
//! let launched = LauncherSpendBuilder::new(&mut keys, Signer::new(Network::Mainnet)).build(
//!     ctx,
//!     &LaunchRequest {
//!         funding_coins,
//!         pool_state,
//!         delay_time: DEFAULT_DELAY_TIME,
//!         delay_puzzle_hash: keys.delay_puzzle_hash(),
//!         change_puzzle_hash: keys.payout_puzzle_hash(),
//!         fee: 0,
//!     },
//! )?;
//! poller.submit(&node, &launched.spend_bundle).await?;
//! ```

mod conditions;
mod error;
mod feed;
mod poller;
mod pool;
mod puzzle;
pub mod rpc;
mod singleton;
mod transaction;

pub use conditions::{build_solution, standard_puzzle, to_sdk_conditions, Announcement, Condition};
pub use error::{DriverError, DriverResult};
pub use feed::{FeedSettings, FeedWallet};
pub use poller::{Clock, PollConfig, SubmissionPoller, TokioClock};
pub use pool::*;
pub use puzzle::{
    PuzzleModule, P2_SINGLETON_OR_DELAYED, POOL_MEMBER, POOL_WAITING_ROOM, SINGLETON_LAUNCHER,
    SINGLETON_TOP_LAYER,
};
pub use singleton::*;
pub use transaction::{
    primary_coin, Payment, SpendPlan, TransactionBuilder, TransactionRequest, UnsignedPlan,
    UnsignedTransaction,
};

// Re-export commonly used types from dependencies
pub use chia::protocol::{Bytes32, Coin, CoinSpend, SpendBundle};
pub use chia_wallet_sdk::driver::SpendContext;
pub use clvm_utils::TreeHash;
