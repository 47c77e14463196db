//! Spend conditions and standard-puzzle solutions.
//!
//! [`Condition`] is the closed set of conditions this driver emits. A list of
//! them becomes a solution for `p2_delegated_puzzle_or_hidden_puzzle` through
//! [`build_solution`], which quotes the list as the delegated puzzle.

use chia::protocol::{Bytes, Bytes32, Coin, Program};
use chia::puzzles::standard::{StandardArgs, StandardSolution};
use chia::puzzles::Memos;
use chia::bls::PublicKey;
use chia_wallet_sdk::driver::SpendContext;
use chia_wallet_sdk::types::Conditions;
use clvm_utils::{CurriedProgram, TreeHash};
use sha2::{Digest, Sha256};

use crate::error::{DriverError, DriverResult};

/// A single output or assertion requested by a coin spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    CreateCoin { puzzle_hash: Bytes32, amount: u64 },
    AssertCoinAnnouncement(Bytes32),
    CreateCoinAnnouncement(Bytes32),
    AssertPuzzleAnnouncement(Bytes32),
    CreatePuzzleAnnouncement(Bytes32),
    ReserveFee(u64),
    AssertMyCoinId(Bytes32),
    AssertSecondsAbsolute(u64),
}

impl Condition {
    /// Coin this condition creates when emitted by `parent`.
    pub fn created_coin(&self, parent: Bytes32) -> Option<Coin> {
        match self {
            Condition::CreateCoin {
                puzzle_hash,
                amount,
            } => Some(Coin::new(parent, *puzzle_hash, *amount)),
            _ => None,
        }
    }

    fn append_to(&self, conditions: Conditions) -> Conditions {
        match self {
            Condition::CreateCoin {
                puzzle_hash,
                amount,
            } => conditions.create_coin(*puzzle_hash, *amount, Memos::None),
            Condition::AssertCoinAnnouncement(id) => conditions.assert_coin_announcement(*id),
            Condition::CreateCoinAnnouncement(message) => {
                conditions.create_coin_announcement(Bytes::from(message.to_vec()))
            }
            Condition::AssertPuzzleAnnouncement(id) => conditions.assert_puzzle_announcement(*id),
            Condition::CreatePuzzleAnnouncement(message) => {
                conditions.create_puzzle_announcement(Bytes::from(message.to_vec()))
            }
            Condition::ReserveFee(amount) => conditions.reserve_fee(*amount),
            Condition::AssertMyCoinId(coin_id) => conditions.assert_my_coin_id(*coin_id),
            Condition::AssertSecondsAbsolute(seconds) => conditions.assert_seconds_absolute(*seconds),
        }
    }
}

/// A coin announcement: a message vouched for by the coin that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Announcement {
    pub origin_coin_id: Bytes32,
    pub message: Bytes32,
}

impl Announcement {
    pub fn new(origin_coin_id: Bytes32, message: Bytes32) -> Self {
        Self {
            origin_coin_id,
            message,
        }
    }

    /// `sha256(origin_coin_id ‖ message)`, the value an assertion must name.
    pub fn id(&self) -> Bytes32 {
        let mut hasher = Sha256::new();
        hasher.update(self.origin_coin_id);
        hasher.update(self.message);
        Bytes32::new(hasher.finalize().into())
    }
}

/// Collect conditions into the SDK builder, preserving order.
pub fn to_sdk_conditions(conditions: &[Condition]) -> Conditions {
    conditions
        .iter()
        .fold(Conditions::new(), |acc, condition| condition.append_to(acc))
}

/// Build the standard-puzzle solution that outputs `conditions` verbatim.
pub fn build_solution(ctx: &mut SpendContext, conditions: &[Condition]) -> DriverResult<Program> {
    let solution = StandardSolution::from_conditions(to_sdk_conditions(conditions));
    let ptr = ctx
        .alloc(&solution)
        .map_err(|e| DriverError::Alloc(format!("standard solution: {:?}", e)))?;
    ctx.serialize(&ptr)
        .map_err(|e| DriverError::Serialize(format!("{:?}", e)))
}

/// Build the standard puzzle reveal for a synthetic public key.
pub fn standard_puzzle(ctx: &mut SpendContext, synthetic_key: PublicKey) -> DriverResult<Program> {
    let mod_ptr = ctx
        .puzzle(
            TreeHash::new(chia_puzzles::P2_DELEGATED_PUZZLE_OR_HIDDEN_PUZZLE_HASH),
            &chia_puzzles::P2_DELEGATED_PUZZLE_OR_HIDDEN_PUZZLE,
        )
        .map_err(|e| DriverError::PuzzleLoad(format!("standard puzzle: {:?}", e)))?;

    let ptr = ctx
        .alloc(&CurriedProgram {
            program: mod_ptr,
            args: StandardArgs::new(synthetic_key),
        })
        .map_err(|e| DriverError::Alloc(format!("standard curry: {:?}", e)))?;

    ctx.serialize(&ptr)
        .map_err(|e| DriverError::Serialize(format!("{:?}", e)))
}
