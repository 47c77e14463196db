//! Pool singleton state and its on-chain serialization.

use std::fmt;
use std::str::FromStr;

use chia::bls::PublicKey;
use chia::protocol::Bytes32;

use crate::error::{DriverError, DriverResult};

/// Pool protocol version written into every new pool state.
pub const POOL_PROTOCOL_VERSION: u8 = 1;

/// Highest relative lock height a pool may ask for.
pub const MAX_RELATIVE_LOCK_HEIGHT: u32 = 1000;

/// Enrollment state of a plot-NFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PoolSingletonState {
    SelfPooling = 1,
    LeavingPool = 2,
    FarmingToPool = 3,
}

impl PoolSingletonState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            PoolSingletonState::SelfPooling => "SELF_POOLING",
            PoolSingletonState::LeavingPool => "LEAVING_POOL",
            PoolSingletonState::FarmingToPool => "FARMING_TO_POOL",
        }
    }
}

impl TryFrom<u8> for PoolSingletonState {
    type Error = DriverError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PoolSingletonState::SelfPooling),
            2 => Ok(PoolSingletonState::LeavingPool),
            3 => Ok(PoolSingletonState::FarmingToPool),
            other => Err(DriverError::InvalidInitialState(format!(
                "unknown pool singleton state {}",
                other
            ))),
        }
    }
}

impl FromStr for PoolSingletonState {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SELF_POOLING" => Ok(PoolSingletonState::SelfPooling),
            "LEAVING_POOL" => Ok(PoolSingletonState::LeavingPool),
            "FARMING_TO_POOL" => Ok(PoolSingletonState::FarmingToPool),
            other => Err(DriverError::InvalidInitialState(format!(
                "unknown pool singleton state {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for PoolSingletonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pool state embedded in a plot-NFT at launch.
///
/// `state` is kept as the raw byte so a launcher can be asked to build from
/// any value and reject the ones it does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub version: u8,
    pub state: u8,
    pub target_puzzle_hash: Bytes32,
    pub owner_pubkey: PublicKey,
    pub pool_url: Option<String>,
    pub relative_lock_height: u32,
}

impl PoolState {
    pub fn new(
        state: PoolSingletonState,
        target_puzzle_hash: Bytes32,
        owner_pubkey: PublicKey,
        pool_url: Option<String>,
        relative_lock_height: u32,
    ) -> Self {
        Self {
            version: POOL_PROTOCOL_VERSION,
            state: state.as_u8(),
            target_puzzle_hash,
            owner_pubkey,
            pool_url,
            relative_lock_height,
        }
    }

    /// Self-pooling: rewards go to the owner, no pool, no lock.
    pub fn self_pooling(owner_pubkey: PublicKey, owner_puzzle_hash: Bytes32) -> Self {
        Self::new(
            PoolSingletonState::SelfPooling,
            owner_puzzle_hash,
            owner_pubkey,
            Some(String::new()),
            0,
        )
    }

    /// Farming to a pool at `pool_url`, using the pool's target and lock height.
    pub fn farming_to_pool(
        owner_pubkey: PublicKey,
        target_puzzle_hash: Bytes32,
        pool_url: &str,
        relative_lock_height: u32,
    ) -> Self {
        Self::new(
            PoolSingletonState::FarmingToPool,
            target_puzzle_hash,
            owner_pubkey,
            Some(pool_url.trim_end_matches('/').to_string()),
            relative_lock_height,
        )
    }

    /// Decoded state byte.
    pub fn singleton_state(&self) -> DriverResult<PoolSingletonState> {
        PoolSingletonState::try_from(self.state)
    }

    /// Check that the state is internally consistent.
    pub fn verify(&self) -> DriverResult<()> {
        if self.version > POOL_PROTOCOL_VERSION {
            return Err(DriverError::InvalidPoolState(format!(
                "pool protocol version {} is newer than supported {}",
                self.version, POOL_PROTOCOL_VERSION
            )));
        }

        let mut problems = Vec::new();
        match self.singleton_state()? {
            PoolSingletonState::SelfPooling => {
                if self.pool_url.as_deref().is_some_and(|url| !url.is_empty()) {
                    problems.push("unneeded pool_url for self-pooling");
                }
                if self.relative_lock_height != 0 {
                    problems.push("incorrect relative_lock_height for self-pooling");
                }
            }
            PoolSingletonState::FarmingToPool | PoolSingletonState::LeavingPool => {
                if self.pool_url.as_deref().map_or(true, str::is_empty) {
                    problems.push("missing pool_url for pooling state");
                }
                if self.relative_lock_height > MAX_RELATIVE_LOCK_HEIGHT {
                    problems.push("relative_lock_height is too high");
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DriverError::InvalidPoolState(problems.join(", ")))
        }
    }

    /// Streamable encoding, as stored under the `p` key of the launcher solution.
    pub fn to_bytes(&self) -> Vec<u8> {
        let url = self.pool_url.as_deref();
        let mut bytes = Vec::with_capacity(1 + 1 + 32 + 48 + 5 + url.map_or(0, str::len) + 4);

        bytes.push(self.version);
        bytes.push(self.state);
        bytes.extend_from_slice(self.target_puzzle_hash.as_ref());
        bytes.extend_from_slice(&self.owner_pubkey.to_bytes());
        match url {
            Some(url) => {
                bytes.push(1);
                bytes.extend_from_slice(&(url.len() as u32).to_be_bytes());
                bytes.extend_from_slice(url.as_bytes());
            }
            None => bytes.push(0),
        }
        bytes.extend_from_slice(&self.relative_lock_height.to_be_bytes());

        bytes
    }
}
