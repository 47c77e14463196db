//! Pool endpoint lookup and initial pool state resolution.

use std::time::Duration;

use chia::bls::PublicKey;
use chia::protocol::Bytes32;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{DriverError, DriverResult};
use crate::pool::state::{PoolSingletonState, PoolState, MAX_RELATIVE_LOCK_HEIGHT, POOL_PROTOCOL_VERSION};

/// `GET {pool_url}/pool_info` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub protocol_version: u8,
    pub relative_lock_height: u32,
    pub target_puzzle_hash: String,
    #[serde(default)]
    pub minimum_difficulty: Option<u64>,
}

impl PoolInfo {
    /// Reject pools this wallet cannot join.
    pub fn validate(&self) -> DriverResult<()> {
        if self.relative_lock_height > MAX_RELATIVE_LOCK_HEIGHT {
            return Err(DriverError::PoolEndpoint(format!(
                "relative lock height too high for this pool, cannot join: {}",
                self.relative_lock_height
            )));
        }
        if self.protocol_version != POOL_PROTOCOL_VERSION {
            return Err(DriverError::PoolEndpoint(format!(
                "unsupported pool protocol version {}, expected {}",
                self.protocol_version, POOL_PROTOCOL_VERSION
            )));
        }
        Ok(())
    }

    pub fn target_puzzle_hash(&self) -> DriverResult<Bytes32> {
        let hex_str = self.target_puzzle_hash.trim();
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)
            .map_err(|e| DriverError::PoolEndpoint(format!("invalid target_puzzle_hash: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            DriverError::PoolEndpoint(format!(
                "target_puzzle_hash must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Bytes32::new(bytes))
    }
}

/// Fetches `pool_info` documents over HTTPS.
#[derive(Debug, Clone)]
pub struct PoolInfoClient {
    http: reqwest::Client,
}

impl PoolInfoClient {
    pub fn new(timeout: Duration) -> DriverResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self, pool_url: &str) -> DriverResult<PoolInfo> {
        let url = format!("{}/pool_info", pool_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DriverError::PoolEndpoint(format!("{}: {}", url, e)))?
            .error_for_status()
            .map_err(|e| DriverError::PoolEndpoint(format!("{}: {}", url, e)))?;

        let pool_info: PoolInfo = response
            .json()
            .await
            .map_err(|e| DriverError::PoolEndpoint(format!("invalid pool_info from {}: {}", url, e)))?;

        debug!(?pool_info, "fetched pool info");
        pool_info.validate()?;
        Ok(pool_info)
    }
}

/// Build and verify the state a new plot-NFT starts in.
///
/// Self-pooling needs no network access. Farming to a pool reads the target
/// puzzle hash and lock height from the pool's `pool_info`.
pub async fn resolve_initial_state(
    client: &PoolInfoClient,
    state: PoolSingletonState,
    pool_url: Option<&str>,
    owner_pubkey: PublicKey,
    owner_puzzle_hash: Bytes32,
) -> DriverResult<PoolState> {
    let pool_state = match state {
        PoolSingletonState::SelfPooling => PoolState::self_pooling(owner_pubkey, owner_puzzle_hash),
        PoolSingletonState::FarmingToPool => {
            let pool_url = pool_url.filter(|url| !url.is_empty()).ok_or_else(|| {
                DriverError::InvalidPoolState("FARMING_TO_POOL requires a pool url".into())
            })?;
            let pool_info = client.fetch(pool_url).await?;
            PoolState::farming_to_pool(
                owner_pubkey,
                pool_info.target_puzzle_hash()?,
                pool_url,
                pool_info.relative_lock_height,
            )
        }
        PoolSingletonState::LeavingPool => {
            return Err(DriverError::InvalidInitialState(
                "initial state must be SELF_POOLING or FARMING_TO_POOL".into(),
            ))
        }
    };

    pool_state.verify()?;
    info!(state = %state, "resolved initial pool state");
    Ok(pool_state)
}
