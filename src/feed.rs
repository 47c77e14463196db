//! Funding a new wallet from an existing, already-synced wallet service.

use std::time::Duration;

use chia::protocol::{Bytes32, Coin};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{DriverError, DriverResult};
use crate::poller::{Clock, SubmissionPoller};
use crate::rpc::WalletRpc;

/// Which wallet pays, and how much it sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Wallet id within the feeding key (`1` is the standard XCH wallet).
    pub id: u32,
    pub fingerprint: u32,
    pub feed_amount: u64,
    #[serde(default)]
    pub fee: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            id: 1,
            fingerprint: 0,
            feed_amount: 100,
            fee: 0,
        }
    }
}

/// Sends `feed_amount` to a fresh address and waits until it lands.
pub struct FeedWallet<'a> {
    rpc: &'a dyn WalletRpc,
    settings: FeedSettings,
}

impl<'a> FeedWallet<'a> {
    pub fn new(rpc: &'a dyn WalletRpc, settings: FeedSettings) -> Self {
        Self { rpc, settings }
    }

    /// Fund `address` and return the coin created for `puzzle_hash`.
    #[instrument(skip_all, fields(fingerprint = self.settings.fingerprint, amount = self.settings.feed_amount))]
    pub async fn send_feed_funds<C: Clock>(
        &self,
        address: &str,
        puzzle_hash: Bytes32,
        poller: &SubmissionPoller<C>,
        progress: impl FnMut(Duration),
    ) -> DriverResult<Coin> {
        let login = self.rpc.log_in(self.settings.fingerprint).await?;
        if !login.success {
            return Err(DriverError::FeedWallet(format!(
                "failed to log in to fingerprint {}",
                self.settings.fingerprint
            )));
        }

        let balance = self.rpc.get_wallet_balance(self.settings.id).await?;
        if balance.max_send_amount < self.settings.feed_amount {
            return Err(DriverError::FeedWallet(format!(
                "not enough funds: can send {} mojos, need {}",
                balance.max_send_amount, self.settings.feed_amount
            )));
        }

        let sent = self
            .rpc
            .send_transaction(
                self.settings.id,
                self.settings.feed_amount,
                address,
                self.settings.fee,
            )
            .await?;
        info!(transaction_id = %hex::encode(sent.name), "feed transaction sent");

        let confirmed = poller
            .await_confirmation(self.rpc, self.settings.id, sent.name, progress)
            .await?;
        info!(
            height = confirmed.confirmed_at_height,
            transaction_id = %hex::encode(confirmed.name),
            "feed transaction confirmed"
        );

        let mut additions = confirmed.additions_to(puzzle_hash);
        match additions.len() {
            1 => Ok(additions.remove(0)),
            n => Err(DriverError::FeedWallet(format!(
                "expected one coin for the new wallet, found {}",
                n
            ))),
        }
    }
}
