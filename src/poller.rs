//! Bundle submission and confirmation polling.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chia::protocol::{Bytes32, Coin, SpendBundle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{DriverError, DriverResult};
use crate::rpc::{CoinRecord, NodeRpc, TransactionRecord, WalletRpc};

/// Source of waiting between polls.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How often to poll and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(with = "secs", rename = "interval_secs")]
    pub interval: Duration,
    #[serde(with = "secs", rename = "max_wait_secs")]
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    /// A wait only ends on time if every poll moves the clock forward.
    pub fn validate(&self) -> DriverResult<()> {
        if self.interval.is_zero() {
            return Err(DriverError::InvalidPollConfig(
                "interval must be at least one second".into(),
            ));
        }
        Ok(())
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Pushes bundles to a node and waits for the chain to reflect them.
///
/// Every wait checks once immediately, then once per interval. A wait gives up
/// with [`DriverError::ConfirmationTimeout`] rather than sleep past
/// `max_wait`. Errors while checking are logged and the wait goes on.
#[derive(Debug, Clone)]
pub struct SubmissionPoller<C = TokioClock> {
    clock: C,
    config: PollConfig,
}

impl SubmissionPoller<TokioClock> {
    pub fn new(config: PollConfig) -> Self {
        Self::with_clock(TokioClock, config)
    }
}

impl<C: Clock> SubmissionPoller<C> {
    pub fn with_clock(clock: C, config: PollConfig) -> Self {
        Self { clock, config }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Push `spend_bundle`; its name is the transaction id. Not retried.
    #[instrument(skip_all)]
    pub async fn submit(&self, node: &dyn NodeRpc, spend_bundle: &SpendBundle) -> DriverResult<Bytes32> {
        let response = node.push_tx(spend_bundle).await?;
        if !response.is_success() {
            let reason = response.error.unwrap_or(response.status);
            warn!(%reason, "spend bundle rejected");
            return Err(DriverError::RejectedByNode(reason));
        }

        let transaction_id = spend_bundle.name();
        info!(transaction_id = %hex::encode(transaction_id), "spend bundle accepted");
        Ok(transaction_id)
    }

    /// Wait until the wallet reports `transaction_id` as confirmed.
    pub async fn await_confirmation(
        &self,
        wallet: &dyn WalletRpc,
        wallet_id: u32,
        transaction_id: Bytes32,
        progress: impl FnMut(Duration),
    ) -> DriverResult<TransactionRecord> {
        self.poll(
            move || async move {
                let record = wallet.get_transaction(wallet_id, transaction_id).await?;
                Ok(record.confirmed.then_some(record))
            },
            progress,
        )
        .await
    }

    /// Wait until the node holds `coin_id` as an unspent coin of `puzzle_hash`.
    pub async fn await_coin(
        &self,
        node: &dyn NodeRpc,
        puzzle_hash: Bytes32,
        coin_id: Bytes32,
        progress: impl FnMut(Duration),
    ) -> DriverResult<CoinRecord> {
        self.poll(
            move || async move {
                let records = node.get_coin_records_by_puzzle_hash(puzzle_hash, false).await?;
                Ok(records.into_iter().find(|record| record.coin.coin_id() == coin_id))
            },
            progress,
        )
        .await
    }

    /// Wait until unspent coins of `puzzle_hash` total at least `minimum`.
    pub async fn await_funds(
        &self,
        node: &dyn NodeRpc,
        puzzle_hash: Bytes32,
        minimum: u64,
        progress: impl FnMut(Duration),
    ) -> DriverResult<Vec<Coin>> {
        self.poll(
            move || async move {
                let coins: Vec<Coin> = node
                    .get_coin_records_by_puzzle_hash(puzzle_hash, false)
                    .await?
                    .into_iter()
                    .filter(|record| !record.spent)
                    .map(|record| record.coin)
                    .collect();
                let total: u128 = coins.iter().map(|coin| coin.amount as u128).sum();
                Ok((!coins.is_empty() && total >= minimum as u128).then_some(coins))
            },
            progress,
        )
        .await
    }

    async fn poll<T, F, Fut>(&self, mut check: F, mut progress: impl FnMut(Duration)) -> DriverResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<Option<T>>>,
    {
        self.config.validate()?;
        let PollConfig { interval, max_wait } = self.config;
        let mut waited = Duration::ZERO;

        loop {
            match check().await {
                Ok(Some(found)) => {
                    debug!(waited_secs = waited.as_secs(), "poll satisfied");
                    return Ok(found);
                }
                Ok(None) => {}
                Err(e) => debug!("poll error: {}", e),
            }

            if waited + interval > max_wait {
                return Err(DriverError::ConfirmationTimeout { waited });
            }
            self.clock.sleep(interval).await;
            waited += interval;
            progress(waited);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{LogInResponse, PushTxResponse, WalletBalance};
    use chia::bls::Signature;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records requested sleeps without waiting.
    #[derive(Default)]
    struct FakeClock {
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl<'a> Clock for &'a FakeClock {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    struct ScriptedWallet {
        confirmations: Mutex<VecDeque<bool>>,
        calls: Mutex<u32>,
    }

    impl ScriptedWallet {
        fn new(confirmations: &[bool]) -> Self {
            Self {
                confirmations: Mutex::new(confirmations.iter().copied().collect()),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl WalletRpc for ScriptedWallet {
        async fn log_in(&self, fingerprint: u32) -> DriverResult<LogInResponse> {
            Ok(LogInResponse {
                success: true,
                fingerprint: Some(fingerprint),
            })
        }

        async fn get_wallet_balance(&self, wallet_id: u32) -> DriverResult<WalletBalance> {
            Ok(WalletBalance {
                wallet_id,
                confirmed_wallet_balance: 0,
                spendable_balance: 0,
                max_send_amount: 0,
            })
        }

        async fn send_transaction(&self, _: u32, _: u64, _: &str, _: u64) -> DriverResult<TransactionRecord> {
            Err(DriverError::Rpc("not scripted".into()))
        }

        async fn get_transaction(&self, _: u32, transaction_id: Bytes32) -> DriverResult<TransactionRecord> {
            *self.calls.lock().unwrap() += 1;
            let confirmed = self.confirmations.lock().unwrap().pop_front().unwrap_or(false);
            Ok(TransactionRecord {
                name: transaction_id,
                confirmed,
                confirmed_at_height: if confirmed { 10 } else { 0 },
                to_puzzle_hash: Bytes32::default(),
                amount: 1,
                fee_amount: 0,
                additions: Vec::new(),
                removals: Vec::new(),
            })
        }
    }

    struct FakeNode {
        push_status: PushTxResponse,
        /// One entry per poll; `None` answers with an error.
        records: Mutex<VecDeque<Option<Vec<CoinRecord>>>>,
    }

    impl FakeNode {
        fn new(status: &str, error: Option<&str>) -> Self {
            Self {
                push_status: PushTxResponse {
                    status: status.into(),
                    error: error.map(String::from),
                },
                records: Mutex::new(VecDeque::new()),
            }
        }

        fn with_records(self, rounds: Vec<Option<Vec<CoinRecord>>>) -> Self {
            *self.records.lock().unwrap() = rounds.into();
            self
        }
    }

    #[async_trait]
    impl NodeRpc for FakeNode {
        async fn push_tx(&self, _: &SpendBundle) -> DriverResult<PushTxResponse> {
            Ok(self.push_status.clone())
        }

        async fn get_coin_records_by_puzzle_hash(&self, _: Bytes32, _: bool) -> DriverResult<Vec<CoinRecord>> {
            match self.records.lock().unwrap().pop_front() {
                Some(Some(records)) => Ok(records),
                _ => Err(DriverError::Rpc("node unavailable".into())),
            }
        }
    }

    fn record(coin: Coin) -> CoinRecord {
        CoinRecord {
            coin,
            confirmed_block_index: 5,
            spent_block_index: 0,
            spent: false,
            coinbase: false,
            timestamp: 0,
        }
    }

    fn config() -> PollConfig {
        PollConfig::new(Duration::from_secs(5), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_confirms_after_two_intervals() {
        let clock = FakeClock::default();
        let wallet = ScriptedWallet::new(&[false, false, true]);
        let poller = SubmissionPoller::with_clock(&clock, config());

        let mut reported = Vec::new();
        let record = poller
            .await_confirmation(&wallet, 1, Bytes32::new([9; 32]), |elapsed| reported.push(elapsed))
            .await
            .unwrap();

        assert!(record.confirmed);
        assert_eq!(*wallet.calls.lock().unwrap(), 3);
        assert_eq!(*clock.sleeps.lock().unwrap(), vec![Duration::from_secs(5); 2]);
        assert_eq!(reported, vec![Duration::from_secs(5), Duration::from_secs(10)]);
    }

    #[tokio::test]
    async fn test_immediate_confirmation_never_sleeps() {
        let clock = FakeClock::default();
        let wallet = ScriptedWallet::new(&[true]);
        let poller = SubmissionPoller::with_clock(&clock, config());

        poller
            .await_confirmation(&wallet, 1, Bytes32::new([9; 32]), |_| {})
            .await
            .unwrap();
        assert!(clock.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_times_out_before_exceeding_max_wait() {
        let clock = FakeClock::default();
        let wallet = ScriptedWallet::new(&[false, false, true]);
        let poller = SubmissionPoller::with_clock(
            &clock,
            PollConfig::new(Duration::from_secs(5), Duration::from_secs(7)),
        );

        let err = poller
            .await_confirmation(&wallet, 1, Bytes32::new([9; 32]), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DriverError::ConfirmationTimeout { waited } if waited == Duration::from_secs(5)
        ));
        assert_eq!(clock.sleeps.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected_before_polling() {
        let clock = FakeClock::default();
        let wallet = ScriptedWallet::new(&[]);
        let zero = PollConfig::new(Duration::ZERO, Duration::from_secs(300));
        assert!(zero.validate().is_err());
        let poller = SubmissionPoller::with_clock(&clock, zero);

        let err = poller
            .await_confirmation(&wallet, 1, Bytes32::new([9; 32]), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DriverError::InvalidPollConfig(_)));
        assert_eq!(*wallet.calls.lock().unwrap(), 0);
        assert!(clock.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_advances_paused_time() {
        let wallet = ScriptedWallet::new(&[false, false, true]);
        let poller = SubmissionPoller::new(config());

        let start = tokio::time::Instant::now();
        poller
            .await_confirmation(&wallet, 1, Bytes32::new([9; 32]), |_| {})
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_submit_returns_bundle_name_or_rejection() {
        let bundle = SpendBundle::new(Vec::new(), Signature::default());
        let poller = SubmissionPoller::new(config());

        let accepted = FakeNode::new("SUCCESS", None);
        assert_eq!(poller.submit(&accepted, &bundle).await.unwrap(), bundle.name());

        let rejected = FakeNode::new("FAILED", Some("DOUBLE_SPEND"));
        let err = poller.submit(&rejected, &bundle).await.unwrap_err();
        assert!(matches!(err, DriverError::RejectedByNode(reason) if reason == "DOUBLE_SPEND"));

        let pending = FakeNode::new("PENDING", None);
        let err = poller.submit(&pending, &bundle).await.unwrap_err();
        assert!(matches!(err, DriverError::RejectedByNode(reason) if reason == "PENDING"));
    }

    #[tokio::test]
    async fn test_await_coin_survives_node_errors() {
        let clock = FakeClock::default();
        let singleton = Coin::new(Bytes32::new([1; 32]), Bytes32::new([2; 32]), 1);
        let other = Coin::new(Bytes32::new([3; 32]), Bytes32::new([2; 32]), 1);
        let node = FakeNode::new("SUCCESS", None).with_records(vec![
            None,
            Some(vec![record(other)]),
            Some(vec![record(other), record(singleton)]),
        ]);
        let poller = SubmissionPoller::with_clock(&clock, config());

        let found = poller
            .await_coin(&node, singleton.puzzle_hash, singleton.coin_id(), |_| {})
            .await
            .unwrap();
        assert_eq!(found.coin, singleton);
        assert_eq!(clock.sleeps.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_await_funds_waits_for_minimum() {
        let clock = FakeClock::default();
        let small = Coin::new(Bytes32::new([1; 32]), Bytes32::new([2; 32]), 40);
        let more = Coin::new(Bytes32::new([3; 32]), Bytes32::new([2; 32]), 70);
        let node = FakeNode::new("SUCCESS", None).with_records(vec![
            Some(vec![]),
            Some(vec![record(small)]),
            Some(vec![record(small), record(more)]),
        ]);
        let poller = SubmissionPoller::with_clock(&clock, config());

        let coins = poller
            .await_funds(&node, Bytes32::new([2; 32]), 100, |_| {})
            .await
            .unwrap();
        assert_eq!(coins, vec![small, more]);
        assert_eq!(clock.sleeps.lock().unwrap().len(), 2);
    }
}
