//! Key generation and the plot-NFT launch flow.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use plotnft_driver::rpc::{NodeRpc, WalletRpc};
use plotnft_driver::{
    Bytes32, Clock, FeedWallet, LaunchRequest, LaunchedPlotNft, LauncherSpendBuilder, PoolState,
    SpendContext, SubmissionPoller,
};
use plotnft_wallet::{Address, KeyDerivation, KeyRegistry, Network, PublicKey, Signer};
use tracing::{info, warn};

use crate::config::Config;
use crate::output::{ErrorRecord, Output, PlotNftRecord, WalletRecord};

/// Keys of the wallet being set up.
pub struct Session {
    mnemonic: String,
    keys: KeyRegistry,
    prefix: String,
}

impl Session {
    pub fn generate(prefix: &str) -> Result<Self> {
        let mnemonic = KeyDerivation::generate_mnemonic()?;
        Self::from_mnemonic(&mnemonic, prefix)
    }

    pub fn from_mnemonic(mnemonic: &str, prefix: &str) -> Result<Self> {
        let keys = KeyRegistry::from_mnemonic(mnemonic.trim()).context("Invalid mnemonic")?;
        info!(fingerprint = keys.fingerprint(), "derived wallet keys");
        Ok(Self {
            mnemonic: mnemonic.trim().to_string(),
            keys,
            prefix: prefix.to_string(),
        })
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn fingerprint(&self) -> u32 {
        self.keys.fingerprint()
    }

    pub fn first_address(&self) -> Result<Address> {
        Ok(Address::from_puzzle_hash(self.keys.first_puzzle_hash(), &self.prefix)?)
    }

    /// Singleton owner key and the puzzle hash self-pooling rewards go to.
    pub fn pool_owner(&self) -> (PublicKey, Bytes32) {
        (self.keys.owner_public_key(OWNER_KEY_INDEX), self.keys.payout_puzzle_hash())
    }

    pub fn wallet_record(&self) -> Result<WalletRecord> {
        Ok(WalletRecord {
            mnemonic: self.mnemonic.clone(),
            fingerprint: self.fingerprint(),
            first_address: self.first_address()?.to_string(),
        })
    }

    /// Error output that still lets the user recover the wallet.
    pub fn error_record(&self, failure: &LaunchFailure) -> ErrorRecord {
        ErrorRecord {
            message: format!("{:#}", failure.error),
            mnemonic: Some(self.mnemonic.clone()),
            first_address: self.first_address().ok().map(|address| address.to_string()),
            launcher_id: failure.launcher_id.map(hex::encode),
        }
    }

    /// Output record for a launched plot-NFT, not yet confirmed.
    pub fn record(&self, pool_url: Option<&str>, launched: &LaunchedPlotNft) -> Result<PlotNftRecord> {
        Ok(PlotNftRecord {
            mnemonic: self.mnemonic.clone(),
            pool_url: pool_url.unwrap_or_default().to_string(),
            xch_payout_address: self.first_address()?.to_string(),
            launcher_id: hex::encode(launched.launcher_id),
            farmer_key: hex::encode(self.keys.farmer_public_key().to_bytes()),
            singleton_puzzle_hash: hex::encode(launched.singleton_puzzle_hash),
            pool_puzzle_hash: hex::encode(launched.p2_singleton_puzzle_hash),
            pool_address: Address::from_puzzle_hash(launched.p2_singleton_puzzle_hash, &self.prefix)?
                .to_string(),
            confirmed: false,
        })
    }
}

/// Pool wallet index of the singleton owner key.
pub const OWNER_KEY_INDEX: u32 = 0;

/// A failed launch, with the launcher id once one was built.
#[derive(Debug)]
pub struct LaunchFailure {
    pub launcher_id: Option<Bytes32>,
    pub error: anyhow::Error,
}

impl LaunchFailure {
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            launcher_id: None,
            error: error.into(),
        }
    }

    fn launched(launcher_id: Bytes32, error: impl Into<anyhow::Error>) -> Self {
        Self {
            launcher_id: Some(launcher_id),
            error: error.into(),
        }
    }
}

/// The remote services a launch talks to.
pub struct Services<'a, C> {
    pub node: &'a dyn NodeRpc,
    /// Funds the new wallet when present; otherwise the user does.
    pub feed: Option<&'a dyn WalletRpc>,
    pub poller: &'a SubmissionPoller<C>,
}

fn print_waiting(what: &str) -> impl FnMut(Duration) + '_ {
    move |elapsed| {
        print!(
            "\r  {} Waiting for {}... {}s elapsed   ",
            style("⏳").yellow(),
            what,
            elapsed.as_secs()
        );
        std::io::stdout().flush().ok();
    }
}

/// Fund the session's first address, launch the plot-NFT and record it.
///
/// The record is saved as soon as the node accepts the bundle. When
/// `wait_for_singleton` is set the singleton is then awaited; running out of
/// time there leaves the record unconfirmed rather than failing.
pub async fn launch_plotnft<C: Clock>(
    config: &Config,
    session: &mut Session,
    pool_state: PoolState,
    services: Services<'_, C>,
    wait_for_singleton: bool,
) -> Result<PlotNftRecord, LaunchFailure> {
    let network: Network = config.network().map_err(LaunchFailure::new)?;
    let first_address = session.first_address().map_err(LaunchFailure::new)?;
    let first_puzzle_hash = session.keys.first_puzzle_hash();
    let poller = services.poller;

    let funding_coins = match services.feed {
        Some(wallet) => {
            println!("Funding {} from feed wallet...", first_address);
            let coin = FeedWallet::new(wallet, config.feed_wallet.settings.clone())
                .send_feed_funds(
                    &first_address.to_string(),
                    first_puzzle_hash,
                    poller,
                    print_waiting("feed transaction"),
                )
                .await
                .map_err(LaunchFailure::new)?;
            println!();
            vec![coin]
        }
        None => {
            println!(
                "Send at least {} mojos to {}",
                config.fee + 1,
                style(&first_address).cyan()
            );
            let coins = poller
                .await_funds(services.node, first_puzzle_hash, config.fee + 1, print_waiting("funds"))
                .await
                .map_err(LaunchFailure::new)?;
            println!();
            coins
        }
    };

    let delay_puzzle_hash = session.keys.delay_puzzle_hash();
    let change_puzzle_hash = session.keys.payout_puzzle_hash();
    let request = LaunchRequest {
        funding_coins,
        pool_state,
        delay_time: config.delay_time,
        delay_puzzle_hash,
        change_puzzle_hash,
        fee: config.fee,
    };

    let ctx = &mut SpendContext::new();
    let launched = LauncherSpendBuilder::new(&mut session.keys, Signer::new(network))
        .build(ctx, &request)
        .map_err(LaunchFailure::new)?;
    let launcher_id = launched.launcher_id;
    println!("  Launcher ID: 0x{}", hex::encode(launcher_id));

    println!("  Broadcasting transaction...");
    let transaction_id = poller
        .submit(services.node, &launched.spend_bundle)
        .await
        .map_err(|e| LaunchFailure::launched(launcher_id, e))?;
    println!("  Submitted spend bundle: 0x{}", hex::encode(transaction_id));

    let mut record = session
        .record(config.pool_url(), &launched)
        .map_err(|e| LaunchFailure::launched(launcher_id, e))?;
    let path = Output::Success(record.clone())
        .write_to(&config.output_dir)
        .map_err(|e| LaunchFailure::launched(launcher_id, e))?;
    if let Some(path) = path {
        println!("  Saved record to {}", path.display());
    }

    if !wait_for_singleton {
        return Ok(record);
    }

    let singleton = launched.singleton_coin();
    match poller
        .await_coin(
            services.node,
            singleton.puzzle_hash,
            singleton.coin_id(),
            print_waiting("plot-NFT confirmation"),
        )
        .await
    {
        Ok(_) => {
            println!();
            println!("{} Plot-NFT created and confirmed!", style("✓").green().bold());
            record.confirmed = true;
        }
        Err(e) => {
            println!();
            warn!(launcher_id = %hex::encode(launcher_id), "plot-NFT not confirmed yet: {}", e);
            println!(
                "{} Plot-NFT submitted but not confirmed yet; check launcher 0x{} later",
                style("!").yellow().bold(),
                hex::encode(launcher_id)
            );
        }
    }

    Ok(record)
}
