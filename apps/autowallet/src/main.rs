//! Autowallet - generate a fresh Chia wallet and launch a pool plot-NFT from it.
//!
//! Usage:
//!   autowallet config                        # Print the config file location
//!   autowallet init [--force]                # Write a default config file
//!   autowallet generate key                  # Create a new mnemonic and first address
//!   autowallet generate plotnft [--feed]     # Create a wallet and launch a plot-NFT
//!   autowallet generate plotnft -m           # ...from an existing mnemonic
//!   autowallet generate plotnft --no-wait    # ...without waiting for the singleton

mod config;
mod flow;
mod output;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Password};
use plotnft_driver::rpc::{FullNodeClient, WalletClient, WalletRpc};
use plotnft_driver::{resolve_initial_state, PoolInfoClient, SubmissionPoller};

use crate::config::Config;
use crate::flow::{LaunchFailure, Services, Session};
use crate::output::{ErrorRecord, Output};

#[derive(Parser)]
#[command(name = "autowallet")]
#[command(about = "Chia wallet and plot-NFT generator")]
#[command(version)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the config file location
    Config,

    /// Write a default config file
    Init {
        /// Overwrite an existing file without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Generate a new key, or a plot-NFT
    Generate {
        #[command(subcommand)]
        target: GenerateTarget,
    },
}

#[derive(Subcommand)]
enum GenerateTarget {
    /// Generate a new account
    Key,

    /// Create a plot-NFT
    Plotnft {
        /// Use an existing mnemonic instead of generating one
        #[arg(short = 'm', long = "existing")]
        existing: bool,
        #[arg(long, env = "AUTOWALLET_MNEMONIC", hide_env_values = true)]
        mnemonic: Option<String>,
        /// Fund the new wallet from the configured feed wallet
        #[arg(long)]
        feed: bool,
        /// Exit once the node accepts the launch instead of waiting for the singleton
        #[arg(long)]
        no_wait: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Config => show_config_path(),
        Commands::Init { force } => init_config(force),
        Commands::Generate { target } => match target {
            GenerateTarget::Key => generate_key(),
            GenerateTarget::Plotnft {
                existing,
                mnemonic,
                feed,
                no_wait,
            } => generate_plotnft(existing, mnemonic, feed, !no_wait).await,
        },
    }
}

fn show_config_path() -> Result<()> {
    let path = Config::path()?;
    if path.exists() {
        println!("{}", path.display());
    } else {
        println!("No config file exists at expected location: '{}'", path.display());
        println!("To generate a default config file, run: 'autowallet init'");
    }
    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let path = Config::path()?;
    if path.exists() && !force {
        let overwrite = Confirm::new()
            .with_prompt(format!("A config file already exists at '{}'. Overwrite it?", path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Exited without overwriting file");
            return Ok(());
        }
    }

    Config::default().save_to(&path)?;
    println!("{} Wrote default config to: {}", style("✓").green().bold(), path.display());
    Ok(())
}

fn generate_key() -> Result<()> {
    let config = Config::load()?;
    println!("Generating new key...");
    let session = Session::generate(&config.prefix)?;

    println!("{} Key generated!", style("✓").green().bold());
    println!("  Fingerprint: {}", session.fingerprint());
    println!("  First Address: {}", session.first_address()?);
    println!();
    println!("{}", style("IMPORTANT: Back up your mnemonic!").yellow().bold());
    println!("  {}", session.mnemonic());
    Ok(())
}

async fn generate_plotnft(existing: bool, mnemonic: Option<String>, feed: bool, wait: bool) -> Result<()> {
    let config = Config::load()?;

    let mnemonic = match mnemonic {
        Some(words) => Some(words),
        None if existing => Some(Password::new().with_prompt("Mnemonic").interact()?),
        None => None,
    };

    let output = match open_session(&config, mnemonic.as_deref()) {
        Ok(mut session) => match run_plotnft(&config, &mut session, feed, wait).await {
            Ok(record) => Output::Success(record),
            Err(failure) => {
                tracing::error!("plot-NFT creation failed: {:#}", failure.error);
                Output::Error(session.error_record(&failure))
            }
        },
        Err(e) => {
            tracing::error!("plot-NFT creation failed: {:#}", e);
            Output::Error(ErrorRecord::new(format!("{:#}", e)))
        }
    };

    println!("{}", output.to_json()?);
    if let Some(path) = output.write_to(&config.output_dir)? {
        println!("Saved to {}", path.display());
    }
    Ok(())
}

/// Derive the wallet and save its mnemonic before anything can go wrong.
fn open_session(config: &Config, mnemonic: Option<&str>) -> Result<Session> {
    let session = match mnemonic {
        Some(words) => Session::from_mnemonic(words, &config.prefix)?,
        None => {
            println!("Generating new key...");
            let session = Session::generate(&config.prefix)?;
            println!("{}", style("IMPORTANT: Back up your mnemonic!").yellow().bold());
            println!("  {}", session.mnemonic());
            session
        }
    };
    println!("  Fingerprint: {}", session.fingerprint());
    println!("  First Address: {}", session.first_address()?);

    let path = session.wallet_record()?.write_to(&config.output_dir)?;
    println!("  Wallet saved to {}", path.display());
    Ok(session)
}

async fn run_plotnft(
    config: &Config,
    session: &mut Session,
    feed: bool,
    wait: bool,
) -> Result<output::PlotNftRecord, LaunchFailure> {
    let timeout = Duration::from_secs(config.rpc_timeout_secs);
    let tls = config.tls();

    println!("Resolving pool state...");
    let (owner, payout_puzzle_hash) = session.pool_owner();
    let pool_client = PoolInfoClient::new(timeout).map_err(LaunchFailure::new)?;
    let pool_state = resolve_initial_state(
        &pool_client,
        config.pool_state().map_err(LaunchFailure::new)?,
        config.pool_url(),
        owner,
        payout_puzzle_hash,
    )
    .await
    .map_err(LaunchFailure::new)?;

    let node = FullNodeClient::new(&config.full_node.hostname, config.full_node.port, &tls, timeout)
        .context("Failed to create full node client")
        .map_err(LaunchFailure::new)?;
    let feed_wallet = if feed {
        let wallet = WalletClient::new(
            &config.feed_wallet.hostname,
            config.feed_wallet.port,
            &tls,
            timeout,
        )
        .context("Failed to create wallet client")
        .map_err(LaunchFailure::new)?;
        Some(wallet)
    } else {
        None
    };
    let poller = SubmissionPoller::new(config.poll);

    let services = Services {
        node: &node,
        feed: feed_wallet.as_ref().map(|wallet| wallet as &dyn WalletRpc),
        poller: &poller,
    };
    flow::launch_plotnft(config, session, pool_state, services, wait).await
}
