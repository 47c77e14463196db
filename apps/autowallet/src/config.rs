//! `config.json`: where the services live and how the plot-NFT is set up.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotnft_driver::rpc::ChiaTls;
use plotnft_driver::{FeedSettings, PollConfig, PoolSingletonState, DEFAULT_DELAY_TIME};
use plotnft_wallet::Network;
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = "auto_chia_wallet";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: String,
    /// Address prefix for every address printed or recorded.
    pub prefix: String,
    pub output_dir: PathBuf,
    pub ssl: SslConfig,
    pub full_node: ServiceInfo,
    pub feed_wallet: FeedWalletInfo,
    pub pool_info: PoolConfig,
    pub poll: PollConfig,
    pub rpc_timeout_secs: u64,
    /// Seconds before the delay puzzle hash may claim pool rewards.
    pub delay_time: u64,
    /// Fee paid by the launch transaction.
    pub fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub root_path: PathBuf,
    /// Client certificate, relative to `root_path`.
    pub crt: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub hostname: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedWalletInfo {
    #[serde(flatten)]
    pub settings: FeedSettings,
    pub hostname: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// `SELF_POOLING` or `FARMING_TO_POOL`.
    pub state: String,
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Mainnet.to_string(),
            prefix: Network::Mainnet.address_prefix().to_string(),
            output_dir: PathBuf::from("./"),
            ssl: SslConfig::default(),
            full_node: ServiceInfo {
                hostname: "localhost".into(),
                port: 8555,
            },
            feed_wallet: FeedWalletInfo::default(),
            pool_info: PoolConfig::default(),
            poll: PollConfig::default(),
            rpc_timeout_secs: 30,
            delay_time: DEFAULT_DELAY_TIME,
            fee: 0,
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        let root_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chia")
            .join("mainnet");
        Self {
            root_path,
            crt: PathBuf::from("config/ssl/daemon/private_daemon.crt"),
            key: PathBuf::from("config/ssl/daemon/private_daemon.key"),
        }
    }
}

impl Default for FeedWalletInfo {
    fn default() -> Self {
        Self {
            settings: FeedSettings::default(),
            hostname: "localhost".into(),
            port: 9256,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            state: PoolSingletonState::SelfPooling.name().into(),
            url: String::new(),
        }
    }
}

impl Config {
    /// `<config dir>/auto_chia_wallet/config.json`
    pub fn path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not find config directory")?;
        Ok(dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            anyhow::bail!(
                "No '{}' file exists at: '{}'. Please run: 'autowallet init'",
                CONFIG_FILE,
                path.display()
            );
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&json)
            .with_context(|| format!("Config file at '{}' is malformed", path.display()))?;
        config
            .poll
            .validate()
            .with_context(|| format!("Config file at '{}' has a bad 'poll' section", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn network(&self) -> Result<Network> {
        self.network
            .parse()
            .with_context(|| format!("Invalid network '{}'", self.network))
    }

    pub fn pool_state(&self) -> Result<PoolSingletonState> {
        self.pool_info
            .state
            .parse()
            .with_context(|| format!("Invalid pool state '{}'", self.pool_info.state))
    }

    pub fn pool_url(&self) -> Option<&str> {
        Some(self.pool_info.url.trim_end_matches('/')).filter(|url| !url.is_empty())
    }

    pub fn tls(&self) -> ChiaTls {
        ChiaTls::under_root(&self.ssl.root_path, &self.ssl.crt, &self.ssl.key)
    }
}
