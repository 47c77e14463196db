//! The JSON records printed (and saved) by a plot-NFT run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Everything needed to farm with the new plot-NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotNftRecord {
    pub mnemonic: String,
    pub pool_url: String,
    pub xch_payout_address: String,
    pub launcher_id: String,
    pub farmer_key: String,
    pub singleton_puzzle_hash: String,
    /// Puzzle hash to create plots against.
    pub pool_puzzle_hash: String,
    pub pool_address: String,
    /// Whether the singleton coin was seen on chain before the run ended.
    pub confirmed: bool,
}

/// What is known about a run that failed. Enough to recover any funds sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launcher_id: Option<String>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Written as soon as a wallet exists, before any funds are asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub mnemonic: String,
    pub fingerprint: u32,
    pub first_address: String,
}

impl WalletRecord {
    /// Save as `wallet_<fingerprint>.json` under `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        write_json(dir, &format!("wallet_{}.json", self.fingerprint), self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum Output {
    Success(PlotNftRecord),
    Error(ErrorRecord),
}

impl Output {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save a successful record as `<launcher_id>.json` under `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let Output::Success(record) = self else {
            return Ok(None);
        };
        write_json(dir, &format!("{}.json", record.launcher_id), self).map(Some)
    }
}

fn write_json<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
