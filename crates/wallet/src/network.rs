//! Network selection: signing constants, genesis challenge and address prefix.

use std::fmt;
use std::str::FromStr;

use chia::protocol::Bytes32;
use chia_wallet_sdk::signer::AggSigConstants;
use chia_wallet_sdk::types::{MAINNET_CONSTANTS, TESTNET11_CONSTANTS};

use crate::error::WalletError;

/// Chia network a session targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    /// Mainnet
    #[default]
    Mainnet,
    /// Testnet11
    Testnet11,
}

impl Network {
    /// AGG_SIG domain constants for this network.
    pub fn agg_sig_constants(&self) -> AggSigConstants {
        match self {
            Network::Mainnet => AggSigConstants::from(&*MAINNET_CONSTANTS),
            Network::Testnet11 => AggSigConstants::from(&*TESTNET11_CONSTANTS),
        }
    }

    /// Genesis challenge of this network.
    pub fn genesis_challenge(&self) -> Bytes32 {
        match self {
            Network::Mainnet => MAINNET_CONSTANTS.genesis_challenge,
            Network::Testnet11 => TESTNET11_CONSTANTS.genesis_challenge,
        }
    }

    /// Default bech32m prefix for addresses on this network.
    pub fn address_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "xch",
            Network::Testnet11 => "txch",
        }
    }

    /// Whether this is a test network.
    pub fn is_testnet(&self) -> bool {
        matches!(self, Network::Testnet11)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet11 => write!(f, "testnet11"),
        }
    }
}

impl FromStr for Network {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" | "testnet11" => Ok(Network::Testnet11),
            other => Err(WalletError::UnknownNetwork(other.to_string())),
        }
    }
}
