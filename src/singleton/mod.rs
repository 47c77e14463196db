//! Singleton launch for pool plot-NFTs
//!
//! - [`LauncherSpendBuilder`] - builds and signs the launch bundle
//! - [`LaunchedPlotNft`] - the bundle plus the identities it creates
//! - [`LauncherSolution`], [`PoolExtraData`] - the launcher's solution layout

mod launcher;
mod types;

pub use launcher::{LaunchRequest, LauncherSpendBuilder, SINGLETON_AMOUNT};
pub use types::{LaunchedPlotNft, LauncherSolution, PoolExtraData};
