//! HTTPS JSON clients for the Chia full node and wallet services.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chia::protocol::{Bytes32, SpendBundle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::types::{
    CoinRecord, CoinRecordsByPuzzleHashRequest, CoinRecordsResponse, GetTransactionRequest,
    LogInRequest, LogInResponse, PushTxRequest, PushTxResponse, SendTransactionRequest,
    TransactionRecord, TransactionResponse, WalletBalance, WalletBalanceResponse, WalletIdRequest,
};
use super::{NodeRpc, WalletRpc};
use crate::error::{DriverError, DriverResult};

/// Client certificate presented to the services.
///
/// Chia services sign their certificates with a private CA, so the server
/// certificate is not verified.
#[derive(Debug, Clone)]
pub struct ChiaTls {
    pub crt: PathBuf,
    pub key: PathBuf,
}

impl ChiaTls {
    pub fn new(crt: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            crt: crt.into(),
            key: key.into(),
        }
    }

    /// Paths relative to `root_path` are resolved against it.
    pub fn under_root(root_path: &Path, crt: &Path, key: &Path) -> Self {
        Self::new(root_path.join(crt), root_path.join(key))
    }

    fn identity(&self) -> DriverResult<reqwest::Identity> {
        let mut pem = std::fs::read(&self.crt)
            .map_err(|e| DriverError::Rpc(format!("reading {}: {}", self.crt.display(), e)))?;
        pem.push(b'\n');
        pem.extend(
            std::fs::read(&self.key)
                .map_err(|e| DriverError::Rpc(format!("reading {}: {}", self.key.display(), e)))?,
        );
        Ok(reqwest::Identity::from_pem(&pem)?)
    }

    fn client(&self, timeout: Duration) -> DriverResult<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .identity(self.identity()?)
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?)
    }
}

#[derive(Debug, Clone)]
struct RpcClient {
    base_url: String,
    http: reqwest::Client,
}

impl RpcClient {
    fn new(hostname: &str, port: u16, tls: &ChiaTls, timeout: Duration) -> DriverResult<Self> {
        Ok(Self {
            base_url: format!("https://{}:{}", hostname, port),
            http: tls.client(timeout)?,
        })
    }

    async fn call_raw<Req: Serialize + ?Sized>(&self, endpoint: &str, request: &Req) -> DriverResult<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let value: Value = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(endpoint, "rpc response received");
        Ok(value)
    }

    async fn call<Req, Resp>(&self, endpoint: &str, request: &Req) -> DriverResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let value = self.call_raw(endpoint, request).await?;
        parse_response(endpoint, value)
    }
}

/// Reject `{"success": false, "error": ...}` answers, then decode the body.
fn parse_response<Resp: DeserializeOwned>(endpoint: &str, value: Value) -> DriverResult<Resp> {
    if let Some(error) = rpc_failure(&value) {
        return Err(DriverError::Rpc(format!("{}: {}", endpoint, error)));
    }
    serde_json::from_value(value)
        .map_err(|e| DriverError::Rpc(format!("{}: unexpected response: {}", endpoint, e)))
}

fn rpc_failure(value: &Value) -> Option<String> {
    match value.get("success") {
        Some(Value::Bool(false)) => Some(
            value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        ),
        _ => None,
    }
}

/// Full node RPC over HTTPS (default port 8555).
#[derive(Debug, Clone)]
pub struct FullNodeClient {
    rpc: RpcClient,
}

impl FullNodeClient {
    pub fn new(hostname: &str, port: u16, tls: &ChiaTls, timeout: Duration) -> DriverResult<Self> {
        Ok(Self {
            rpc: RpcClient::new(hostname, port, tls, timeout)?,
        })
    }
}

#[async_trait]
impl NodeRpc for FullNodeClient {
    #[instrument(skip_all, fields(spends = spend_bundle.coin_spends.len()))]
    async fn push_tx(&self, spend_bundle: &SpendBundle) -> DriverResult<PushTxResponse> {
        let value = self
            .rpc
            .call_raw("push_tx", &PushTxRequest { spend_bundle })
            .await?;

        // a rejected bundle comes back as an RPC failure
        if let Some(error) = rpc_failure(&value) {
            return Ok(PushTxResponse {
                status: "FAILED".into(),
                error: Some(error),
            });
        }
        parse_response("push_tx", value)
    }

    async fn get_coin_records_by_puzzle_hash(
        &self,
        puzzle_hash: Bytes32,
        include_spent_coins: bool,
    ) -> DriverResult<Vec<CoinRecord>> {
        let response: CoinRecordsResponse = self
            .rpc
            .call(
                "get_coin_records_by_puzzle_hash",
                &CoinRecordsByPuzzleHashRequest {
                    puzzle_hash,
                    include_spent_coins,
                },
            )
            .await?;
        Ok(response.coin_records)
    }
}

/// Wallet RPC over HTTPS (default port 9256).
#[derive(Debug, Clone)]
pub struct WalletClient {
    rpc: RpcClient,
}

impl WalletClient {
    pub fn new(hostname: &str, port: u16, tls: &ChiaTls, timeout: Duration) -> DriverResult<Self> {
        Ok(Self {
            rpc: RpcClient::new(hostname, port, tls, timeout)?,
        })
    }
}

#[async_trait]
impl WalletRpc for WalletClient {
    #[instrument(skip(self))]
    async fn log_in(&self, fingerprint: u32) -> DriverResult<LogInResponse> {
        let value = self
            .rpc
            .call_raw("log_in", &LogInRequest { fingerprint })
            .await?;
        // failure here is an answer, not a transport error
        serde_json::from_value(value)
            .map_err(|e| DriverError::Rpc(format!("log_in: unexpected response: {}", e)))
    }

    async fn get_wallet_balance(&self, wallet_id: u32) -> DriverResult<WalletBalance> {
        let response: WalletBalanceResponse = self
            .rpc
            .call("get_wallet_balance", &WalletIdRequest { wallet_id })
            .await?;
        Ok(response.wallet_balance)
    }

    #[instrument(skip(self))]
    async fn send_transaction(
        &self,
        wallet_id: u32,
        amount: u64,
        address: &str,
        fee: u64,
    ) -> DriverResult<TransactionRecord> {
        let response: TransactionResponse = self
            .rpc
            .call(
                "send_transaction",
                &SendTransactionRequest {
                    wallet_id,
                    amount,
                    address,
                    fee,
                },
            )
            .await?;
        Ok(response.transaction)
    }

    async fn get_transaction(
        &self,
        _wallet_id: u32,
        transaction_id: Bytes32,
    ) -> DriverResult<TransactionRecord> {
        let response: TransactionResponse = self
            .rpc
            .call("get_transaction", &GetTransactionRequest { transaction_id })
            .await?;
        Ok(response.transaction)
    }
}
