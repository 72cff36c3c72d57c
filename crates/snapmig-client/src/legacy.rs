use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use snapmig_ledger::{LedgerResult, LedgerSource, RawLedgerState, SpentAddressOracle};
use snapmig_types::LegacyAddress;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::http::{build_client, read_json, DEFAULT_REQUEST_TIMEOUT};

/// API version header every legacy command must carry.
pub const LEGACY_API_VERSION_HEADER: &str = "X-IOTA-API-Version";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyNodeInfo {
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub app_version: String,
    pub latest_milestone_index: u32,
    pub latest_solid_subtangle_milestone_index: u32,
}

impl LegacyNodeInfo {
    /// Whether the node has solidified up to its latest milestone.
    pub fn is_synced(&self) -> bool {
        self.latest_milestone_index == self.latest_solid_subtangle_milestone_index
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStateResponse {
    /// Signed and wide so that malformed balances fail ledger validation
    /// with the offending address rather than the decode.
    pub balances: HashMap<String, i128>,
    pub milestone_index: u32,
    /// Server-side processing time in milliseconds.
    #[serde(default)]
    pub duration: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHashWithValue {
    pub tx_hash: String,
    pub tail_tx_hash: String,
    pub bundle_hash: String,
    pub address: String,
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxWithValue {
    pub tx_hash: String,
    pub address: String,
    pub index: u64,
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleWithValue {
    pub bundle_hash: String,
    pub tail_tx_hash: String,
    pub last_index: u64,
    pub txs: Vec<TxWithValue>,
}

/// Ledger mutations of one legacy milestone with the confirmed value
/// transfers behind them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDiffExt {
    #[serde(default)]
    pub confirmed_tx_with_value: Vec<TxHashWithValue>,
    #[serde(default)]
    pub confirmed_bundles_with_value: Vec<BundleWithValue>,
    pub diff: HashMap<String, i64>,
    pub milestone_index: u32,
    #[serde(default)]
    pub duration: u64,
}

impl LedgerDiffExt {
    /// Net change of the diff; a consistent milestone moves funds without
    /// creating or destroying any.
    pub fn net_change(&self) -> i128 {
        self.diff.values().map(|v| *v as i128).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.net_change() == 0
    }
}

#[derive(Deserialize)]
struct SpentStatesResponse {
    states: Vec<bool>,
}

/// Client for the JSON command API of a legacy node.
#[derive(Clone, Debug)]
pub struct LegacyClient {
    http: Client,
    uri: String,
    timeout: Duration,
}

impl LegacyClient {
    pub fn new(uri: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            http: build_client()?,
            uri: uri.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Timeout for every command except `getLedgerState`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub async fn node_info(&self) -> ClientResult<LegacyNodeInfo> {
        let info: LegacyNodeInfo = self.command(json!({ "command": "getNodeInfo" }), Some(self.timeout)).await?;
        debug!(
            lmi = info.latest_milestone_index,
            lsmi = info.latest_solid_subtangle_milestone_index,
            "legacy node info"
        );
        Ok(info)
    }

    /// Full ledger state at `target_index`. This can take minutes on a
    /// mainnet ledger, so no timeout applies.
    pub async fn ledger_state(&self, target_index: u32) -> ClientResult<LedgerStateResponse> {
        info!(target_index, "fetching ledger state");
        let state: LedgerStateResponse = self
            .command(
                json!({ "command": "getLedgerState", "targetIndex": target_index }),
                None,
            )
            .await?;
        if state.milestone_index != target_index {
            return Err(ClientError::Protocol(format!(
                "requested ledger state at {target_index}, node answered for {}",
                state.milestone_index
            )));
        }
        info!(
            target_index,
            entries = state.balances.len(),
            duration_ms = state.duration,
            "ledger state fetched"
        );
        Ok(state)
    }

    pub async fn ledger_diff_ext(&self, milestone_index: u32) -> ClientResult<LedgerDiffExt> {
        self.command(
            json!({ "command": "getLedgerDiffExt", "milestoneIndex": milestone_index }),
            Some(self.timeout),
        )
        .await
    }

    pub async fn were_addresses_spent_from(&self, addresses: &[LegacyAddress]) -> ClientResult<Vec<bool>> {
        let addresses: Vec<&str> = addresses.iter().map(LegacyAddress::as_str).collect();
        let response: SpentStatesResponse = self
            .command(
                json!({ "command": "wereAddressesSpentFrom", "addresses": addresses }),
                Some(self.timeout),
            )
            .await?;
        Ok(response.states)
    }

    async fn command<T: DeserializeOwned>(
        &self,
        body: serde_json::Value,
        timeout: Option<Duration>,
    ) -> ClientResult<T> {
        let mut request = self
            .http
            .post(&self.uri)
            .header(LEGACY_API_VERSION_HEADER, "1")
            .json(&body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&self.uri, e))?;
        read_json(&self.uri, response).await
    }
}

#[async_trait]
impl LedgerSource for LegacyClient {
    async fn ledger_state(&self, index: u32) -> LedgerResult<RawLedgerState> {
        let state = LegacyClient::ledger_state(self, index).await?;
        Ok(RawLedgerState {
            ledger_index: state.milestone_index,
            balances: state.balances,
        })
    }
}

#[async_trait]
impl SpentAddressOracle for LegacyClient {
    async fn were_addresses_spent_from(&self, addresses: &[LegacyAddress]) -> LedgerResult<Vec<bool>> {
        Ok(LegacyClient::were_addresses_spent_from(self, addresses).await?)
    }
}
