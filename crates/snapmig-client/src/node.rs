use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use snapmig_snapshot::{Output, TreasuryOutput};
use snapmig_types::{Address, MessageId, MilestoneId, OutputId, TransactionId};
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::http::{build_client, read_json, DEFAULT_REQUEST_TIMEOUT};

/// Debug route listing the ids of all unspent outputs.
pub const DEFAULT_UNSPENT_OUTPUTS_ROUTE: &str = "/api/plugins/debug/outputs/unspent";

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub is_healthy: bool,
    pub network_id: String,
    pub latest_milestone_index: u32,
    pub confirmed_milestone_index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub kind: u8,
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOutputBody {
    #[serde(rename = "type")]
    pub kind: u8,
    pub address: NodeAddress,
    pub amount: u64,
}

/// An output as served by `GET /api/v1/outputs/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutput {
    pub message_id: String,
    pub transaction_id: String,
    pub output_index: u16,
    #[serde(default)]
    pub is_spent: bool,
    #[serde(default)]
    pub ledger_index: u32,
    pub output: NodeOutputBody,
}

impl NodeOutput {
    /// Convert into a snapshot output record.
    pub fn to_snapshot_output(&self) -> ClientResult<Output> {
        let message_id = MessageId::from_hex(&self.message_id)
            .map_err(|e| ClientError::Protocol(format!("message id {}: {e}", self.message_id)))?;
        let transaction_id = TransactionId::from_hex(&self.transaction_id)
            .map_err(|e| ClientError::Protocol(format!("transaction id {}: {e}", self.transaction_id)))?;
        let address_bytes = decode_32(&self.output.address.address)?;
        let address = Address::from_parts(self.output.address.kind, address_bytes)
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        Ok(Output {
            message_id,
            output_id: OutputId::from_parts(&transaction_id, self.output_index),
            output_type: self.output.kind,
            address,
            amount: self.output.amount,
        })
    }
}

fn decode_32(s: &str) -> ClientResult<[u8; 32]> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| ClientError::Protocol(format!("address {s}: {e}")))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| ClientError::Protocol(format!("address {s}: expected 32 bytes, got {}", b.len())))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasuryResponse {
    pub milestone_id: String,
    pub amount: u64,
}

impl TreasuryResponse {
    /// Treasury as carried in a snapshot header.
    pub fn to_treasury_output(&self) -> ClientResult<TreasuryOutput> {
        let milestone_id = MilestoneId::from_hex(&self.milestone_id)
            .map_err(|e| ClientError::Protocol(format!("milestone id {}: {e}", self.milestone_id)))?;
        Ok(TreasuryOutput {
            milestone_id,
            amount: self.amount,
            spent: false,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputIdsResponse {
    output_ids: Vec<String>,
}

/// Source of individual outputs, fetched by id.
#[async_trait]
pub trait OutputFetcher: Send + Sync {
    async fn output_by_id(&self, id: &OutputId) -> ClientResult<NodeOutput>;
}

/// Client for the REST API of a target network node.
#[derive(Clone, Debug)]
pub struct NodeClient {
    http: Client,
    uri: String,
    timeout: Duration,
}

impl NodeClient {
    pub fn new(uri: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            http: build_client()?,
            uri: uri.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn info(&self) -> ClientResult<NodeInfo> {
        self.get("/api/v1/info", Some(self.timeout)).await
    }

    pub async fn treasury(&self) -> ClientResult<TreasuryResponse> {
        let treasury: TreasuryResponse = self.get("/api/v1/treasury", Some(self.timeout)).await?;
        info!(amount = treasury.amount, "treasury fetched");
        Ok(treasury)
    }

    /// Ids of all unspent outputs, as listed by `route`.
    pub async fn unspent_output_ids(&self, route: &str) -> ClientResult<Vec<OutputId>> {
        let response: OutputIdsResponse = self.get(route, None).await?;
        let ids = response
            .output_ids
            .iter()
            .map(|s| {
                OutputId::from_hex(s).map_err(|e| ClientError::Protocol(format!("output id {s}: {e}")))
            })
            .collect::<ClientResult<Vec<_>>>()?;
        info!(count = ids.len(), route, "unspent output ids fetched");
        Ok(ids)
    }

    async fn get<T: DeserializeOwned>(&self, route: &str, timeout: Option<Duration>) -> ClientResult<T> {
        let url = format!("{}{route}", self.uri);
        let mut request = self.http.get(&url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, e))?;
        let envelope: Envelope<T> = read_json(&url, response).await?;
        debug!(url = %url, "node query answered");
        Ok(envelope.data)
    }
}

#[async_trait]
impl OutputFetcher for NodeClient {
    async fn output_by_id(&self, id: &OutputId) -> ClientResult<NodeOutput> {
        self.get(&format!("/api/v1/outputs/{}", id.to_hex()), Some(self.timeout))
            .await
    }
}
