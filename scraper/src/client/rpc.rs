//! Tendermint / CometBFT RPC status client.
//!
//! Talks to the node's URI-over-HTTP RPC and expects the JSON-RPC envelope
//! the node wraps every answer in:
//!
//! ```json
//! GET /status
//!
//! {
//!   "jsonrpc": "2.0",
//!   "id": -1,
//!   "result": {
//!     "node_info": { "id": "7e3b...", "moniker": "validator-1", ... },
//!     "sync_info": {
//!       "latest_block_height": "15321877",
//!       "latest_block_time": "2024-05-02T09:13:41.284753518Z",
//!       "catching_up": false,
//!       ...
//!     },
//!     "validator_info": { "voting_power": "120034", ... }
//!   }
//! }
//! ```
//!
//! Integers are strings on the wire (amino JSON); plain numbers are accepted
//! as well so that forks which changed the encoding still decode.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::client::StatusFetcher;
use crate::error::FetchError;
use crate::types::NodeStatus;

/// HTTP client for the Tendermint RPC `status` route.
///
/// Cheap to clone and safe to share across concurrent scrapes; the
/// underlying connection pool is reused. No timeout is set beyond the
/// transport defaults.
#[derive(Clone, Debug)]
pub struct TendermintRpcClient {
    client: Client,
}

impl TendermintRpcClient {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("tendermint-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::transport(&e))?;

        Ok(Self { client })
    }

    fn endpoint(base_url: &str, path: &str) -> String {
        // Avoid accidental double slashes.
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl StatusFetcher for TendermintRpcClient {
    async fn fetch_status(&self, endpoint: &str) -> Result<NodeStatus, FetchError> {
        let url = Self::endpoint(endpoint, "/status");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::transport(&e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| FetchError::transport(&e))?;

        decode_status(&url, status, &body)
    }
}

/// Turns a raw RPC answer into a [`NodeStatus`].
///
/// Nodes answer RPC-level failures with a JSON `error` member (sometimes
/// alongside a 500 status), so the envelope is inspected before the HTTP
/// status. A blank body, a missing or `null` result and an empty result
/// object all count as an empty status.
fn decode_status(url: &str, status: StatusCode, body: &[u8]) -> Result<NodeStatus, FetchError> {
    if status.is_success() && body.trim_ascii().is_empty() {
        return Err(FetchError::EmptyResponse);
    }

    let envelope = match serde_json::from_slice::<RpcResponse>(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Err(e) => return Err(FetchError::Decode(e)),
    };

    if let Some(err) = envelope.error {
        let message = match err.data {
            Some(data) if !data.is_empty() => format!("{}: {data}", err.message),
            _ => err.message,
        };
        return Err(FetchError::Rpc {
            code: err.code,
            message,
        });
    }

    if !status.is_success() {
        return Err(FetchError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let result = match envelope.result {
        None | Some(Value::Null) => return Err(FetchError::EmptyResponse),
        Some(Value::Object(fields)) if fields.is_empty() => return Err(FetchError::EmptyResponse),
        Some(raw) => serde_json::from_value::<StatusResult>(raw)?,
    };

    Ok(NodeStatus {
        node_id: result.node_info.id,
        moniker: result.node_info.moniker,
        catching_up: result.sync_info.catching_up,
        voting_power: result.validator_info.voting_power,
        latest_block_height: result.sync_info.latest_block_height,
        latest_block_time: result.sync_info.latest_block_time,
    })
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    node_info: NodeInfo,
    sync_info: SyncInfo,
    #[serde(default)]
    validator_info: ValidatorInfo,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    id: String,
    moniker: String,
}

#[derive(Debug, Deserialize)]
struct SyncInfo {
    #[serde(deserialize_with = "int_from_str_or_number")]
    latest_block_height: i64,
    latest_block_time: DateTime<Utc>,
    catching_up: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ValidatorInfo {
    #[serde(default, deserialize_with = "int_from_str_or_number")]
    voting_power: i64,
}

fn int_from_str_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrInt {
        Int(i64),
        Str(String),
    }

    match StrOrInt::deserialize(deserializer)? {
        StrOrInt::Int(v) => Ok(v),
        StrOrInt::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
