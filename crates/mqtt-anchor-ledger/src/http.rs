//! HTTP ledger client for a node's core REST API.
//!
//! Speaks the Stardust `core/v2` dialect:
//!
//! ```text
//! GET  /health               200 when the node is synced and healthy
//! GET  /api/core/v2/info     protocol version and minimum PoW score
//! GET  /api/core/v2/tips     parents for a new block
//! POST /api/core/v2/blocks   submit a block, answers {"blockId": "0x..."}
//! ```
//!
//! Blocks carry a tagged-data payload (type 5). Proof of work is local, and
//! only networks with a minimum PoW score of zero are supported, where a
//! nonce of `"0"` is valid.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{ClientOptions, LedgerClient, PostedBlock};
use crate::error::ClientError;

const HEALTH_PATH: &str = "/health";
const INFO_PATH: &str = "/api/core/v2/info";
const TIPS_PATH: &str = "/api/core/v2/tips";
const BLOCKS_PATH: &str = "/api/core/v2/blocks";

/// Payload type id of tagged data.
const TAGGED_DATA_PAYLOAD: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolParams {
    version: u8,
    min_pow_score: u64,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    protocol: ProtocolParams,
}

#[derive(Debug, Deserialize)]
struct TipsResponse {
    tips: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TaggedDataPayload<'a> {
    #[serde(rename = "type")]
    kind: u8,
    tag: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockRequest<'a> {
    protocol_version: u8,
    parents: Vec<String>,
    payload: TaggedDataPayload<'a>,
    nonce: &'static str,
}

/// Blocking HTTP client bound to one node.
pub struct NodeClient {
    agent: ureq::Agent,
    base: String,
    local_pow: bool,
    protocol: Option<ProtocolParams>,
}

impl NodeClient {
    /// Build a client for `options.endpoint`.
    ///
    /// No request is made here; the adapter probes health separately.
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let base = options.endpoint.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::Unavailable(format!(
                "unsupported endpoint scheme: {}",
                options.endpoint
            )));
        }
        if options.timeout.is_zero() {
            return Err(ClientError::Unavailable("timeout must be > 0".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(options.timeout)
            .timeout_read(options.timeout)
            .timeout_write(options.timeout)
            .user_agent(concat!("mqtt-anchor/", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self {
            agent,
            base: base.to_owned(),
            local_pow: options.local_pow(),
            protocol: None,
        })
    }

    /// The node base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .agent
            .get(&self.url(path))
            .set("Accept", "application/json")
            .call()
            .map_err(|e| client_error_from_ureq(path, e))?;
        response
            .into_json()
            .map_err(|e| ClientError::Transport(format!("{}: invalid JSON: {}", path, e)))
    }

    /// Protocol parameters, fetched once and cached.
    fn protocol_params(&mut self) -> Result<ProtocolParams, ClientError> {
        if let Some(params) = self.protocol {
            return Ok(params);
        }
        let info: InfoResponse = self.get_json(INFO_PATH)?;
        debug!(
            version = info.protocol.version,
            min_pow_score = info.protocol.min_pow_score,
            "fetched node protocol parameters"
        );
        self.protocol = Some(info.protocol);
        Ok(info.protocol)
    }
}

impl LedgerClient for NodeClient {
    fn check_health(&mut self, endpoint: &str) -> Result<bool, ClientError> {
        let url = format!("{}{}", endpoint.trim_end_matches('/'), HEALTH_PATH);
        match self.agent.get(&url).call() {
            Ok(response) => Ok(response.status() == 200),
            Err(ureq::Error::Status(status, _)) => {
                warn!(endpoint, status, "node reported unhealthy");
                Ok(false)
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(ClientError::Transport(transport.to_string()))
            }
        }
    }

    fn post_tagged_block(&mut self, tag: &str, data: &str) -> Result<PostedBlock, ClientError> {
        let params = self.protocol_params()?;
        if self.local_pow && params.min_pow_score > 0 {
            return Err(ClientError::Rejected(format!(
                "node requires a minimum PoW score of {}, local nonce search is not available",
                params.min_pow_score
            )));
        }

        let tips: TipsResponse = self.get_json(TIPS_PATH)?;
        if tips.tips.is_empty() {
            return Err(ClientError::Rejected("node returned no tips".into()));
        }

        let request = BlockRequest {
            protocol_version: params.version,
            parents: tips.tips,
            payload: TaggedDataPayload {
                kind: TAGGED_DATA_PAYLOAD,
                tag,
                data,
            },
            nonce: "0",
        };

        let response = self
            .agent
            .post(&self.url(BLOCKS_PATH))
            .set("Accept", "application/json")
            .send_json(&request)
            .map_err(|e| client_error_from_ureq(BLOCKS_PATH, e))?;

        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| ClientError::Transport(format!("{}: invalid JSON: {}", BLOCKS_PATH, e)))?;

        Ok(PostedBlock {
            block_id: body
                .get("blockId")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned),
        })
    }
}

fn client_error_from_ureq(path: &str, err: ureq::Error) -> ClientError {
    match err {
        ureq::Error::Status(404 | 405, _) => {
            ClientError::Unsupported(format!("{} is not served by this node", path))
        }
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            ClientError::Rejected(format!("{} answered {}: {}", path, status, body.trim()))
        }
        ureq::Error::Transport(transport) => {
            ClientError::Transport(format!("{}: {}", path, transport))
        }
    }
}
