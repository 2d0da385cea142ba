//! JSON-RPC 2.0 transport over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::GatewayError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// A single-endpoint JSON-RPC client. Calls are sequential within a tick;
/// there is no transport-level retry; the tick is the retry unit.
pub struct RpcTransport {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(method, id, "rpc request");

        let response: RpcResponse = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.error {
            let message = match err.data {
                Some(data) => format!("{} ({})", err.message, data),
                None => err.message,
            };
            return Err(GatewayError::Rpc {
                code: err.code,
                message,
            });
        }
        response.result.ok_or(GatewayError::MissingField("result"))
    }
}
