//! The gateway trait and its JSON-RPC implementation.

use async_trait::async_trait;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::key::OperatorKey;
use crate::rpc::RpcTransport;
use crate::tx::{Action, FunctionCall, PublicKey, Transaction};
use crate::types::{
    AccountView, BlockHeader, CallOutcome, ExecutionStatus, GenesisConfig, ViewEnvelope,
    NO_DEPOSIT, OPERATION_GAS,
};
use crate::GatewayError;

/// The operator engine's view of the chain. One implementation talks to a
/// real node; tests script their own.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Contract view call at `"final"` finality; returns the envelope's
    /// result bytes for the caller to parse.
    async fn view_call(&self, method: &str, args: Value) -> Result<Vec<u8>, GatewayError>;

    /// Sign and submit a single function-call action against the pool
    /// contract, waiting for the terminal execution status.
    async fn call(&self, method: &str, args: Value) -> Result<CallOutcome, GatewayError>;

    async fn account_view(&self, account_id: &str) -> Result<AccountView, GatewayError>;

    async fn latest_block(&self) -> Result<BlockHeader, GatewayError>;

    async fn genesis_config(&self) -> Result<GenesisConfig, GatewayError>;
}

pub struct NearGateway {
    rpc: RpcTransport,
    pool_account: String,
    operator_account: String,
    key: OperatorKey,
}

impl NearGateway {
    pub fn new(
        endpoint: &str,
        pool_account: impl Into<String>,
        operator_account: impl Into<String>,
        key: OperatorKey,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            rpc: RpcTransport::new(endpoint)?,
            pool_account: pool_account.into(),
            operator_account: operator_account.into(),
            key,
        })
    }
}

#[async_trait]
impl ChainGateway for NearGateway {
    async fn view_call(&self, method: &str, args: Value) -> Result<Vec<u8>, GatewayError> {
        let result = self
            .rpc
            .call(
                "query",
                json!({
                    "request_type": "call_function",
                    "finality": "final",
                    "account_id": self.pool_account,
                    "method_name": method,
                    "args_base64": BASE64_STANDARD.encode(args_bytes(&args)?),
                }),
            )
            .await?;

        let envelope: ViewEnvelope = serde_json::from_value(result)?;
        if let Some(message) = envelope.error.filter(|e| !e.is_empty()) {
            return Err(GatewayError::View {
                method: method.to_owned(),
                message,
            });
        }
        debug!(method, block_height = envelope.block_height, "view call");
        Ok(envelope.result)
    }

    async fn call(&self, method: &str, args: Value) -> Result<CallOutcome, GatewayError> {
        #[derive(Deserialize)]
        struct AccessKeyView {
            nonce: u64,
            block_hash: String,
        }

        let access: AccessKeyView = serde_json::from_value(
            self.rpc
                .call(
                    "query",
                    json!({
                        "request_type": "view_access_key",
                        "finality": "final",
                        "account_id": self.operator_account,
                        "public_key": self.key.public_key_base58(),
                    }),
                )
                .await?,
        )?;

        let transaction = Transaction {
            signer_id: self.operator_account.clone(),
            public_key: PublicKey(self.key.public_key_bytes()),
            nonce: access.nonce + 1,
            receiver_id: self.pool_account.clone(),
            block_hash: decode_block_hash(&access.block_hash)?,
            actions: vec![Action::FunctionCall(FunctionCall {
                method_name: method.to_owned(),
                args: args_bytes(&args)?,
                gas: OPERATION_GAS,
                deposit: NO_DEPOSIT,
            })],
        };

        let outcome = self
            .rpc
            .call("broadcast_tx_commit", json!([transaction.sign(&self.key)?]))
            .await?;

        let status = outcome
            .get("status")
            .ok_or(GatewayError::MissingField("status"))?;
        let status = ExecutionStatus::from_json(status)?;
        let tx_hash = outcome
            .pointer("/transaction/hash")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        debug!(method, tx_hash = %tx_hash, "transaction finalized");
        Ok(CallOutcome { status, tx_hash })
    }

    async fn account_view(&self, account_id: &str) -> Result<AccountView, GatewayError> {
        let result = self
            .rpc
            .call(
                "query",
                json!({
                    "request_type": "view_account",
                    "finality": "final",
                    "account_id": account_id,
                }),
            )
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn latest_block(&self) -> Result<BlockHeader, GatewayError> {
        #[derive(Deserialize)]
        struct BlockView {
            header: BlockHeader,
        }

        let result = self.rpc.call("block", json!({ "finality": "final" })).await?;
        let view: BlockView = serde_json::from_value(result)?;
        Ok(view.header)
    }

    async fn genesis_config(&self) -> Result<GenesisConfig, GatewayError> {
        let result = self
            .rpc
            .call("EXPERIMENTAL_genesis_config", Value::Null)
            .await?;
        Ok(serde_json::from_value(result)?)
    }
}

/// View and call arguments travel as JSON bytes; `Null` means "no args".
fn args_bytes(args: &Value) -> Result<Vec<u8>, GatewayError> {
    match args {
        Value::Null => Ok(Vec::new()),
        other => Ok(serde_json::to_vec(other)?),
    }
}

fn decode_block_hash(encoded: &str) -> Result<[u8; 32], GatewayError> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| GatewayError::BlockHash(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(GatewayError::BlockHash(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_block_hash_round_trip() {
        let hash = [4u8; 32];
        let encoded = bs58::encode(&hash).into_string();
        assert_eq!(decode_block_hash(&encoded).unwrap(), hash);
    }

    #[test]
    fn test_decode_block_hash_rejects_wrong_length() {
        let encoded = bs58::encode(&[4u8; 16]).into_string();
        assert!(decode_block_hash(&encoded).is_err());
    }

    #[test]
    fn test_args_bytes_null_is_empty() {
        assert!(args_bytes(&Value::Null).unwrap().is_empty());
        assert_eq!(
            args_bytes(&json!({"validator_account_id": "v1.near"})).unwrap(),
            br#"{"validator_account_id":"v1.near"}"#
        );
    }
}
