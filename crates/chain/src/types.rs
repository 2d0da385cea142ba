//! Wire-level types shared by the gateway and its callers.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use stakeward_numeric::Balance;

use crate::GatewayError;

/// The network's default gas budget for a single function call (30 Tgas).
pub const DEFAULT_FUNCTION_CALL_GAS: u64 = 30_000_000_000_000;

/// Gas attached to every operator call: ten times the network default.
pub const OPERATION_GAS: u64 = 10 * DEFAULT_FUNCTION_CALL_GAS;

/// Operator calls never attach a deposit.
pub const NO_DEPOSIT: u128 = 0;

/// Envelope around a contract view-call result.
#[derive(Debug, Deserialize)]
pub struct ViewEnvelope {
    pub block_hash: String,
    pub block_height: u64,
    #[serde(default)]
    pub result: Vec<u8>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Terminal status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Failure(String),
    SuccessValue(Vec<u8>),
    SuccessReceipt,
}

impl ExecutionStatus {
    /// Parse the `status` field of a transaction outcome. `SuccessValue`
    /// payloads are base64 on the wire and surfaced decoded.
    pub fn from_json(status: &Value) -> Result<Self, GatewayError> {
        if let Some(object) = status.as_object() {
            if let Some(failure) = object.get("Failure") {
                return Ok(ExecutionStatus::Failure(failure.to_string()));
            }
            if let Some(value) = object.get("SuccessValue") {
                let encoded = value
                    .as_str()
                    .ok_or(GatewayError::MissingField("SuccessValue"))?;
                return Ok(ExecutionStatus::SuccessValue(
                    BASE64_STANDARD.decode(encoded)?,
                ));
            }
            if object.contains_key("SuccessReceiptId") {
                return Ok(ExecutionStatus::SuccessReceipt);
            }
        }
        Err(GatewayError::UnknownStatus(status.to_string()))
    }
}

/// Result of a submitted-and-awaited function call.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub status: ExecutionStatus,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountView {
    pub amount: Balance,
    pub block_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    pub hash: String,
}

/// Network constants immutable for the chain's lifetime.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GenesisConfig {
    pub epoch_length: u64,
    pub genesis_height: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_success_value_decodes_base64() {
        let status = json!({ "SuccessValue": "dHJ1ZQ==" });
        assert_eq!(
            ExecutionStatus::from_json(&status).unwrap(),
            ExecutionStatus::SuccessValue(b"true".to_vec())
        );
    }

    #[test]
    fn test_status_empty_success_value() {
        let status = json!({ "SuccessValue": "" });
        assert_eq!(
            ExecutionStatus::from_json(&status).unwrap(),
            ExecutionStatus::SuccessValue(Vec::new())
        );
    }

    #[test]
    fn test_status_failure_keeps_message() {
        let status = json!({ "Failure": { "ActionError": { "index": 0 } } });
        match ExecutionStatus::from_json(&status).unwrap() {
            ExecutionStatus::Failure(message) => assert!(message.contains("ActionError")),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_status_success_receipt() {
        let status = json!({ "SuccessReceiptId": "9uZx..." });
        assert_eq!(
            ExecutionStatus::from_json(&status).unwrap(),
            ExecutionStatus::SuccessReceipt
        );
    }

    #[test]
    fn test_status_rejects_unknown_shape() {
        assert!(ExecutionStatus::from_json(&json!("NotStarted")).is_err());
        assert!(ExecutionStatus::from_json(&json!({})).is_err());
    }

    #[test]
    fn test_view_envelope_error_field_optional() {
        let envelope: ViewEnvelope = serde_json::from_value(json!({
            "block_hash": "abc",
            "block_height": 77,
            "result": [116, 114, 117, 101],
        }))
        .unwrap();
        assert_eq!(envelope.result, b"true");
        assert!(envelope.error.is_none());
    }
}
