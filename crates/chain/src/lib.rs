//! Stakeward Chain
//!
//! Typed facade over the network's JSON-RPC interface: contract view calls,
//! signed function-call transactions with submit-and-await semantics, block
//! and genesis queries. The [`ChainGateway`] trait is the seam the operator
//! engine is written against; [`NearGateway`] is the production
//! implementation.

pub mod gateway;
pub mod key;
pub mod rpc;
pub mod tx;
pub mod types;

pub use gateway::{ChainGateway, NearGateway};
pub use key::OperatorKey;
pub use types::{
    AccountView, BlockHeader, CallOutcome, ExecutionStatus, GenesisConfig, DEFAULT_FUNCTION_CALL_GAS,
    NO_DEPOSIT, OPERATION_GAS,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("encode: {0}")]
    Encode(#[from] std::io::Error),
    #[error("view call {method}: {message}")]
    View { method: String, message: String },
    #[error("invalid signer key: {0}")]
    InvalidKey(String),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid block hash: {0}")]
    BlockHash(String),
    #[error("unrecognized execution status: {0}")]
    UnknownStatus(String),
    #[error("missing field in rpc response: {0}")]
    MissingField(&'static str),
}
