//! Stakeward Operator
//!
//! The epoch-driven reconciliation engine: detects when the pool's recorded
//! epoch has fallen behind the network, drives it forward validator by
//! validator, satisfies pending withdrawal requests, reclaims matured
//! unstaked balances, and distributes fresh deposits inside the closing
//! stretch of each epoch. All authoritative state lives on-chain; a tick
//! reads it fresh and the next tick is the retry unit.

pub mod rebalance;
pub mod state;
pub mod types;

mod increase_stake;
mod pool_update;

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use stakeward_chain::{ChainGateway, GatewayError};
use stakeward_numeric::{AmountError, Balance};

/// Matured-unstake reclaim and withdrawal decreases run every fourth epoch.
pub const RECLAIM_EPOCH_INTERVAL: u64 = 4;

/// Closing stretch of the epoch in which new stake may be distributed,
/// in blocks: 15% of the epoch length below. The literal is load-bearing;
/// a different genesis epoch length shifts the window fraction and is
/// surfaced with a warning at gate time.
pub const STAKE_WINDOW_BLOCKS: u64 = 6_480;

/// Epoch length the stake window was sized for.
pub const EXPECTED_EPOCH_LENGTH: u64 = 43_200;

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("decoding {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{method} failed: {message}")]
    CallFailed {
        method: &'static str,
        message: String,
    },
    #[error("{method} returned no result value")]
    MissingResult { method: &'static str },
    #[error("{method}: rejected result for validator {validator}")]
    CallbackRejected {
        method: &'static str,
        validator: String,
    },
    #[error("{method}: callback epoch {got} does not match tick epoch {expected}")]
    EpochAdvanced {
        method: &'static str,
        got: u64,
        expected: u64,
    },
    #[error("pool epoch {pool} does not match network epoch {network}")]
    EpochsDiverged { pool: u64, network: u64 },
    #[error("malformed investment withdrawal entry: {0}")]
    MalformedWithdrawalEntry(String),
    #[error("amount: {0}")]
    Amount(#[from] AmountError),
    #[error("increase_validator_stake rejected for validator {0}")]
    IncreaseRejected(String),
}

/// Observer invoked when the signer account balance drops below the floor.
pub type LowBalanceHook = Box<dyn Fn(&Balance) + Send + Sync>;

/// The pool's authorised off-chain bookkeeper. Owns the gateway for the
/// process lifetime and holds no state of its own between ticks.
pub struct StakePoolOperator {
    gateway: Arc<dyn ChainGateway>,
    operator_account: String,
    low_balance_hook: LowBalanceHook,
}

impl StakePoolOperator {
    pub fn new(gateway: Arc<dyn ChainGateway>, operator_account: impl Into<String>) -> Self {
        Self {
            gateway,
            operator_account: operator_account.into(),
            low_balance_hook: Box::new(|amount| {
                warn!(amount = %amount, "operator account balance is low");
            }),
        }
    }

    /// Replace the low-balance observer. The default only logs.
    pub fn with_low_balance_hook(mut self, hook: LowBalanceHook) -> Self {
        self.low_balance_hook = hook;
        self
    }
}
