//! Per-tick view of the pool contract.

use serde::de::DeserializeOwned;
use serde_json::Value;

use stakeward_chain::ChainGateway;

use crate::types::{EpochHeights, Fund, Validator, WithdrawalFund};
use crate::OperatorError;

/// Thin wrapper over the contract's view methods, created fresh for every
/// tick. Only the epoch pair is memoised: the tick validates all of its
/// callbacks against one epoch snapshot. The registry and fund reads are
/// deliberately not cached; earlier phases of a tick mutate them on-chain,
/// so each phase re-reads. Nothing survives across ticks.
pub struct StateReader<'a> {
    gateway: &'a dyn ChainGateway,
    epochs: Option<EpochHeights>,
}

impl<'a> StateReader<'a> {
    pub fn new(gateway: &'a dyn ChainGateway) -> Self {
        Self {
            gateway,
            epochs: None,
        }
    }

    /// Pool and network epoch heights, one snapshot per tick.
    pub async fn epochs(&mut self) -> Result<EpochHeights, OperatorError> {
        if let Some(epochs) = self.epochs {
            return Ok(epochs);
        }
        let epochs = self.view("get_current_epoch_height").await?;
        self.epochs = Some(epochs);
        Ok(epochs)
    }

    pub async fn validators(&self) -> Result<Vec<Validator>, OperatorError> {
        self.view("get_validator_registry").await
    }

    pub async fn fund(&self) -> Result<Fund, OperatorError> {
        self.view("get_fund").await
    }

    pub async fn withdrawal_fund(&self) -> Result<WithdrawalFund, OperatorError> {
        self.view("get_requested_to_withdrawal_fund").await
    }

    pub async fn is_stake_distributed(&self) -> Result<bool, OperatorError> {
        self.view("is_stake_distributed").await
    }

    async fn view<T: DeserializeOwned>(&self, method: &'static str) -> Result<T, OperatorError> {
        let bytes = self.gateway.view_call(method, Value::Null).await?;
        serde_json::from_slice(&bytes).map_err(|source| OperatorError::Decode {
            what: method,
            source,
        })
    }
}
