//! The stake distribution pipeline.
//!
//! Inside the closing stretch of each epoch, once the pool has caught up
//! with the network, freshly deposited classic funds are split across the
//! eligible validators and the distribution is confirmed on-chain.

use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use stakeward_chain::ExecutionStatus;

use crate::state::StateReader;
use crate::types::Validator;
use crate::{
    rebalance, OperatorError, StakePoolOperator, EXPECTED_EPOCH_LENGTH, STAKE_WINDOW_BLOCKS,
};

impl StakePoolOperator {
    /// Distribute the pool's classic unstaked fund across validators, then
    /// confirm the distribution for this epoch.
    pub async fn increase_stake(&self) -> Result<(), OperatorError> {
        let started = Instant::now();

        let genesis = self.gateway.genesis_config().await?;
        if genesis.epoch_length != EXPECTED_EPOCH_LENGTH {
            warn!(
                epoch_length = genesis.epoch_length,
                window_blocks = STAKE_WINDOW_BLOCKS,
                "epoch length differs from the one the stake window was sized for"
            );
        }
        let block = self.gateway.latest_block().await?;
        let offset = block.height % genesis.epoch_length;
        if offset < genesis.epoch_length.saturating_sub(STAKE_WINDOW_BLOCKS) {
            debug!(offset, "increase stake: not yet");
            return Ok(());
        }

        let mut state = StateReader::new(self.gateway.as_ref());
        if state.is_stake_distributed().await? {
            debug!("increase stake: already distributed");
            return Ok(());
        }

        let epochs = state.epochs().await?;
        if epochs.network_epoch_height != epochs.pool_epoch_height {
            return Err(OperatorError::EpochsDiverged {
                pool: epochs.pool_epoch_height,
                network: epochs.network_epoch_height,
            });
        }

        let candidates: Vec<Validator> = state
            .validators()
            .await?
            .into_iter()
            .filter(|v| !v.is_only_for_investment)
            .filter(|v| {
                v.last_classic_stake_increasing_epoch_height
                    .map_or(true, |height| height < epochs.pool_epoch_height)
            })
            .collect();

        let fund = state.fund().await?;
        if fund.classic_unstaked_balance.is_zero() {
            info!("increase stake: classic unstaked balance is zero");
            return Ok(());
        }
        if candidates.is_empty() {
            info!("increase stake: not found available validators");
            return Ok(());
        }

        let shares = rebalance::split_evenly(&fund.classic_unstaked_balance, &candidates);
        if shares.is_empty() {
            info!(
                unstaked = %fund.classic_unstaked_balance,
                "increase stake: fund below the minimum share, deferring"
            );
            return Ok(());
        }

        for (validator, amount) in &shares {
            let outcome = self
                .gateway
                .call(
                    "increase_validator_stake",
                    json!({
                        "validator_account_id": validator,
                        "near_amount": amount.to_decimal_string(),
                    }),
                )
                .await?;
            let accepted = match outcome.status {
                ExecutionStatus::Failure(message) => {
                    return Err(OperatorError::CallFailed {
                        method: "increase_validator_stake",
                        message,
                    })
                }
                ExecutionStatus::SuccessValue(bytes) => serde_json::from_slice::<bool>(&bytes)
                    .map_err(|source| OperatorError::Decode {
                        what: "increase_validator_stake",
                        source,
                    })?,
                ExecutionStatus::SuccessReceipt => {
                    return Err(OperatorError::MissingResult {
                        method: "increase_validator_stake",
                    })
                }
            };
            info!(
                validator = %validator,
                amount = %amount,
                accepted,
                tx_hash = %outcome.tx_hash,
                "increase validator stake"
            );
            if !accepted {
                return Err(OperatorError::IncreaseRejected(validator.clone()));
            }
        }

        let outcome = self
            .gateway
            .call("confirm_stake_distribution", Value::Null)
            .await?;
        if let ExecutionStatus::Failure(message) = outcome.status {
            return Err(OperatorError::CallFailed {
                method: "confirm_stake_distribution",
                message,
            });
        }

        info!(
            shares = shares.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "stake distribution confirmed"
        );
        Ok(())
    }
}
