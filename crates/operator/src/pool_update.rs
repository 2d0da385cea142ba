//! The epoch catch-up pipeline.
//!
//! Reclaim matured unstake, update every stale validator, satisfy pending
//! withdrawal requests, then advance the pool itself. Phases run strictly
//! in order and the first failure aborts the tick; every mutating call is
//! idempotent on-chain (guarded by `last_update_epoch_height`), so a rerun
//! next tick resumes where this one stopped.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use stakeward_chain::{CallOutcome, ExecutionStatus};
use stakeward_numeric::Balance;

use crate::state::StateReader;
use crate::types::{CallbackResult, StakeDecreasingType};
use crate::{OperatorError, StakePoolOperator, RECLAIM_EPOCH_INTERVAL};

/// Signer balance below which the low-balance hook fires: 0.01 token.
fn low_balance_floor() -> Balance {
    Balance::one_token() / Balance::from(100u64)
}

impl StakePoolOperator {
    /// Drive the pool's recorded epoch up to the network epoch.
    pub async fn pool_update(&self) -> Result<(), OperatorError> {
        let mut state = StateReader::new(self.gateway.as_ref());

        self.take_unstaked_balance(&mut state).await?;

        let epochs = state.epochs().await?;
        if epochs.pool_epoch_height == epochs.network_epoch_height {
            debug!("pool update: not yet");
            return Ok(());
        }

        self.watch_operator_balance().await?;

        let validators = state.validators().await?;
        for validator in &validators {
            if validator.last_update_epoch_height == epochs.network_epoch_height {
                warn!(validator = %validator.account_id, "validator already updated this epoch");
                continue;
            }
            let outcome = self
                .gateway
                .call(
                    "update_validator",
                    json!({ "validator_account_id": validator.account_id }),
                )
                .await?;
            expect_callback(
                outcome,
                "update_validator",
                &validator.account_id,
                epochs.network_epoch_height,
            )?;
        }

        self.requested_decrease_validator_stake(&mut state).await?;

        let outcome = self.gateway.call("update", Value::Null).await?;
        if let ExecutionStatus::Failure(message) = outcome.status {
            return Err(OperatorError::CallFailed {
                method: "update",
                message,
            });
        }
        info!(
            validators = validators.len(),
            tx_hash = %outcome.tx_hash,
            "pool updated"
        );
        Ok(())
    }

    /// Pull matured unstaked balances back into the pool. Runs only every
    /// [`RECLAIM_EPOCH_INTERVAL`]-th epoch, and only while the pool still
    /// trails the network.
    async fn take_unstaked_balance(
        &self,
        state: &mut StateReader<'_>,
    ) -> Result<(), OperatorError> {
        let epochs = state.epochs().await?;
        if epochs.network_epoch_height % RECLAIM_EPOCH_INTERVAL != 0
            || epochs.pool_epoch_height >= epochs.network_epoch_height
        {
            debug!("unstaked balance reclaim: not yet");
            return Ok(());
        }

        for validator in state.validators().await? {
            if validator.last_update_epoch_height == epochs.network_epoch_height {
                continue;
            }
            if !validator.unstaked_balance.is_positive() {
                continue;
            }
            let outcome = self
                .gateway
                .call(
                    "take_unstaked_balance",
                    json!({ "validator_account_id": validator.account_id }),
                )
                .await?;
            expect_callback(
                outcome,
                "take_unstaked_balance",
                &validator.account_id,
                epochs.network_epoch_height,
            )?;
        }
        Ok(())
    }

    /// Unstake what users have asked to withdraw: the classic need walks
    /// eligible validators in registry order, never taking more than a
    /// validator's classic stake; investment entries are executed verbatim.
    async fn requested_decrease_validator_stake(
        &self,
        state: &mut StateReader<'_>,
    ) -> Result<(), OperatorError> {
        let epochs = state.epochs().await?;
        if epochs.network_epoch_height % RECLAIM_EPOCH_INTERVAL != 0
            || epochs.pool_epoch_height >= epochs.network_epoch_height
        {
            debug!("requested stake decrease: not yet");
            return Ok(());
        }

        let withdrawal = state.withdrawal_fund().await?;
        let validators = state.validators().await?;

        let mut need = withdrawal.classic_near_amount.clone();
        let eligible = validators
            .iter()
            .filter(|v| !v.is_only_for_investment && v.classic_staked_balance.is_positive());
        for validator in eligible {
            if need.is_zero() {
                break;
            }
            let amount = if need >= validator.classic_staked_balance {
                validator.classic_staked_balance.clone()
            } else {
                need.clone()
            };
            self.decrease_stake(
                &validator.account_id,
                &amount,
                StakeDecreasingType::Classic,
                epochs.network_epoch_height,
            )
            .await?;
            need -= &amount;
        }

        for entry in &withdrawal.investment_withdrawal_registry {
            let (account_id, amount) = parse_withdrawal_entry(entry)?;
            self.decrease_stake(
                &account_id,
                &amount,
                StakeDecreasingType::Investment,
                epochs.network_epoch_height,
            )
            .await?;
        }
        Ok(())
    }

    async fn decrease_stake(
        &self,
        account_id: &str,
        amount: &Balance,
        decreasing_type: StakeDecreasingType,
        tick_epoch: u64,
    ) -> Result<(), OperatorError> {
        let outcome = self
            .gateway
            .call(
                "requested_decrease_validator_stake",
                json!({
                    "validator_account_id": account_id,
                    "near_amount": amount.to_decimal_string(),
                    "stake_decreasing_type": decreasing_type,
                }),
            )
            .await?;
        expect_callback(
            outcome,
            "requested_decrease_validator_stake",
            account_id,
            tick_epoch,
        )
    }

    /// Observe the signer account and hand a sub-floor balance to the
    /// configured hook.
    async fn watch_operator_balance(&self) -> Result<(), OperatorError> {
        let account = self.gateway.account_view(&self.operator_account).await?;
        if account.amount < low_balance_floor() {
            (self.low_balance_hook)(&account.amount);
        }
        Ok(())
    }
}

/// Validate a mutating call's result: the call must succeed, the contract
/// must report success, and the reported epoch must match the tick's
/// snapshot: a mismatch means the network advanced mid-tick and the whole
/// tick must rerun.
fn expect_callback(
    outcome: CallOutcome,
    method: &'static str,
    validator: &str,
    tick_epoch: u64,
) -> Result<(), OperatorError> {
    let bytes = match outcome.status {
        ExecutionStatus::Failure(message) => {
            return Err(OperatorError::CallFailed { method, message })
        }
        ExecutionStatus::SuccessValue(bytes) => bytes,
        ExecutionStatus::SuccessReceipt => return Err(OperatorError::MissingResult { method }),
    };
    let result: CallbackResult = serde_json::from_slice(&bytes)
        .map_err(|source| OperatorError::Decode {
            what: method,
            source,
        })?;
    if !result.is_success {
        return Err(OperatorError::CallbackRejected {
            method,
            validator: validator.to_owned(),
        });
    }
    if result.network_epoch_height != tick_epoch {
        return Err(OperatorError::EpochAdvanced {
            method,
            got: result.network_epoch_height,
            expected: tick_epoch,
        });
    }
    Ok(())
}

fn parse_withdrawal_entry(entry: &Value) -> Result<(String, Balance), OperatorError> {
    let malformed = || OperatorError::MalformedWithdrawalEntry(entry.to_string());
    let pair = entry
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(malformed)?;
    let account_id = pair[0].as_str().ok_or_else(malformed)?;
    let amount = pair[1].as_str().ok_or_else(malformed)?;
    Ok((account_id.to_owned(), Balance::parse(amount)?))
}
