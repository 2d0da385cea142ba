//! Domain types mirroring the pool contract's JSON shapes.
//!
//! Field names are the contract's and must stay verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stakeward_numeric::Balance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EpochHeights {
    pub pool_epoch_height: u64,
    pub network_epoch_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Validator {
    pub account_id: String,
    pub classic_staked_balance: Balance,
    pub investment_staked_balance: Balance,
    pub unstaked_balance: Balance,
    pub is_only_for_investment: bool,
    pub last_update_epoch_height: u64,
    /// Absent until the validator first receives a classic-stake increase.
    pub last_classic_stake_increasing_epoch_height: Option<u64>,
}

/// The pool's aggregate balance sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct Fund {
    pub classic_unstaked_balance: Balance,
    pub classic_staked_balance: Balance,
    pub investment_staked_balance: Balance,
    pub common_staked_balance: Balance,
    pub common_balance: Balance,
}

/// Pending user withdrawal obligations. Investment registry entries are
/// `[validator_account_id, amount]` pairs on the wire; they are kept raw
/// here and validated where they are consumed; a malformed entry aborts
/// the tick.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalFund {
    pub classic_near_amount: Balance,
    pub investment_near_amount: Balance,
    #[serde(default)]
    pub investment_withdrawal_registry: Vec<Value>,
}

/// Shape every state-mutating contract call returns; the epoch height is
/// the anti-stale guard checked against the tick's snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CallbackResult {
    pub is_success: bool,
    pub network_epoch_height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StakeDecreasingType {
    Classic,
    Investment,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validator_deserializes_contract_shape() {
        let validator: Validator = serde_json::from_value(json!({
            "account_id": "v1.near",
            "classic_staked_balance": "10000000000000000000000000",
            "investment_staked_balance": "0",
            "unstaked_balance": "0",
            "is_only_for_investment": false,
            "last_update_epoch_height": 812,
            "last_classic_stake_increasing_epoch_height": null,
        }))
        .unwrap();
        assert_eq!(validator.account_id, "v1.near");
        assert!(validator.last_classic_stake_increasing_epoch_height.is_none());
        assert_eq!(
            validator.classic_staked_balance,
            Balance::from(10u64) * Balance::one_token()
        );
    }

    #[test]
    fn test_withdrawal_registry_defaults_empty() {
        let fund: WithdrawalFund = serde_json::from_value(json!({
            "classic_near_amount": "0",
            "investment_near_amount": "0",
        }))
        .unwrap();
        assert!(fund.investment_withdrawal_registry.is_empty());
    }

    #[test]
    fn test_stake_decreasing_type_serializes_as_bare_string() {
        assert_eq!(
            serde_json::to_value(StakeDecreasingType::Classic).unwrap(),
            json!("Classic")
        );
        assert_eq!(
            serde_json::to_value(StakeDecreasingType::Investment).unwrap(),
            json!("Investment")
        );
    }
}
