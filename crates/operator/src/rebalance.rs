//! Stake distribution algorithms.
//!
//! `split_evenly` is what the distribution pipeline sends today: equal
//! parts, remainder to the last share, collapsing to fewer validators when
//! the equal part would be dust. `distribute` levels classic balances up
//! toward the current maximum instead and is exported for the planned
//! switch to reward-balanced redistribution.

use std::collections::HashMap;

use stakeward_numeric::Balance;

use crate::types::Validator;

/// Smallest share worth sending; below this, allocation collapses rather
/// than spraying dust-sized stake actions. One whole token.
pub fn min_rebalance() -> Balance {
    Balance::one_token()
}

/// Split `total` across `candidates` in registry order.
///
/// Each candidate receives `trunc(total / N)`; the last share also absorbs
/// the remainder. When the equal part is below [`min_rebalance`], only the
/// first `trunc(total / min_rebalance)` candidates are funded and the last
/// of those absorbs `total mod min_rebalance`. A total below one whole
/// token yields no shares at all.
pub fn split_evenly(total: &Balance, candidates: &[Validator]) -> Vec<(String, Balance)> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let count = Balance::from(candidates.len() as u64);
    let part = total / &count;

    if part < min_rebalance() {
        // part < min implies trunc(total / min) < N, so this never
        // over-indexes the candidate list.
        let funded = (total / &min_rebalance()).to_u64().unwrap_or(0) as usize;
        let mut shares: Vec<_> = candidates[..funded]
            .iter()
            .map(|v| (v.account_id.clone(), part.clone()))
            .collect();
        if let Some(last) = shares.last_mut() {
            last.1 += &(total % &min_rebalance());
        }
        shares
    } else {
        let mut shares: Vec<_> = candidates
            .iter()
            .map(|v| (v.account_id.clone(), part.clone()))
            .collect();
        if let Some(last) = shares.last_mut() {
            last.1 += &(total % &count);
        }
        shares
    }
}

/// Augment `shares` so that classic staked balances level up toward the
/// current maximum.
///
/// Effective balance is `classic_staked_balance` plus any share already
/// assigned. When every effective balance is level, an equal part above
/// [`min_rebalance`] tops up the validators already present in `shares`
/// (not the whole set); otherwise the entire remainder goes to the single
/// top-ranked validator. When balances are uneven, validators are walked in
/// descending effective balance, each filling its gap to the maximum, and
/// any leftover recurses.
pub fn distribute(
    mut remaining: Balance,
    shares: &mut HashMap<String, Balance>,
    validators: &[Validator],
) {
    if validators.is_empty() {
        return;
    }

    let mut effective: Vec<(&Validator, Balance)> = validators
        .iter()
        .map(|v| {
            let mut balance = v.classic_staked_balance.clone();
            if let Some(share) = shares.get(&v.account_id) {
                balance += share;
            }
            (v, balance)
        })
        .collect();

    let max = effective
        .iter()
        .map(|(_, balance)| balance.clone())
        .max()
        .unwrap_or_default();

    // descending by effective balance
    effective.sort_by(|a, b| b.1.cmp(&a.1));

    if effective.iter().all(|(_, balance)| *balance == max) {
        let part = &remaining / &Balance::from(validators.len() as u64);
        if part > min_rebalance() {
            for stake in shares.values_mut() {
                *stake += &part;
            }
        } else {
            shares.insert(effective[0].0.account_id.clone(), remaining);
        }
        return;
    }

    for (validator, balance) in &effective {
        let lack = &max - balance;
        if lack.is_zero() {
            continue;
        }
        if remaining >= lack {
            *shares.entry(validator.account_id.clone()).or_default() += &lack;
            remaining -= &lack;
        } else {
            if remaining.is_positive() {
                *shares.entry(validator.account_id.clone()).or_default() += &remaining;
            }
            return;
        }
    }

    if remaining.is_zero() {
        return;
    }
    distribute(remaining, shares, validators);
}
