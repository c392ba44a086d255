use std::cmp::min;

use anyhow::{anyhow, ensure};
use ream_consensus_beacon::{
    beacon_block::ExecutionPayloadRef, beacon_state::BeaconState, withdrawal::Withdrawal,
};
use ream_consensus_misc::constants::{
    MAX_EFFECTIVE_BALANCE, MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP, MAX_WITHDRAWALS_PER_PAYLOAD,
};

/// Walk the registry from ``next_withdrawal_validator_index`` and collect the withdrawals the
/// next payload must carry.
pub fn get_expected_withdrawals(state: &BeaconState) -> anyhow::Result<Vec<Withdrawal>> {
    let epoch = state.get_current_epoch();
    let mut withdrawal_index = state.next_withdrawal_index()?;
    let mut validator_index = state.next_withdrawal_validator_index()?;
    let validators = state.validators();
    let balances = state.balances();
    let mut withdrawals = vec![];

    let bound = min(validators.len() as u64, MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP);
    for _ in 0..bound {
        let validator = validators
            .get(validator_index as usize)
            .ok_or_else(|| anyhow!("Validator {validator_index} not found"))?;
        let balance = balances
            .get(validator_index as usize)
            .copied()
            .ok_or_else(|| anyhow!("Balance of validator {validator_index} not found"))?;

        let amount = if validator.is_fully_withdrawable_validator(balance, epoch) {
            Some(balance)
        } else if validator.is_partially_withdrawable_validator(balance) {
            Some(balance - MAX_EFFECTIVE_BALANCE)
        } else {
            None
        };
        if let (Some(amount), Some(address)) = (amount, validator.withdrawal_address()) {
            withdrawals.push(Withdrawal {
                index: withdrawal_index,
                validator_index,
                address,
                amount,
            });
            withdrawal_index += 1;
        }

        if withdrawals.len() as u64 == MAX_WITHDRAWALS_PER_PAYLOAD {
            break;
        }
        validator_index = (validator_index + 1) % validators.len() as u64;
    }

    Ok(withdrawals)
}

pub fn process_withdrawals(
    state: &mut BeaconState,
    payload: ExecutionPayloadRef<'_>,
) -> anyhow::Result<()> {
    let expected_withdrawals = get_expected_withdrawals(state)?;
    let withdrawals = payload.withdrawals();
    ensure!(
        withdrawals.len() == expected_withdrawals.len(),
        "Expected {} withdrawals, payload carries {}",
        expected_withdrawals.len(),
        withdrawals.len()
    );

    for (expected_withdrawal, withdrawal) in expected_withdrawals.iter().zip(withdrawals) {
        ensure!(
            withdrawal == expected_withdrawal,
            "Withdrawal {} does not match the expected withdrawal",
            withdrawal.index
        );
        state.decrease_balance(withdrawal.validator_index, withdrawal.amount)?;
    }

    // Update the next withdrawal index if this block contained withdrawals
    if let Some(latest_withdrawal) = expected_withdrawals.last() {
        *state.next_withdrawal_index_mut()? = latest_withdrawal.index + 1;
    }

    // Update the next validator index to start the next withdrawal sweep
    let validator_count = state.validators().len() as u64;
    let next_validator_index = match expected_withdrawals.last() {
        // Next sweep starts after the latest withdrawal's validator index
        Some(latest_withdrawal)
            if expected_withdrawals.len() as u64 == MAX_WITHDRAWALS_PER_PAYLOAD =>
        {
            (latest_withdrawal.validator_index + 1) % validator_count
        }
        // Advance sweep by the max length of the sweep if there was not a full set of withdrawals
        _ => {
            (state.next_withdrawal_validator_index()? + MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP)
                % validator_count
        }
    };
    *state.next_withdrawal_validator_index_mut()? = next_validator_index;

    Ok(())
}
