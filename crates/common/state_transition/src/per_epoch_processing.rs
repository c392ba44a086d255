pub mod altair;
pub mod justification;
pub mod phase0;

use std::cmp::min;

use anyhow::anyhow;
use itertools::Itertools;
use ream_consensus_beacon::{
    beacon_state::{BeaconState, Eth1DataVotes},
    helpers::proportional_slashing_multiplier,
};
use ream_consensus_misc::{
    constants::{
        EFFECTIVE_BALANCE_INCREMENT, EPOCHS_PER_ETH1_VOTING_PERIOD, EPOCHS_PER_HISTORICAL_VECTOR,
        EPOCHS_PER_SLASHINGS_VECTOR, HYSTERESIS_DOWNWARD_MULTIPLIER, HYSTERESIS_QUOTIENT,
        HYSTERESIS_UPWARD_MULTIPLIER, MAX_EFFECTIVE_BALANCE, SLOTS_PER_EPOCH,
        SLOTS_PER_HISTORICAL_ROOT,
    },
    fork_name::ForkName,
    historical_summary::HistoricalSummary,
    misc::compute_activation_exit_epoch,
};
use ream_merkle::{HashTreeRoot, merkleize_container};
use ream_network_spec::networks::BeaconNetworkSpec;

use self::justification::process_justification_and_finalization;

/// Run the epoch transition of ``state`` in the order its fork requires.
pub fn process_epoch(state: &mut BeaconState, spec: &BeaconNetworkSpec) -> anyhow::Result<()> {
    match state.fork_name() {
        ForkName::Phase0 => {
            process_justification_and_finalization(state)?;
            phase0::process_rewards_and_penalties(state)?;
            process_registry_updates(state, spec)?;
            process_slashings(state)?;
            process_eth1_data_reset(state);
            process_effective_balance_updates(state);
            process_slashings_reset(state);
            process_randao_mixes_reset(state);
            process_historical_roots_update(state)?;
            phase0::process_participation_record_updates(state)?;
        }
        fork => {
            process_justification_and_finalization(state)?;
            altair::process_inactivity_updates(state, spec)?;
            altair::process_rewards_and_penalties(state, spec)?;
            process_registry_updates(state, spec)?;
            process_slashings(state)?;
            process_eth1_data_reset(state);
            process_effective_balance_updates(state);
            process_slashings_reset(state);
            process_randao_mixes_reset(state);
            if fork.capella_enabled() {
                process_historical_summaries_update(state)?;
            } else {
                process_historical_roots_update(state)?;
            }
            altair::process_participation_flag_updates(state)?;
            altair::process_sync_committee_updates(state)?;
        }
    }

    Ok(())
}

pub fn process_registry_updates(
    state: &mut BeaconState,
    spec: &BeaconNetworkSpec,
) -> anyhow::Result<()> {
    let current_epoch = state.get_current_epoch();

    // Process activation eligibility and ejections
    let newly_eligible = state
        .validators()
        .iter()
        .positions(|validator| validator.is_eligible_for_activation_queue())
        .collect::<Vec<_>>();
    let ejected = state
        .validators()
        .iter()
        .positions(|validator| {
            validator.is_active_validator(current_epoch)
                && validator.effective_balance <= spec.ejection_balance
        })
        .collect::<Vec<_>>();

    if !newly_eligible.is_empty() {
        let validators = state.validators_mut();
        for index in newly_eligible {
            validators[index].activation_eligibility_epoch = current_epoch + 1;
        }
    }
    for index in ejected {
        state.initiate_validator_exit(index as u64, spec)?;
    }

    // Queue validators eligible for activation and not yet dequeued for activation
    let finalized_epoch = state.finalized_checkpoint().epoch;
    let activation_queue = state
        .validators()
        .iter()
        .enumerate()
        .filter(|(_, validator)| validator.is_eligible_for_activation(finalized_epoch))
        .sorted_by_key(|(index, validator)| (validator.activation_eligibility_epoch, *index))
        .map(|(index, _)| index)
        .take(state.get_validator_churn_limit(spec) as usize)
        .collect::<Vec<_>>();

    // Dequeued validators for activation up to churn limit
    if !activation_queue.is_empty() {
        let activation_epoch = compute_activation_exit_epoch(current_epoch);
        let validators = state.validators_mut();
        for index in activation_queue {
            validators[index].activation_epoch = activation_epoch;
        }
    }

    Ok(())
}

pub fn process_slashings(state: &mut BeaconState) -> anyhow::Result<()> {
    let epoch = state.get_current_epoch();
    let total_balance = state.get_total_active_balance();
    let adjusted_total_slashing_balance = min(
        state.slashings().iter().sum::<u64>() * proportional_slashing_multiplier(state.fork_name()),
        total_balance,
    );

    let penalties = state
        .validators()
        .iter()
        .enumerate()
        .filter(|(_, validator)| {
            validator.slashed
                && epoch + EPOCHS_PER_SLASHINGS_VECTOR / 2 == validator.withdrawable_epoch
        })
        .map(|(index, validator)| {
            // Factored out from penalty numerator to avoid uint64 overflow
            let increment = EFFECTIVE_BALANCE_INCREMENT;
            let penalty_numerator =
                validator.effective_balance / increment * adjusted_total_slashing_balance;
            (index as u64, penalty_numerator / total_balance * increment)
        })
        .collect::<Vec<_>>();

    for (index, penalty) in penalties {
        state.decrease_balance(index, penalty)?;
    }

    Ok(())
}

pub fn process_eth1_data_reset(state: &mut BeaconState) {
    let next_epoch = state.get_current_epoch() + 1;

    // Reset eth1 data votes
    if next_epoch % EPOCHS_PER_ETH1_VOTING_PERIOD == 0 {
        *state.eth1_data_votes_mut() = Eth1DataVotes::default();
    }
}

pub fn process_effective_balance_updates(state: &mut BeaconState) {
    let hysteresis_increment = EFFECTIVE_BALANCE_INCREMENT / HYSTERESIS_QUOTIENT;
    let downward_threshold = hysteresis_increment * HYSTERESIS_DOWNWARD_MULTIPLIER;
    let upward_threshold = hysteresis_increment * HYSTERESIS_UPWARD_MULTIPLIER;

    let updates = state
        .validators()
        .iter()
        .zip(state.balances().iter())
        .enumerate()
        .filter(|(_, (validator, balance))| {
            **balance + downward_threshold < validator.effective_balance
                || validator.effective_balance + upward_threshold < **balance
        })
        .map(|(index, (_, balance))| {
            (
                index,
                min(
                    balance - balance % EFFECTIVE_BALANCE_INCREMENT,
                    MAX_EFFECTIVE_BALANCE,
                ),
            )
        })
        .collect::<Vec<_>>();

    if updates.is_empty() {
        return;
    }
    let validators = state.validators_mut();
    for (index, effective_balance) in updates {
        validators[index].effective_balance = effective_balance;
    }
}

pub fn process_slashings_reset(state: &mut BeaconState) {
    let next_epoch = state.get_current_epoch() + 1;

    // Reset slashings
    state.slashings_mut()[(next_epoch % EPOCHS_PER_SLASHINGS_VECTOR) as usize] = 0;
}

pub fn process_randao_mixes_reset(state: &mut BeaconState) {
    let current_epoch = state.get_current_epoch();
    let next_epoch = current_epoch + 1;

    // Set randao mix
    let mix = state.get_randao_mix(current_epoch);
    state.randao_mixes_mut()[(next_epoch % EPOCHS_PER_HISTORICAL_VECTOR) as usize] = mix;
}

fn is_historical_period_end(state: &BeaconState) -> bool {
    let next_epoch = state.get_current_epoch() + 1;
    next_epoch % (SLOTS_PER_HISTORICAL_ROOT / SLOTS_PER_EPOCH) == 0
}

/// Set historical root accumulator.
pub fn process_historical_roots_update(state: &mut BeaconState) -> anyhow::Result<()> {
    if !is_historical_period_end(state) {
        return Ok(());
    }

    // Root of the ``HistoricalBatch`` container built from both root vectors
    let historical_batch_root = merkleize_container(&[
        state.block_roots().hash_tree_root()?,
        state.state_roots().hash_tree_root()?,
    ]);
    state
        .historical_roots_mut()
        .push(historical_batch_root)
        .map_err(|err| anyhow!("Failed to append historical root: {err:?}"))
}

/// Set historical block root accumulator.
pub fn process_historical_summaries_update(state: &mut BeaconState) -> anyhow::Result<()> {
    if !is_historical_period_end(state) {
        return Ok(());
    }

    let historical_summary = HistoricalSummary {
        block_summary_root: state.block_roots().hash_tree_root()?,
        state_summary_root: state.state_roots().hash_tree_root()?,
    };
    state
        .historical_summaries_mut()?
        .push(historical_summary)
        .map_err(|err| anyhow!("Failed to append historical summary: {err:?}"))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use ream_consensus_misc::constants::FAR_FUTURE_EPOCH;
    use ream_network_spec::networks::DEV;

    use super::*;
    use crate::genesis::{interop_genesis_state, interop_secret_keys};

    fn genesis(fork: ForkName, validator_count: usize) -> BeaconState {
        let keys = interop_secret_keys(validator_count).unwrap();
        interop_genesis_state(&DEV, fork, &keys, 0).unwrap()
    }

    #[test]
    fn test_effective_balance_hysteresis() {
        let mut state = genesis(ForkName::Phase0, 4);
        // Small dips stay within the downward threshold
        state.balances_mut()[0] = MAX_EFFECTIVE_BALANCE - 200_000_000;
        // Large dips round down to the next increment
        state.balances_mut()[1] = MAX_EFFECTIVE_BALANCE - 1_300_000_000;

        process_effective_balance_updates(&mut state);

        assert_eq!(state.validators()[0].effective_balance, MAX_EFFECTIVE_BALANCE);
        assert_eq!(
            state.validators()[1].effective_balance,
            MAX_EFFECTIVE_BALANCE - 2_000_000_000
        );
    }

    #[test]
    fn test_registry_updates_eject_low_balance() {
        let mut state = genesis(ForkName::Altair, 4);
        state.validators_mut()[2].effective_balance = DEV.ejection_balance;

        process_registry_updates(&mut state, &DEV).unwrap();

        let validator = &state.validators()[2];
        assert_eq!(validator.exit_epoch, compute_activation_exit_epoch(0));
        assert_ne!(validator.withdrawable_epoch, FAR_FUTURE_EPOCH);
        assert_eq!(state.validators()[3].exit_epoch, FAR_FUTURE_EPOCH);
    }

    #[test]
    fn test_registry_updates_queue_new_validator() {
        let mut state = genesis(ForkName::Phase0, 4);
        state
            .add_validator_to_registry(
                state.validators()[0].pubkey.clone(),
                state.validators()[0].withdrawal_credentials,
                MAX_EFFECTIVE_BALANCE,
            )
            .unwrap();

        process_registry_updates(&mut state, &DEV).unwrap();

        let validator = &state.validators()[4];
        assert_eq!(validator.activation_eligibility_epoch, 1);
        assert_eq!(validator.activation_epoch, FAR_FUTURE_EPOCH);
    }

    #[test]
    fn test_randao_mix_carried_into_next_epoch() {
        let mut state = genesis(ForkName::Phase0, 4);
        state.randao_mixes_mut()[0] = B256::repeat_byte(9);

        process_randao_mixes_reset(&mut state);

        assert_eq!(state.randao_mixes()[1], B256::repeat_byte(9));
    }

    #[test]
    fn test_slashings_reset_only_touches_slashings() {
        let mut state = genesis(ForkName::Altair, 4);
        state.slashings_mut()[1] = 7;
        state.hash_tree_root();
        let before = state.clone();

        process_slashings_reset(&mut state);

        assert_eq!(state.slashings()[1], 0);
        assert_eq!(state.dirty_fields(), vec!["slashings"]);
        assert_eq!(before.slashings()[1], 7);
    }
}
