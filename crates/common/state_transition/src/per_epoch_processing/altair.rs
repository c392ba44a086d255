//! Epoch processing driven by participation flags, shared by Altair, Bellatrix and Capella.

use std::cmp::min;

use anyhow::anyhow;
use ream_consensus_beacon::{
    beacon_state::{BeaconState, EpochParticipation},
    helpers::inactivity_penalty_quotient,
};
use ream_consensus_misc::constants::{
    EFFECTIVE_BALANCE_INCREMENT, EPOCHS_PER_SYNC_COMMITTEE_PERIOD, GENESIS_EPOCH, NUM_FLAG_INDICES,
    PARTICIPATION_FLAG_WEIGHTS, TIMELY_HEAD_FLAG_INDEX, TIMELY_TARGET_FLAG_INDEX,
    WEIGHT_DENOMINATOR,
};
use ream_network_spec::networks::BeaconNetworkSpec;

use super::phase0::{Deltas, apply_deltas};

pub fn process_inactivity_updates(
    state: &mut BeaconState,
    spec: &BeaconNetworkSpec,
) -> anyhow::Result<()> {
    // Skip the genesis epoch as score updates are based on the previous epoch participation
    if state.get_current_epoch() == GENESIS_EPOCH {
        return Ok(());
    }

    let previous_epoch = state.get_previous_epoch();
    let participating_indices =
        state.get_unslashed_participating_indices(TIMELY_TARGET_FLAG_INDEX, previous_epoch)?;
    let is_in_inactivity_leak = state.is_in_inactivity_leak();
    let eligible_validator_indices = state.get_eligible_validator_indices();

    let inactivity_scores = state.inactivity_scores_mut()?;
    for index in eligible_validator_indices {
        let score = inactivity_scores
            .get_mut(index as usize)
            .ok_or_else(|| anyhow!("Missing inactivity score for validator {index}"))?;
        // Increase the inactivity score of inactive validators
        if participating_indices.contains(&index) {
            *score -= min(1, *score);
        } else {
            *score += spec.inactivity_score_bias;
        }
        // Decrease the inactivity score of all eligible validators during a leak-free epoch
        if !is_in_inactivity_leak {
            *score -= min(spec.inactivity_score_recovery_rate, *score);
        }
    }

    Ok(())
}

/// Return the deltas for a given ``flag_index`` by scanning through the participation flags.
pub fn get_flag_index_deltas(
    state: &BeaconState,
    flag_index: u8,
    total_active_balance: u64,
    eligible_validator_indices: &[u64],
) -> anyhow::Result<Deltas> {
    let validator_count = state.validators().len();
    let mut rewards = vec![0; validator_count];
    let mut penalties = vec![0; validator_count];

    let previous_epoch = state.get_previous_epoch();
    let unslashed_participating_indices =
        state.get_unslashed_participating_indices(flag_index, previous_epoch)?;
    let weight = PARTICIPATION_FLAG_WEIGHTS[flag_index as usize];
    let unslashed_participating_balance =
        state.get_total_balance(unslashed_participating_indices.iter().copied());
    let unslashed_participating_increments =
        unslashed_participating_balance / EFFECTIVE_BALANCE_INCREMENT;
    let active_increments = total_active_balance / EFFECTIVE_BALANCE_INCREMENT;
    let is_in_inactivity_leak = state.is_in_inactivity_leak();

    for &index in eligible_validator_indices {
        let base_reward = state.get_base_reward(index, total_active_balance)?;
        if unslashed_participating_indices.contains(&index) {
            if !is_in_inactivity_leak {
                let reward_numerator = base_reward * weight * unslashed_participating_increments;
                rewards[index as usize] +=
                    reward_numerator / (active_increments * WEIGHT_DENOMINATOR);
            }
        } else if flag_index != TIMELY_HEAD_FLAG_INDEX {
            penalties[index as usize] += base_reward * weight / WEIGHT_DENOMINATOR;
        }
    }

    Ok((rewards, penalties))
}

/// Return the inactivity penalty deltas by considering timely target participation flags and
/// inactivity scores.
pub fn get_inactivity_penalty_deltas(
    state: &BeaconState,
    spec: &BeaconNetworkSpec,
    eligible_validator_indices: &[u64],
) -> anyhow::Result<Deltas> {
    let validator_count = state.validators().len();
    let mut penalties = vec![0; validator_count];

    let previous_epoch = state.get_previous_epoch();
    let matching_target_indices =
        state.get_unslashed_participating_indices(TIMELY_TARGET_FLAG_INDEX, previous_epoch)?;
    let inactivity_scores = state.inactivity_scores()?;
    let penalty_denominator =
        spec.inactivity_score_bias * inactivity_penalty_quotient(state.fork_name());

    for &index in eligible_validator_indices {
        if !matching_target_indices.contains(&index) {
            let penalty_numerator = state.validators()[index as usize].effective_balance
                * inactivity_scores[index as usize];
            penalties[index as usize] += penalty_numerator / penalty_denominator;
        }
    }

    Ok((vec![0; validator_count], penalties))
}

pub fn process_rewards_and_penalties(
    state: &mut BeaconState,
    spec: &BeaconNetworkSpec,
) -> anyhow::Result<()> {
    // No rewards are applied at the end of `GENESIS_EPOCH` because rewards are for work done in
    // the previous epoch
    if state.get_current_epoch() == GENESIS_EPOCH {
        return Ok(());
    }

    let total_active_balance = state.get_total_active_balance();
    let eligible_validator_indices = state.get_eligible_validator_indices();
    let mut deltas = (0..NUM_FLAG_INDICES as u8)
        .map(|flag_index| {
            get_flag_index_deltas(
                state,
                flag_index,
                total_active_balance,
                &eligible_validator_indices,
            )
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    deltas.push(get_inactivity_penalty_deltas(
        state,
        spec,
        &eligible_validator_indices,
    )?);

    apply_deltas(state, deltas)
}

pub fn process_participation_flag_updates(state: &mut BeaconState) -> anyhow::Result<()> {
    let current_epoch_participation = state.current_epoch_participation()?.clone();
    let validator_count = state.validators().len();
    *state.previous_epoch_participation_mut()? = current_epoch_participation;
    *state.current_epoch_participation_mut()? = EpochParticipation::from(vec![0; validator_count]);
    Ok(())
}

pub fn process_sync_committee_updates(state: &mut BeaconState) -> anyhow::Result<()> {
    let next_epoch = state.get_current_epoch() + 1;
    if next_epoch % EPOCHS_PER_SYNC_COMMITTEE_PERIOD == 0 {
        let next_sync_committee = state.next_sync_committee()?.clone();
        let new_next_sync_committee = state.get_next_sync_committee()?;
        *state.current_sync_committee_mut()? = next_sync_committee;
        *state.next_sync_committee_mut()? = new_next_sync_committee;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ream_consensus_misc::{
        constants::{SLOTS_PER_EPOCH, TIMELY_SOURCE_FLAG_INDEX},
        fork_name::ForkName,
        misc::add_flag,
    };
    use ream_network_spec::networks::DEV;

    use super::*;
    use crate::genesis::{interop_genesis_state, interop_secret_keys};

    fn state_in_epoch(epoch: u64) -> BeaconState {
        let keys = interop_secret_keys(8).unwrap();
        let mut state = interop_genesis_state(&DEV, ForkName::Altair, &keys, 0).unwrap();
        *state.slot_mut() = epoch * SLOTS_PER_EPOCH;
        state
    }

    #[test]
    fn test_inactivity_scores_track_target_participation() {
        let mut state = state_in_epoch(2);
        let flags = add_flag(0, TIMELY_TARGET_FLAG_INDEX);
        state.previous_epoch_participation_mut().unwrap()[0] = flags;
        state.inactivity_scores_mut().unwrap()[0] = 10;
        state.inactivity_scores_mut().unwrap()[1] = 10;

        process_inactivity_updates(&mut state, &DEV).unwrap();

        let scores = state.inactivity_scores().unwrap();
        // Participant: -1 then recovery down to zero
        assert_eq!(scores[0], 0);
        // Non participant: +bias then recovery
        assert_eq!(
            scores[1],
            (10 + DEV.inactivity_score_bias).saturating_sub(DEV.inactivity_score_recovery_rate)
        );
    }

    #[test]
    fn test_flag_deltas_reward_participants_and_penalise_others() {
        let mut state = state_in_epoch(2);
        let participation = state.previous_epoch_participation_mut().unwrap();
        for flags in participation.iter_mut().take(6) {
            *flags = add_flag(*flags, TIMELY_SOURCE_FLAG_INDEX);
        }
        let total_active_balance = state.get_total_active_balance();
        let eligible = state.get_eligible_validator_indices();

        let (rewards, penalties) =
            get_flag_index_deltas(&state, TIMELY_SOURCE_FLAG_INDEX, total_active_balance, &eligible)
                .unwrap();

        assert!(rewards[..6].iter().all(|reward| *reward > 0));
        assert!(penalties[..6].iter().all(|penalty| *penalty == 0));
        assert!(rewards[6..].iter().all(|reward| *reward == 0));
        assert!(penalties[6..].iter().all(|penalty| *penalty > 0));
    }

    #[test]
    fn test_head_flag_has_no_penalty() {
        let state = state_in_epoch(2);
        let total_active_balance = state.get_total_active_balance();
        let eligible = state.get_eligible_validator_indices();

        let (_, penalties) =
            get_flag_index_deltas(&state, TIMELY_HEAD_FLAG_INDEX, total_active_balance, &eligible)
                .unwrap();

        assert!(penalties.iter().all(|penalty| *penalty == 0));
    }

    #[test]
    fn test_participation_flags_rotate() {
        let mut state = state_in_epoch(1);
        state.current_epoch_participation_mut().unwrap()[3] = 0b111;

        process_participation_flag_updates(&mut state).unwrap();

        assert_eq!(state.previous_epoch_participation().unwrap()[3], 0b111);
        assert!(
            state
                .current_epoch_participation()
                .unwrap()
                .iter()
                .all(|flags| *flags == 0)
        );
    }
}
