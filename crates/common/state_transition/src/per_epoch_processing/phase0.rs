//! Epoch processing that reads ``PendingAttestation`` records.

use std::collections::HashSet;

use anyhow::{anyhow, ensure};
use ream_consensus_beacon::beacon_state::{BeaconState, PendingAttestations};
use ream_consensus_misc::{
    constants::{
        BASE_REWARDS_PER_EPOCH, EFFECTIVE_BALANCE_INCREMENT, GENESIS_EPOCH,
        INACTIVITY_PENALTY_QUOTIENT, PROPOSER_REWARD_QUOTIENT,
    },
    pending_attestation::PendingAttestation,
};

pub type Deltas = (Vec<u64>, Vec<u64>);

pub fn get_matching_source_attestations(
    state: &BeaconState,
    epoch: u64,
) -> anyhow::Result<Vec<&PendingAttestation>> {
    ensure!(
        epoch == state.get_previous_epoch() || epoch == state.get_current_epoch(),
        "Epoch must be either the previous or current epoch"
    );
    let attestations = if epoch == state.get_current_epoch() {
        state.current_epoch_attestations()?
    } else {
        state.previous_epoch_attestations()?
    };
    Ok(attestations.iter().collect())
}

pub fn get_matching_target_attestations(
    state: &BeaconState,
    epoch: u64,
) -> anyhow::Result<Vec<&PendingAttestation>> {
    let block_root = state.get_block_root(epoch)?;
    Ok(get_matching_source_attestations(state, epoch)?
        .into_iter()
        .filter(|attestation| attestation.data.target.root == block_root)
        .collect())
}

pub fn get_matching_head_attestations(
    state: &BeaconState,
    epoch: u64,
) -> anyhow::Result<Vec<&PendingAttestation>> {
    let mut head_attestations = vec![];
    for attestation in get_matching_target_attestations(state, epoch)? {
        if attestation.data.beacon_block_root
            == state.get_block_root_at_slot(attestation.data.slot)?
        {
            head_attestations.push(attestation);
        }
    }
    Ok(head_attestations)
}

pub fn get_unslashed_attesting_indices(
    state: &BeaconState,
    attestations: &[&PendingAttestation],
) -> anyhow::Result<HashSet<u64>> {
    let mut output = HashSet::new();
    for attestation in attestations {
        output.extend(state.get_attesting_indices(&attestation.data, &attestation.aggregation_bits)?);
    }
    let validators = state.validators();
    output.retain(|&index| {
        validators
            .get(index as usize)
            .is_some_and(|validator| !validator.slashed)
    });
    Ok(output)
}

/// Return the combined effective balance of the set of unslashed validators participating in
/// ``attestations``.
pub fn get_attesting_balance(
    state: &BeaconState,
    attestations: &[&PendingAttestation],
) -> anyhow::Result<u64> {
    Ok(state.get_total_balance(get_unslashed_attesting_indices(state, attestations)?))
}

fn get_proposer_reward(base_reward: u64) -> u64 {
    base_reward / PROPOSER_REWARD_QUOTIENT
}

/// Helper with shared logic for use by get source, target, and head deltas functions
fn get_attestation_component_deltas(
    state: &BeaconState,
    attestations: &[&PendingAttestation],
    total_balance: u64,
    eligible_validator_indices: &[u64],
) -> anyhow::Result<Deltas> {
    let validator_count = state.validators().len();
    let mut rewards = vec![0; validator_count];
    let mut penalties = vec![0; validator_count];

    let unslashed_attesting_indices = get_unslashed_attesting_indices(state, attestations)?;
    let attesting_balance = state.get_total_balance(unslashed_attesting_indices.iter().copied());
    let is_in_inactivity_leak = state.is_in_inactivity_leak();
    for &index in eligible_validator_indices {
        let base_reward = state.get_base_reward(index, total_balance)?;
        if unslashed_attesting_indices.contains(&index) {
            let increment = EFFECTIVE_BALANCE_INCREMENT;
            if is_in_inactivity_leak {
                // Since full base reward will be canceled out by inactivity penalty deltas,
                // optimal participation receives full base reward compensation here.
                rewards[index as usize] += base_reward;
            } else {
                let reward_numerator = base_reward * (attesting_balance / increment);
                rewards[index as usize] += reward_numerator / (total_balance / increment);
            }
        } else {
            penalties[index as usize] += base_reward;
        }
    }

    Ok((rewards, penalties))
}

/// Return proposer and inclusion delay micro-rewards/penalties for each validator.
fn get_inclusion_delay_deltas(
    state: &BeaconState,
    source_attestations: &[&PendingAttestation],
    total_balance: u64,
) -> anyhow::Result<Deltas> {
    let validator_count = state.validators().len();
    let mut rewards = vec![0; validator_count];

    let attesting_indices = source_attestations
        .iter()
        .map(|attestation| {
            Ok((
                state.get_attesting_indices(&attestation.data, &attestation.aggregation_bits)?,
                *attestation,
            ))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    for index in get_unslashed_attesting_indices(state, source_attestations)? {
        let attestation = attesting_indices
            .iter()
            .filter(|(indices, _)| indices.contains(&index))
            .map(|(_, attestation)| *attestation)
            .min_by_key(|attestation| attestation.inclusion_delay)
            .ok_or_else(|| anyhow!("No attestation found for attester {index}"))?;
        ensure!(
            attestation.inclusion_delay > 0,
            "Attestation included with zero delay"
        );

        let base_reward = state.get_base_reward(index, total_balance)?;
        let proposer_reward = get_proposer_reward(base_reward);
        let proposer = rewards
            .get_mut(attestation.proposer_index as usize)
            .ok_or_else(|| anyhow!("Invalid proposer index {}", attestation.proposer_index))?;
        *proposer += proposer_reward;
        let max_attester_reward = base_reward - proposer_reward;
        rewards[index as usize] += max_attester_reward / attestation.inclusion_delay;
    }

    // No penalties associated with inclusion delay
    Ok((rewards, vec![0; validator_count]))
}

/// Return inactivity reward/penalty deltas for each validator.
fn get_inactivity_penalty_deltas(
    state: &BeaconState,
    target_attestations: &[&PendingAttestation],
    total_balance: u64,
    eligible_validator_indices: &[u64],
) -> anyhow::Result<Deltas> {
    let validator_count = state.validators().len();
    let mut penalties = vec![0; validator_count];

    if state.is_in_inactivity_leak() {
        let matching_target_attesting_indices =
            get_unslashed_attesting_indices(state, target_attestations)?;
        let finality_delay = state.get_finality_delay();
        for &index in eligible_validator_indices {
            // If validator is performing optimally this cancels all rewards for a neutral balance
            let base_reward = state.get_base_reward(index, total_balance)?;
            penalties[index as usize] +=
                BASE_REWARDS_PER_EPOCH * base_reward - get_proposer_reward(base_reward);
            if !matching_target_attesting_indices.contains(&index) {
                let effective_balance = state.validators()[index as usize].effective_balance;
                penalties[index as usize] +=
                    effective_balance * finality_delay / INACTIVITY_PENALTY_QUOTIENT;
            }
        }
    }

    // No rewards associated with inactivity penalties
    Ok((vec![0; validator_count], penalties))
}

pub fn get_attestation_deltas(state: &BeaconState) -> anyhow::Result<Vec<Deltas>> {
    let previous_epoch = state.get_previous_epoch();
    let total_balance = state.get_total_active_balance();
    let eligible_validator_indices = state.get_eligible_validator_indices();
    let source_attestations = get_matching_source_attestations(state, previous_epoch)?;
    let target_attestations = get_matching_target_attestations(state, previous_epoch)?;
    let head_attestations = get_matching_head_attestations(state, previous_epoch)?;

    Ok(vec![
        get_attestation_component_deltas(
            state,
            &source_attestations,
            total_balance,
            &eligible_validator_indices,
        )?,
        get_attestation_component_deltas(
            state,
            &target_attestations,
            total_balance,
            &eligible_validator_indices,
        )?,
        get_attestation_component_deltas(
            state,
            &head_attestations,
            total_balance,
            &eligible_validator_indices,
        )?,
        get_inclusion_delay_deltas(state, &source_attestations, total_balance)?,
        get_inactivity_penalty_deltas(
            state,
            &target_attestations,
            total_balance,
            &eligible_validator_indices,
        )?,
    ])
}

pub fn process_rewards_and_penalties(state: &mut BeaconState) -> anyhow::Result<()> {
    // No rewards are applied at the end of `GENESIS_EPOCH` because rewards are for work done in
    // the previous epoch
    if state.get_current_epoch() == GENESIS_EPOCH {
        return Ok(());
    }

    let validator_count = state.validators().len();
    let totals = sum_deltas(get_attestation_deltas(state)?, validator_count);
    apply_deltas(state, vec![totals])
}

/// Fold every component into one reward and one penalty per validator.
pub fn sum_deltas(deltas: Vec<Deltas>, validator_count: usize) -> Deltas {
    let mut totals = (vec![0; validator_count], vec![0; validator_count]);
    for (rewards, penalties) in deltas {
        for (index, (reward, penalty)) in rewards.into_iter().zip(penalties).enumerate() {
            totals.0[index] += reward;
            totals.1[index] += penalty;
        }
    }
    totals
}

pub(crate) fn apply_deltas(state: &mut BeaconState, deltas: Vec<Deltas>) -> anyhow::Result<()> {
    for (rewards, penalties) in deltas {
        for (index, (reward, penalty)) in rewards.into_iter().zip(penalties).enumerate() {
            state.increase_balance(index as u64, reward)?;
            state.decrease_balance(index as u64, penalty)?;
        }
    }
    Ok(())
}

pub fn process_participation_record_updates(state: &mut BeaconState) -> anyhow::Result<()> {
    // Rotate current/previous epoch attestations
    let current_epoch_attestations = state.current_epoch_attestations()?.clone();
    *state.previous_epoch_attestations_mut()? = current_epoch_attestations;
    *state.current_epoch_attestations_mut()? = PendingAttestations::default();
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use ream_consensus_misc::{
        attestation_data::AttestationData, checkpoint::Checkpoint, constants::SLOTS_PER_EPOCH,
        fork_name::ForkName,
    };
    use ream_network_spec::networks::DEV;
    use ssz_types::BitList;

    use super::*;
    use crate::genesis::{interop_genesis_state, interop_secret_keys};

    fn phase0_state_in_epoch(validator_count: usize, epoch: u64) -> BeaconState {
        let keys = interop_secret_keys(validator_count).unwrap();
        let mut state = interop_genesis_state(&DEV, ForkName::Phase0, &keys, 0).unwrap();
        *state.slot_mut() = epoch * SLOTS_PER_EPOCH;
        state
    }

    #[test]
    fn test_sum_deltas_offsets_penalties_with_later_rewards() {
        let mut state = phase0_state_in_epoch(8, 2);
        state.balances_mut()[0] = 100;

        let mut deltas = vec![];
        for _ in 0..3 {
            let mut penalties = vec![0; 8];
            penalties[0] = 300;
            deltas.push((vec![0; 8], penalties));
        }
        let mut rewards = vec![0; 8];
        rewards[0] = 1000;
        deltas.push((rewards, vec![0; 8]));

        let totals = sum_deltas(deltas, 8);
        assert_eq!(totals.0[0], 1000);
        assert_eq!(totals.1[0], 900);

        apply_deltas(&mut state, vec![totals]).unwrap();
        assert_eq!(state.balances()[0], 200);
    }

    #[test]
    fn test_low_balance_proposer_rewards_are_netted_against_missed_duties() {
        let mut state = phase0_state_in_epoch(64, 2);
        let attestation_slot = SLOTS_PER_EPOCH;
        let committee = state.get_beacon_committee(attestation_slot, 0).unwrap();
        assert!(!committee.is_empty());
        let proposer = (0..64).find(|index| !committee.contains(index)).unwrap();

        let mut aggregation_bits = BitList::with_capacity(committee.len()).unwrap();
        for position in 0..committee.len() {
            aggregation_bits.set(position, true).unwrap();
        }
        // Wrong target and head, so only the source component is earned by the committee
        let attestation = PendingAttestation {
            aggregation_bits,
            data: AttestationData {
                slot: attestation_slot,
                index: 0,
                beacon_block_root: B256::repeat_byte(2),
                source: Checkpoint::default(),
                target: Checkpoint {
                    epoch: 1,
                    root: B256::repeat_byte(1),
                },
            },
            inclusion_delay: 1,
            proposer_index: proposer,
        };
        state
            .previous_epoch_attestations_mut()
            .unwrap()
            .push(attestation)
            .unwrap();
        state.balances_mut()[proposer as usize] = 100;

        let (rewards, penalties) = sum_deltas(get_attestation_deltas(&state).unwrap(), 64);
        let proposer_reward = rewards[proposer as usize];
        let proposer_penalty = penalties[proposer as usize];
        assert!(proposer_reward > 100);
        assert!(proposer_penalty > 100 + proposer_reward);

        process_rewards_and_penalties(&mut state).unwrap();

        // Per component application would leave the proposer reward standing
        assert_eq!(state.balances()[proposer as usize], 0);
        let attester = committee[0] as usize;
        assert_eq!(
            state.balances()[attester],
            32_000_000_000 + rewards[attester] - penalties[attester]
        );
    }
}
