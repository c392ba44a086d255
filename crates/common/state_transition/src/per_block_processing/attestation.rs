use anyhow::{anyhow, ensure};
use ream_consensus_beacon::{
    attestation::Attestation, beacon_state::BeaconState, helpers::eth_aggregate_pubkeys,
};
use ream_consensus_misc::{
    constants::{
        DOMAIN_BEACON_ATTESTER, MIN_ATTESTATION_INCLUSION_DELAY, PARTICIPATION_FLAG_WEIGHTS,
        PROPOSER_WEIGHT, SLOTS_PER_EPOCH, WEIGHT_DENOMINATOR,
    },
    indexed_attestation::IndexedAttestation,
    misc::{add_flag, compute_epoch_at_slot, compute_signing_root, has_flag},
    pending_attestation::PendingAttestation,
};

use crate::signature_set::SignatureSet;

/// Add one entry for ``indexed_attestation``, checked against the aggregate of its attesters'
/// public keys.
pub(crate) fn add_indexed_attestation_signature(
    state: &BeaconState,
    indexed_attestation: &IndexedAttestation,
    signature_set: &mut SignatureSet,
) -> anyhow::Result<()> {
    let pubkeys = state.get_attesting_pubkeys(indexed_attestation)?;
    let aggregate_pubkey = eth_aggregate_pubkeys(&pubkeys)?;
    let domain = state.get_domain(
        DOMAIN_BEACON_ATTESTER,
        Some(indexed_attestation.data.target.epoch),
    );
    signature_set.add(
        aggregate_pubkey,
        compute_signing_root(&indexed_attestation.data, domain),
        indexed_attestation.signature.clone(),
        "attestation signature",
    );
    Ok(())
}

pub fn process_attestation(
    state: &mut BeaconState,
    attestation: &Attestation,
    signature_set: &mut SignatureSet,
) -> anyhow::Result<()> {
    let data = &attestation.data;
    let current_epoch = state.get_current_epoch();

    ensure!(
        data.target.epoch == state.get_previous_epoch() || data.target.epoch == current_epoch,
        "Attestation target epoch {} is neither the previous nor the current epoch",
        data.target.epoch
    );
    ensure!(
        data.target.epoch == compute_epoch_at_slot(data.slot),
        "Attestation target epoch {} does not match slot {}",
        data.target.epoch,
        data.slot
    );
    ensure!(
        data.slot + MIN_ATTESTATION_INCLUSION_DELAY <= state.slot()
            && state.slot() <= data.slot + SLOTS_PER_EPOCH,
        "Attestation slot {} is outside the inclusion window of slot {}",
        data.slot,
        state.slot()
    );
    ensure!(
        data.index < state.get_committee_count_per_slot(data.target.epoch),
        "Attestation committee index {} is out of range",
        data.index
    );

    // Checks the aggregation bits against the committee size
    let indexed_attestation = state.get_indexed_attestation(attestation)?;
    ensure!(
        state.is_valid_indexed_attestation_structure(&indexed_attestation),
        "Attestation has no attesters"
    );
    add_indexed_attestation_signature(state, &indexed_attestation, signature_set)?;

    let inclusion_delay = state.slot() - data.slot;
    let is_current = data.target.epoch == current_epoch;

    if !state.fork_name().altair_enabled() {
        let pending_attestation = PendingAttestation {
            aggregation_bits: attestation.aggregation_bits.clone(),
            data: data.clone(),
            inclusion_delay,
            proposer_index: state.get_beacon_proposer_index()?,
        };
        if is_current {
            ensure!(
                data.source == state.current_justified_checkpoint(),
                "Attestation source does not match the current justified checkpoint"
            );
            state
                .current_epoch_attestations_mut()?
                .push(pending_attestation)
                .map_err(|err| anyhow!("Failed to add pending attestation: {err:?}"))?;
        } else {
            ensure!(
                data.source == state.previous_justified_checkpoint(),
                "Attestation source does not match the previous justified checkpoint"
            );
            state
                .previous_epoch_attestations_mut()?
                .push(pending_attestation)
                .map_err(|err| anyhow!("Failed to add pending attestation: {err:?}"))?;
        }
        return Ok(());
    }

    // Participation flag indices
    let participation_flag_indices =
        state.get_attestation_participation_flag_indices(data, inclusion_delay)?;

    // Update epoch participation flags
    let total_active_balance = state.get_total_active_balance();
    let base_rewards = indexed_attestation
        .attesting_indices
        .iter()
        .map(|&index| state.get_base_reward(index, total_active_balance))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let epoch_participation = if is_current {
        state.current_epoch_participation_mut()?
    } else {
        state.previous_epoch_participation_mut()?
    };

    let mut proposer_reward_numerator = 0;
    for (&index, base_reward) in indexed_attestation
        .attesting_indices
        .iter()
        .zip(base_rewards)
    {
        let flags = epoch_participation
            .get_mut(index as usize)
            .ok_or_else(|| anyhow!("Participation of validator {index} not found"))?;
        for (flag_index, weight) in PARTICIPATION_FLAG_WEIGHTS.iter().enumerate() {
            let flag_index = flag_index as u8;
            if participation_flag_indices.contains(&flag_index) && !has_flag(*flags, flag_index)
            {
                *flags = add_flag(*flags, flag_index);
                proposer_reward_numerator += base_reward * weight;
            }
        }
    }

    // Reward proposer
    let proposer_reward_denominator =
        (WEIGHT_DENOMINATOR - PROPOSER_WEIGHT) * WEIGHT_DENOMINATOR / PROPOSER_WEIGHT;
    let proposer_reward = proposer_reward_numerator / proposer_reward_denominator;
    let proposer_index = state.get_beacon_proposer_index()?;
    state.increase_balance(proposer_index, proposer_reward)
}
