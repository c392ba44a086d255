use std::collections::HashMap;

use anyhow::{anyhow, ensure};
use ream_consensus_beacon::{
    beacon_state::BeaconState, helpers::eth_aggregate_pubkeys, sync_aggregate::SyncAggregate,
};
use ream_consensus_misc::{
    constants::{
        DOMAIN_SYNC_COMMITTEE, EFFECTIVE_BALANCE_INCREMENT, PROPOSER_WEIGHT, SLOTS_PER_EPOCH,
        SYNC_COMMITTEE_SIZE, SYNC_REWARD_WEIGHT, WEIGHT_DENOMINATOR,
    },
    misc::{compute_epoch_at_slot, compute_signing_root},
};

use crate::signature_set::SignatureSet;

pub fn process_sync_aggregate(
    state: &mut BeaconState,
    sync_aggregate: &SyncAggregate,
    signature_set: &mut SignatureSet,
) -> anyhow::Result<()> {
    // Verify sync committee aggregate signature signing over the previous slot block root
    let committee_pubkeys = state.current_sync_committee()?.pubkeys.clone();
    let participant_pubkeys = committee_pubkeys
        .iter()
        .zip(sync_aggregate.sync_committee_bits.iter())
        .filter_map(|(pubkey, bit)| bit.then_some(pubkey))
        .collect::<Vec<_>>();

    if participant_pubkeys.is_empty() {
        ensure!(
            sync_aggregate.sync_committee_signature.is_infinity(),
            "Sync aggregate without participants must carry the infinity signature"
        );
    } else {
        let previous_slot = state.slot().max(1) - 1;
        let domain = state.get_domain(
            DOMAIN_SYNC_COMMITTEE,
            Some(compute_epoch_at_slot(previous_slot)),
        );
        let signing_root =
            compute_signing_root(&state.get_block_root_at_slot(previous_slot)?, domain);
        signature_set.add(
            eth_aggregate_pubkeys(&participant_pubkeys)?,
            signing_root,
            sync_aggregate.sync_committee_signature.clone(),
            "sync committee signature",
        );
    }

    // Compute participant and proposer rewards
    let total_active_increments = state.get_total_active_balance() / EFFECTIVE_BALANCE_INCREMENT;
    let total_base_rewards = state.get_base_reward_per_increment(state.get_total_active_balance())
        * total_active_increments;
    let max_participant_rewards =
        total_base_rewards * SYNC_REWARD_WEIGHT / WEIGHT_DENOMINATOR / SLOTS_PER_EPOCH;
    let participant_reward = max_participant_rewards / SYNC_COMMITTEE_SIZE;
    let proposer_reward =
        participant_reward * PROPOSER_WEIGHT / (WEIGHT_DENOMINATOR - PROPOSER_WEIGHT);

    // Apply participant and proposer rewards
    let mut pubkey_to_index = HashMap::with_capacity(state.validators().len());
    for (index, validator) in state.validators().iter().enumerate() {
        pubkey_to_index
            .entry(validator.pubkey.clone())
            .or_insert(index as u64);
    }
    let committee_indices = committee_pubkeys
        .iter()
        .map(|pubkey| {
            pubkey_to_index
                .get(pubkey)
                .copied()
                .ok_or_else(|| anyhow!("Sync committee member is not in the registry"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let proposer_index = state.get_beacon_proposer_index()?;
    for (participant_index, participation_bit) in committee_indices
        .into_iter()
        .zip(sync_aggregate.sync_committee_bits.iter())
    {
        if participation_bit {
            state.increase_balance(participant_index, participant_reward)?;
            state.increase_balance(proposer_index, proposer_reward)?;
        } else {
            state.decrease_balance(participant_index, participant_reward)?;
        }
    }

    Ok(())
}
