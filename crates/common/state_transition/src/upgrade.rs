use anyhow::{anyhow, bail};
use ream_consensus_beacon::{
    altair, beacon_state::BeaconState, bellatrix, capella, phase0, shared::Shared,
};
use ream_consensus_misc::{
    fork::Fork,
    fork_name::ForkName,
    misc::{add_flag, compute_epoch_at_slot},
    pending_attestation::PendingAttestation,
};
use ream_network_spec::networks::BeaconNetworkSpec;

/// Upgrade ``state`` to the fork that follows its own.
pub fn upgrade_state(state: &BeaconState, spec: &BeaconNetworkSpec) -> anyhow::Result<BeaconState> {
    Ok(match state {
        BeaconState::Phase0(pre) => upgrade_to_altair(pre, spec)?,
        BeaconState::Altair(pre) => upgrade_to_bellatrix(pre, spec).into(),
        BeaconState::Bellatrix(pre) => upgrade_to_capella(pre, spec).into(),
        BeaconState::Capella(_) => bail!("No fork is scheduled after {}", state.fork_name()),
    })
}

fn next_fork(current: &Fork, epoch: u64, fork_name: ForkName, spec: &BeaconNetworkSpec) -> Fork {
    Fork {
        previous_version: current.current_version,
        current_version: spec.fork_version(fork_name),
        epoch,
    }
}

pub fn upgrade_to_altair(
    pre: &phase0::beacon_state::BeaconState,
    spec: &BeaconNetworkSpec,
) -> anyhow::Result<BeaconState> {
    let epoch = compute_epoch_at_slot(pre.slot);
    let pre = pre.clone();
    let validator_count = pre.validators.len();

    let mut post = BeaconState::Altair(altair::beacon_state::BeaconState {
        genesis_time: pre.genesis_time,
        genesis_validators_root: pre.genesis_validators_root,
        slot: pre.slot,
        fork: next_fork(&pre.fork, epoch, ForkName::Altair, spec),
        latest_block_header: pre.latest_block_header,
        block_roots: pre.block_roots,
        state_roots: pre.state_roots,
        historical_roots: pre.historical_roots,
        eth1_data: pre.eth1_data,
        eth1_data_votes: pre.eth1_data_votes,
        eth1_deposit_index: pre.eth1_deposit_index,
        validators: pre.validators,
        balances: pre.balances,
        randao_mixes: pre.randao_mixes,
        slashings: pre.slashings,
        previous_epoch_participation: Shared::new(vec![0; validator_count].into()),
        current_epoch_participation: Shared::new(vec![0; validator_count].into()),
        justification_bits: pre.justification_bits,
        previous_justified_checkpoint: pre.previous_justified_checkpoint,
        current_justified_checkpoint: pre.current_justified_checkpoint,
        finalized_checkpoint: pre.finalized_checkpoint,
        inactivity_scores: Shared::new(vec![0; validator_count].into()),
        current_sync_committee: Shared::default(),
        next_sync_committee: Shared::default(),
    });

    // Fill in previous epoch participation from the pre state's pending attestations
    translate_participation(&mut post, &pre.previous_epoch_attestations)?;

    // Fill in sync committees
    // Note: A duplicate committee is assigned for the current and next committee at the fork
    // boundary
    let sync_committee = post.get_next_sync_committee()?;
    *post.current_sync_committee_mut()? = sync_committee.clone();
    *post.next_sync_committee_mut()? = sync_committee;

    Ok(post)
}

fn translate_participation(
    state: &mut BeaconState,
    pending_attestations: &[PendingAttestation],
) -> anyhow::Result<()> {
    let mut updates = vec![];
    for attestation in pending_attestations {
        let data = &attestation.data;
        let participation_flag_indices =
            state.get_attestation_participation_flag_indices(data, attestation.inclusion_delay)?;
        for index in state.get_attesting_indices(data, &attestation.aggregation_bits)? {
            updates.extend(
                participation_flag_indices
                    .iter()
                    .map(|&flag_index| (index, flag_index)),
            );
        }
    }

    let epoch_participation = state.previous_epoch_participation_mut()?;
    for (index, flag_index) in updates {
        let flags = epoch_participation
            .get_mut(index as usize)
            .ok_or_else(|| anyhow!("Participation of validator {index} not found"))?;
        *flags = add_flag(*flags, flag_index);
    }

    Ok(())
}

pub fn upgrade_to_bellatrix(
    pre: &altair::beacon_state::BeaconState,
    spec: &BeaconNetworkSpec,
) -> bellatrix::beacon_state::BeaconState {
    let epoch = compute_epoch_at_slot(pre.slot);
    let pre = pre.clone();

    bellatrix::beacon_state::BeaconState {
        genesis_time: pre.genesis_time,
        genesis_validators_root: pre.genesis_validators_root,
        slot: pre.slot,
        fork: next_fork(&pre.fork, epoch, ForkName::Bellatrix, spec),
        latest_block_header: pre.latest_block_header,
        block_roots: pre.block_roots,
        state_roots: pre.state_roots,
        historical_roots: pre.historical_roots,
        eth1_data: pre.eth1_data,
        eth1_data_votes: pre.eth1_data_votes,
        eth1_deposit_index: pre.eth1_deposit_index,
        validators: pre.validators,
        balances: pre.balances,
        randao_mixes: pre.randao_mixes,
        slashings: pre.slashings,
        previous_epoch_participation: pre.previous_epoch_participation,
        current_epoch_participation: pre.current_epoch_participation,
        justification_bits: pre.justification_bits,
        previous_justified_checkpoint: pre.previous_justified_checkpoint,
        current_justified_checkpoint: pre.current_justified_checkpoint,
        finalized_checkpoint: pre.finalized_checkpoint,
        inactivity_scores: pre.inactivity_scores,
        current_sync_committee: pre.current_sync_committee,
        next_sync_committee: pre.next_sync_committee,
        latest_execution_payload_header: Default::default(),
    }
}

pub fn upgrade_to_capella(
    pre: &bellatrix::beacon_state::BeaconState,
    spec: &BeaconNetworkSpec,
) -> capella::beacon_state::BeaconState {
    let epoch = compute_epoch_at_slot(pre.slot);
    let pre = pre.clone();
    let header = pre.latest_execution_payload_header;

    capella::beacon_state::BeaconState {
        genesis_time: pre.genesis_time,
        genesis_validators_root: pre.genesis_validators_root,
        slot: pre.slot,
        fork: next_fork(&pre.fork, epoch, ForkName::Capella, spec),
        latest_block_header: pre.latest_block_header,
        block_roots: pre.block_roots,
        state_roots: pre.state_roots,
        historical_roots: pre.historical_roots,
        eth1_data: pre.eth1_data,
        eth1_data_votes: pre.eth1_data_votes,
        eth1_deposit_index: pre.eth1_deposit_index,
        validators: pre.validators,
        balances: pre.balances,
        randao_mixes: pre.randao_mixes,
        slashings: pre.slashings,
        previous_epoch_participation: pre.previous_epoch_participation,
        current_epoch_participation: pre.current_epoch_participation,
        justification_bits: pre.justification_bits,
        previous_justified_checkpoint: pre.previous_justified_checkpoint,
        current_justified_checkpoint: pre.current_justified_checkpoint,
        finalized_checkpoint: pre.finalized_checkpoint,
        inactivity_scores: pre.inactivity_scores,
        current_sync_committee: pre.current_sync_committee,
        next_sync_committee: pre.next_sync_committee,
        latest_execution_payload_header:
            capella::execution_payload_header::ExecutionPayloadHeader {
                parent_hash: header.parent_hash,
                fee_recipient: header.fee_recipient,
                state_root: header.state_root,
                receipts_root: header.receipts_root,
                logs_bloom: header.logs_bloom,
                prev_randao: header.prev_randao,
                block_number: header.block_number,
                gas_limit: header.gas_limit,
                gas_used: header.gas_used,
                timestamp: header.timestamp,
                extra_data: header.extra_data,
                base_fee_per_gas: header.base_fee_per_gas,
                block_hash: header.block_hash,
                transactions_root: header.transactions_root,
                withdrawals_root: Default::default(),
            },
        next_withdrawal_index: 0,
        next_withdrawal_validator_index: 0,
        historical_summaries: Shared::default(),
    }
}
