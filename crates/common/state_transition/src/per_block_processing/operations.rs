use std::cmp::min;

use anyhow::ensure;
use ream_consensus_beacon::{beacon_block::BeaconBlockBodyRef, beacon_state::BeaconState};
use ream_consensus_misc::constants::MAX_DEPOSITS;
use ream_network_spec::networks::BeaconNetworkSpec;

use super::{
    attestation::process_attestation, attester_slashing::process_attester_slashing,
    bls_to_execution_change::process_bls_to_execution_change, deposit::process_deposit,
    proposer_slashing::process_proposer_slashing, voluntary_exit::process_voluntary_exit,
};
use crate::{
    errors::{BlockStage, StageContext, StateTransitionError},
    signature_set::SignatureSet,
};

fn check_deposit_count(state: &BeaconState, body: BeaconBlockBodyRef<'_>) -> anyhow::Result<()> {
    // Verify that outstanding deposits are processed up to the maximum number of deposits
    let expected = min(
        MAX_DEPOSITS,
        state
            .eth1_data()
            .deposit_count
            .saturating_sub(state.eth1_deposit_index()),
    );
    ensure!(
        body.deposits().len() as u64 == expected,
        "Block carries {} deposits, expected {expected}",
        body.deposits().len()
    );
    Ok(())
}

pub fn process_operations(
    state: &mut BeaconState,
    body: BeaconBlockBodyRef<'_>,
    spec: &BeaconNetworkSpec,
    signature_set: &mut SignatureSet,
) -> Result<(), StateTransitionError> {
    check_deposit_count(state, body).at_stage(BlockStage::Operations)?;

    for (index, operation) in body.proposer_slashings().iter().enumerate() {
        process_proposer_slashing(state, operation, spec, signature_set)
            .at_index(BlockStage::ProposerSlashing, index)?;
    }
    for (index, operation) in body.attester_slashings().iter().enumerate() {
        process_attester_slashing(state, operation, spec, signature_set)
            .at_index(BlockStage::AttesterSlashing, index)?;
    }
    for (index, operation) in body.attestations().iter().enumerate() {
        process_attestation(state, operation, signature_set)
            .at_index(BlockStage::Attestation, index)?;
    }
    for (index, operation) in body.deposits().iter().enumerate() {
        process_deposit(state, operation, spec).at_index(BlockStage::Deposit, index)?;
    }
    for (index, operation) in body.voluntary_exits().iter().enumerate() {
        process_voluntary_exit(state, operation, spec, signature_set)
            .at_index(BlockStage::VoluntaryExit, index)?;
    }
    for (index, operation) in body.bls_to_execution_changes().iter().enumerate() {
        process_bls_to_execution_change(state, operation, spec, signature_set)
            .at_index(BlockStage::BlsToExecutionChange, index)?;
    }

    Ok(())
}
