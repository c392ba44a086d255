use std::collections::HashSet;

use anyhow::ensure;
use itertools::Itertools;
use ream_consensus_beacon::{attester_slashing::AttesterSlashing, beacon_state::BeaconState};
use ream_network_spec::networks::BeaconNetworkSpec;
use tracing::debug;

use super::attestation::add_indexed_attestation_signature;
use crate::signature_set::SignatureSet;

pub fn process_attester_slashing(
    state: &mut BeaconState,
    attester_slashing: &AttesterSlashing,
    spec: &BeaconNetworkSpec,
    signature_set: &mut SignatureSet,
) -> anyhow::Result<()> {
    let attestation_1 = &attester_slashing.attestation_1;
    let attestation_2 = &attester_slashing.attestation_2;

    ensure!(
        attestation_1
            .data
            .is_slashable_attestation_data(&attestation_2.data),
        "Attestations are neither a double vote nor a surround vote"
    );
    for attestation in [attestation_1, attestation_2] {
        ensure!(
            state.is_valid_indexed_attestation_structure(attestation),
            "Invalid indexed attestation in attester slashing"
        );
        add_indexed_attestation_signature(state, attestation, signature_set)?;
    }

    let indices_2 = attestation_2
        .attesting_indices
        .iter()
        .copied()
        .collect::<HashSet<_>>();
    let current_epoch = state.get_current_epoch();
    let slashable_indices = attestation_1
        .attesting_indices
        .iter()
        .copied()
        .filter(|index| indices_2.contains(index))
        .sorted()
        .filter(|&index| {
            state
                .validators()
                .get(index as usize)
                .is_some_and(|validator| validator.is_slashable_validator(current_epoch))
        })
        .collect::<Vec<_>>();
    ensure!(
        !slashable_indices.is_empty(),
        "Attester slashing does not slash any validator"
    );

    for index in slashable_indices {
        debug!("Slashing validator {index} for a slashable attestation");
        state.slash_validator(index, None, spec)?;
    }

    Ok(())
}
