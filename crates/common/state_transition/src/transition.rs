use alloy_primitives::B256;
use ream_consensus_beacon::{
    beacon_block::SignedBeaconBlock, beacon_state::BeaconState,
    execution_engine::engine_trait::ExecutionApi,
};
use ream_network_spec::networks::BeaconNetworkSpec;
use tracing::{debug, info};

use crate::{
    cancellation::Cancellation, errors::StateTransitionError,
    per_block_processing::process_block, per_slot_processing::process_slots,
    signature_set::SignatureSet,
};

/// Advance ``state`` to the block's slot and apply the block, leaving every signature
/// unchecked.
fn apply_block(
    mut state: BeaconState,
    signed_block: &SignedBeaconBlock,
    spec: &BeaconNetworkSpec,
    execution_engine: &impl ExecutionApi,
) -> Result<(SignatureSet, BeaconState), StateTransitionError> {
    process_slots(&mut state, signed_block.slot(), spec, Cancellation::never())?;
    let signature_set = process_block(&mut state, signed_block, spec, execution_engine)?;
    Ok((signature_set, state))
}

fn verify_state_root(
    state: &BeaconState,
    signed_block: &SignedBeaconBlock,
) -> Result<(), StateTransitionError> {
    let computed = state.hash_tree_root();
    if computed != signed_block.state_root() {
        return Err(StateTransitionError::StateRootMismatch {
            expected: signed_block.state_root(),
            computed,
        });
    }
    Ok(())
}

/// Batch verify ``signature_set``. On failure the entries are rechecked one by one to name the
/// offending signature.
pub fn verify_signature_set(signature_set: &SignatureSet) -> Result<(), StateTransitionError> {
    if signature_set.verify()? {
        return Ok(());
    }
    let description = signature_set
        .find_invalid()?
        .unwrap_or("block signatures");
    Err(StateTransitionError::SignatureInvalid {
        description: description.to_string(),
    })
}

/// Run the full transition: slots, block, signatures and finally the declared state root.
pub fn execute_state_transition(
    state: BeaconState,
    signed_block: &SignedBeaconBlock,
    spec: &BeaconNetworkSpec,
    execution_engine: &impl ExecutionApi,
) -> Result<BeaconState, StateTransitionError> {
    let (signature_set, state) = apply_block(state, signed_block, spec, execution_engine)?;
    debug!(
        "Verifying {} signatures for block at slot {}",
        signature_set.len(),
        signed_block.slot()
    );
    verify_signature_set(&signature_set)?;
    verify_state_root(&state, signed_block)?;

    info!(
        "Applied {} block at slot {}, state root {}",
        signed_block.fork_name(),
        signed_block.slot(),
        signed_block.state_root()
    );
    Ok(state)
}

/// Like [`execute_state_transition`] but hands the signatures back instead of checking them.
/// The state root is still validated.
pub fn execute_state_transition_no_verify_any_sig(
    state: BeaconState,
    signed_block: &SignedBeaconBlock,
    spec: &BeaconNetworkSpec,
    execution_engine: &impl ExecutionApi,
) -> Result<(SignatureSet, BeaconState), StateTransitionError> {
    let (signature_set, state) = apply_block(state, signed_block, spec, execution_engine)?;
    verify_state_root(&state, signed_block)?;
    Ok((signature_set, state))
}

/// Root of the state ``signed_block`` would produce, computed on a copy of ``state``.
///
/// Neither signatures nor the block's declared state root are checked, so a proposer can use
/// this to fill in the root.
pub fn calculate_state_root(
    state: &BeaconState,
    signed_block: &SignedBeaconBlock,
    spec: &BeaconNetworkSpec,
    execution_engine: &impl ExecutionApi,
) -> Result<B256, StateTransitionError> {
    let (_, state) = apply_block(state.clone(), signed_block, spec, execution_engine)?;
    Ok(state.hash_tree_root())
}
