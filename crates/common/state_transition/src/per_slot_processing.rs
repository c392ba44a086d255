use alloy_primitives::B256;
use ream_consensus_beacon::beacon_state::BeaconState;
use ream_consensus_misc::{
    constants::{SLOTS_PER_EPOCH, SLOTS_PER_HISTORICAL_ROOT},
    misc::compute_epoch_at_slot,
};
use ream_network_spec::networks::BeaconNetworkSpec;
use tracing::{debug, info};
use tree_hash::TreeHash;

use crate::{
    cancellation::Cancellation, errors::StateTransitionError,
    per_epoch_processing::process_epoch, upgrade::upgrade_state,
};

/// Advance ``state`` through empty slots up to ``slot``, running epoch transitions and fork
/// upgrades on the way.
pub fn process_slots(
    state: &mut BeaconState,
    slot: u64,
    spec: &BeaconNetworkSpec,
    cancellation: Cancellation<'_>,
) -> Result<(), StateTransitionError> {
    if slot < state.slot() {
        return Err(StateTransitionError::SlotRegression {
            current: state.slot(),
            target: slot,
        });
    }

    while state.slot() < slot {
        if cancellation.is_cancelled() {
            return Err(StateTransitionError::Cancelled { slot: state.slot() });
        }

        process_slot(state);

        // Process epoch on the start slot of the next epoch
        if (state.slot() + 1) % SLOTS_PER_EPOCH == 0 {
            debug!("Processing epoch {}", state.get_current_epoch());
            process_epoch(state, spec)
                .map_err(|err| StateTransitionError::slot_processing(state.slot(), err))?;
        }

        *state.slot_mut() += 1;

        if state.slot() % SLOTS_PER_EPOCH == 0 {
            upgrade_at_epoch_start(state, spec)?;
        }
    }

    Ok(())
}

pub fn process_slot(state: &mut BeaconState) {
    let index = (state.slot() % SLOTS_PER_HISTORICAL_ROOT) as usize;

    // Cache state root
    let previous_state_root = state.hash_tree_root();
    state.state_roots_mut()[index] = previous_state_root;

    // Cache latest block header state root
    if state.latest_block_header().state_root == B256::ZERO {
        state.latest_block_header_mut().state_root = previous_state_root;
    }

    // Cache block root
    let previous_block_root = state.latest_block_header().tree_hash_root();
    state.block_roots_mut()[index] = previous_block_root;
}

fn upgrade_at_epoch_start(
    state: &mut BeaconState,
    spec: &BeaconNetworkSpec,
) -> Result<(), StateTransitionError> {
    let epoch = compute_epoch_at_slot(state.slot());
    let Some(target_fork) = spec.fork_activated_at(epoch) else {
        return Ok(());
    };

    // Forks sharing an activation epoch are applied one after another
    while state.fork_name() < target_fork {
        let upgraded = upgrade_state(state, spec)
            .map_err(|err| StateTransitionError::slot_processing(state.slot(), err))?;
        *state = upgraded;
        info!("Upgraded beacon state to {} at epoch {epoch}", state.fork_name());
    }

    Ok(())
}
