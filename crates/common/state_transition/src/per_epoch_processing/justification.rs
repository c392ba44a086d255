use anyhow::anyhow;
use ream_consensus_beacon::beacon_state::BeaconState;
use ream_consensus_misc::{
    checkpoint::Checkpoint,
    constants::{GENESIS_EPOCH, JUSTIFICATION_BITS_LENGTH, TIMELY_TARGET_FLAG_INDEX},
    fork_name::ForkName,
};

use super::phase0::{get_attesting_balance, get_matching_target_attestations};

pub fn process_justification_and_finalization(state: &mut BeaconState) -> anyhow::Result<()> {
    // Initial FFG checkpoint values have a `0x00` stub for `root`.
    // Skip FFG updates in the first two epochs to avoid corner cases that might result in
    // modifying this stub.
    if state.get_current_epoch() <= GENESIS_EPOCH + 1 {
        return Ok(());
    }

    let previous_epoch = state.get_previous_epoch();
    let current_epoch = state.get_current_epoch();
    let (previous_target_balance, current_target_balance) = match state.fork_name() {
        ForkName::Phase0 => (
            get_attesting_balance(
                state,
                &get_matching_target_attestations(state, previous_epoch)?,
            )?,
            get_attesting_balance(
                state,
                &get_matching_target_attestations(state, current_epoch)?,
            )?,
        ),
        _ => {
            let previous_indices = state
                .get_unslashed_participating_indices(TIMELY_TARGET_FLAG_INDEX, previous_epoch)?;
            let current_indices = state
                .get_unslashed_participating_indices(TIMELY_TARGET_FLAG_INDEX, current_epoch)?;
            (
                state.get_total_balance(previous_indices),
                state.get_total_balance(current_indices),
            )
        }
    };
    let total_active_balance = state.get_total_active_balance();

    weigh_justification_and_finalization(
        state,
        total_active_balance,
        previous_target_balance,
        current_target_balance,
    )
}

pub fn weigh_justification_and_finalization(
    state: &mut BeaconState,
    total_active_balance: u64,
    previous_epoch_target_balance: u64,
    current_epoch_target_balance: u64,
) -> anyhow::Result<()> {
    let previous_epoch = state.get_previous_epoch();
    let current_epoch = state.get_current_epoch();
    let old_previous_justified_checkpoint = state.previous_justified_checkpoint();
    let old_current_justified_checkpoint = state.current_justified_checkpoint();

    // Process justifications
    *state.previous_justified_checkpoint_mut() = old_current_justified_checkpoint;
    let mut bits = [false; JUSTIFICATION_BITS_LENGTH];
    for (index, bit) in state
        .justification_bits()
        .iter()
        .take(JUSTIFICATION_BITS_LENGTH - 1)
        .enumerate()
    {
        bits[index + 1] = bit;
    }

    if previous_epoch_target_balance * 3 >= total_active_balance * 2 {
        *state.current_justified_checkpoint_mut() = Checkpoint {
            epoch: previous_epoch,
            root: state.get_block_root(previous_epoch)?,
        };
        bits[1] = true;
    }
    if current_epoch_target_balance * 3 >= total_active_balance * 2 {
        *state.current_justified_checkpoint_mut() = Checkpoint {
            epoch: current_epoch,
            root: state.get_block_root(current_epoch)?,
        };
        bits[0] = true;
    }

    for (index, bit) in bits.iter().enumerate() {
        state
            .justification_bits_mut()
            .set(index, *bit)
            .map_err(|err| anyhow!("Failed to set justification bit {index}: {err:?}"))?;
    }

    // Process finalizations
    // The 2nd/3rd/4th most recent epochs are justified, the 2nd using the 4th as source
    if bits[1..4].iter().all(|bit| *bit)
        && old_previous_justified_checkpoint.epoch + 3 == current_epoch
    {
        *state.finalized_checkpoint_mut() = old_previous_justified_checkpoint;
    }
    // The 2nd/3rd most recent epochs are justified, the 2nd using the 3rd as source
    if bits[1..3].iter().all(|bit| *bit)
        && old_previous_justified_checkpoint.epoch + 2 == current_epoch
    {
        *state.finalized_checkpoint_mut() = old_previous_justified_checkpoint;
    }
    // The 1st/2nd/3rd most recent epochs are justified, the 1st using the 3rd as source
    if bits[0..3].iter().all(|bit| *bit)
        && old_current_justified_checkpoint.epoch + 2 == current_epoch
    {
        *state.finalized_checkpoint_mut() = old_current_justified_checkpoint;
    }
    // The 1st/2nd most recent epochs are justified, the 1st using the 2nd as source
    if bits[0..2].iter().all(|bit| *bit)
        && old_current_justified_checkpoint.epoch + 1 == current_epoch
    {
        *state.finalized_checkpoint_mut() = old_current_justified_checkpoint;
    }

    Ok(())
}
