use alloy_primitives::B256;
use ream_consensus_beacon::{
    beacon_block::SignedBeaconBlock, beacon_state::BeaconState,
    execution_engine::mock_engine::MockExecutionEngine,
};
use ream_state_transition::{
    execute_state_transition, execute_state_transition_no_verify_any_sig,
};
use ssz::Encode;
use tracing::{info, warn};

use crate::{
    cli::transition::TransitionConfig,
    ssz_file::{read_ssz_file, write_ssz_file},
};

/// Apply the configured block to the configured pre-state, write the post-state and return its
/// root.
pub fn run_transition(config: &TransitionConfig) -> anyhow::Result<B256> {
    let pre_state_bytes = read_ssz_file(&config.pre_state)?;
    let block_bytes = read_ssz_file(&config.block)?;

    let pre_state = match config.fork {
        Some(fork) => BeaconState::from_ssz_bytes(&pre_state_bytes, fork)?,
        None => BeaconState::from_ssz_bytes_with_spec(&pre_state_bytes, &config.network)?,
    };
    let signed_block = match config.fork {
        Some(fork) => SignedBeaconBlock::from_ssz_bytes_for_fork(&block_bytes, fork)?,
        None => SignedBeaconBlock::from_ssz_bytes_with_spec(&block_bytes, &config.network)?,
    };
    info!(
        "Loaded {} pre-state at slot {} and {} block at slot {}",
        pre_state.fork_name(),
        pre_state.slot(),
        signed_block.fork_name(),
        signed_block.slot()
    );

    let execution_engine = match &config.execution_status {
        Some(path) => MockExecutionEngine::from_file(path)?,
        None => MockExecutionEngine::default(),
    };

    let post_state = if config.no_signature_verification {
        let (signature_set, post_state) = execute_state_transition_no_verify_any_sig(
            pre_state,
            &signed_block,
            &config.network,
            &execution_engine,
        )?;
        warn!("Skipped verification of {} signatures", signature_set.len());
        post_state
    } else {
        execute_state_transition(pre_state, &signed_block, &config.network, &execution_engine)?
    };

    write_ssz_file(&config.post_state, &post_state.as_ssz_bytes())?;
    let root = post_state.hash_tree_root();
    info!(
        "Wrote post-state {root} at slot {} to {}",
        post_state.slot(),
        config.post_state.display()
    );
    Ok(root)
}
