use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use ream_consensus_beacon::{beacon_block::SignedBeaconBlock, beacon_state::BeaconState};
use ream_consensus_misc::{
    beacon_block_header::BeaconBlockHeader, constants::DOMAIN_BEACON_PROPOSER,
    misc::compute_signing_root,
};
use tree_hash::TreeHash;

use crate::signature_set::SignatureSet;

pub fn process_block_header(
    state: &mut BeaconState,
    signed_block: &SignedBeaconBlock,
    signature_set: &mut SignatureSet,
) -> anyhow::Result<()> {
    let header = signed_block.signed_header().message;

    // Verify that the slots match
    ensure!(
        header.slot == state.slot(),
        "Block slot {} does not match state slot {}",
        header.slot,
        state.slot()
    );

    // Verify that the block is newer than latest block header
    ensure!(
        header.slot > state.latest_block_header().slot,
        "Block is not newer than the latest block header"
    );

    // Verify that proposer index is the correct index
    let proposer_index = state.get_beacon_proposer_index()?;
    ensure!(
        header.proposer_index == proposer_index,
        "Block proposer index {} is not the expected proposer {proposer_index}",
        header.proposer_index
    );

    // Verify that the parent matches
    ensure!(
        header.parent_root == state.latest_block_header().tree_hash_root(),
        "Block parent root does not match the latest block header"
    );

    // Cache current block as the new latest block
    *state.latest_block_header_mut() = BeaconBlockHeader {
        state_root: B256::ZERO,
        ..header
    };

    // Verify proposer is not slashed
    let proposer = state
        .validators()
        .get(proposer_index as usize)
        .ok_or_else(|| anyhow!("Proposer {proposer_index} not found"))?;
    ensure!(!proposer.slashed, "Block proposer {proposer_index} is slashed");

    let domain = state.get_domain(DOMAIN_BEACON_PROPOSER, None);
    signature_set.add(
        proposer.pubkey.clone(),
        compute_signing_root(&signed_block.block_root(), domain),
        signed_block.signature().clone(),
        "block signature",
    );

    Ok(())
}
