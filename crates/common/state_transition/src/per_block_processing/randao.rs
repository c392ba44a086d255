use alloy_primitives::B256;
use anyhow::anyhow;
use ethereum_hashing::hash_fixed;
use ream_consensus_beacon::{beacon_block::BeaconBlockBodyRef, beacon_state::BeaconState};
use ream_consensus_misc::{
    constants::{DOMAIN_RANDAO, EPOCHS_PER_HISTORICAL_VECTOR},
    misc::{compute_signing_root, xor},
};

use crate::signature_set::SignatureSet;

pub fn process_randao(
    state: &mut BeaconState,
    body: BeaconBlockBodyRef<'_>,
    signature_set: &mut SignatureSet,
) -> anyhow::Result<()> {
    let epoch = state.get_current_epoch();

    // Verify RANDAO reveal
    let proposer_index = state.get_beacon_proposer_index()?;
    let proposer = state
        .validators()
        .get(proposer_index as usize)
        .ok_or_else(|| anyhow!("Proposer {proposer_index} not found"))?;
    let signing_root = compute_signing_root(&epoch, state.get_domain(DOMAIN_RANDAO, None));
    signature_set.add(
        proposer.pubkey.clone(),
        signing_root,
        body.randao_reveal().clone(),
        "randao signature",
    );

    // Mix in RANDAO reveal
    let mix = xor(
        state.get_randao_mix(epoch),
        B256::from(hash_fixed(body.randao_reveal().to_bytes())),
    );
    state.randao_mixes_mut()[(epoch % EPOCHS_PER_HISTORICAL_VECTOR) as usize] = mix;

    Ok(())
}
