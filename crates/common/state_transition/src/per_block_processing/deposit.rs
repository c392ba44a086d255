use alloy_primitives::B256;
use anyhow::ensure;
use ream_bls::{BLSSignature, PubKey};
use ream_consensus_beacon::{
    beacon_state::BeaconState, deposit::Deposit, helpers::is_valid_deposit_signature,
};
use ream_consensus_misc::constants::DEPOSIT_CONTRACT_TREE_DEPTH;
use ream_merkle::is_valid_merkle_branch;
use ream_network_spec::networks::BeaconNetworkSpec;
use tracing::warn;
use tree_hash::TreeHash;

pub fn process_deposit(
    state: &mut BeaconState,
    deposit: &Deposit,
    spec: &BeaconNetworkSpec,
) -> anyhow::Result<()> {
    // Verify the Merkle branch, the extra level covers the length mix-in
    ensure!(
        is_valid_merkle_branch(
            deposit.data.tree_hash_root(),
            &deposit.proof,
            DEPOSIT_CONTRACT_TREE_DEPTH + 1,
            state.eth1_deposit_index(),
            state.eth1_data().deposit_root,
        ),
        "Invalid Merkle branch for deposit {}",
        state.eth1_deposit_index()
    );

    // Deposits must be processed in order
    *state.eth1_deposit_index_mut() += 1;

    apply_deposit(
        state,
        &deposit.data.pubkey,
        deposit.data.withdrawal_credentials,
        deposit.data.amount,
        &deposit.data.signature,
        spec,
    )
}

/// Credit ``amount`` to ``pubkey``, creating the validator when it is new.
///
/// A new validator whose proof of possession does not verify is skipped rather than failing
/// the block.
pub fn apply_deposit(
    state: &mut BeaconState,
    pubkey: &PubKey,
    withdrawal_credentials: B256,
    amount: u64,
    signature: &BLSSignature,
    spec: &BeaconNetworkSpec,
) -> anyhow::Result<()> {
    if let Some(index) = state
        .validators()
        .iter()
        .position(|validator| validator.pubkey == *pubkey)
    {
        return state.increase_balance(index as u64, amount);
    }

    // Malformed keys or signatures count as an invalid proof of possession
    let is_valid = is_valid_deposit_signature(
        pubkey,
        withdrawal_credentials,
        amount,
        signature,
        spec.genesis_fork_version,
    )
    .unwrap_or(false);
    if !is_valid {
        warn!(
            "Skipping deposit {} with an invalid signature",
            state.eth1_deposit_index().saturating_sub(1)
        );
        return Ok(());
    }

    state.add_validator_to_registry(pubkey.clone(), withdrawal_credentials, amount)
}
