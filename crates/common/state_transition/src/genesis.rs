//! Deterministic genesis states for local networks and tests.
//!
//! Keys follow the interop convention: the i-th secret key is derived from
//! ``sha256(i as 32-byte little endian)``.

use alloy_primitives::B256;
use anyhow::anyhow;
use ethereum_hashing::hash_fixed;
use ream_bls::{PrivateKey, traits::Signable};
use ream_consensus_beacon::{
    altair, beacon_state::BeaconState, bellatrix, capella, helpers::get_validator_from_deposit,
    phase0, shared::Shared,
};
use ream_consensus_misc::{
    beacon_block_header::BeaconBlockHeader,
    checkpoint::Checkpoint,
    constants::{
        BLS_WITHDRAWAL_PREFIX, DEPOSIT_CONTRACT_TREE_DEPTH, DOMAIN_DEPOSIT,
        EPOCHS_PER_HISTORICAL_VECTOR, GENESIS_EPOCH, GENESIS_SLOT, MAX_EFFECTIVE_BALANCE,
    },
    deposit_data::DepositData,
    deposit_message::DepositMessage,
    eth_1_data::Eth1Data,
    fork::Fork,
    fork_name::ForkName,
    misc::{compute_domain, compute_signing_root},
};
use ream_merkle::{merkle_branch, merkleize, mix_in_length};
use ream_network_spec::networks::BeaconNetworkSpec;
use ssz_types::{BitVector, FixedVector, typenum::U33};
use tracing::info;
use tree_hash::TreeHash;

use crate::upgrade::upgrade_state;

/// Block hash recorded in the genesis ``eth1_data`` and used to seed the RANDAO mixes.
pub const INTEROP_ETH1_BLOCK_HASH: B256 = B256::repeat_byte(0x42);

pub fn interop_secret_keys(count: usize) -> anyhow::Result<Vec<PrivateKey>> {
    (0..count)
        .map(|index| {
            let mut ikm = [0u8; 32];
            ikm[..8].copy_from_slice(&(index as u64).to_le_bytes());
            PrivateKey::key_gen(&hash_fixed(&ikm))
                .map_err(|err| anyhow!("Failed to derive interop key {index}: {err:?}"))
        })
        .collect()
}

/// BLS withdrawal credentials committing to ``key``'s public key.
pub fn bls_withdrawal_credentials(key: &PrivateKey) -> anyhow::Result<B256> {
    let pubkey = key
        .public_key()
        .map_err(|err| anyhow!("Invalid secret key: {err:?}"))?;
    let mut withdrawal_credentials = B256::from(hash_fixed(pubkey.to_bytes()));
    withdrawal_credentials[0] = BLS_WITHDRAWAL_PREFIX;
    Ok(withdrawal_credentials)
}

/// Deposit data for ``key`` carrying a valid proof of possession.
pub fn deposit_data_for_key(
    key: &PrivateKey,
    withdrawal_credentials: B256,
    amount: u64,
    spec: &BeaconNetworkSpec,
) -> anyhow::Result<DepositData> {
    let pubkey = key
        .public_key()
        .map_err(|err| anyhow!("Invalid secret key: {err:?}"))?;
    let deposit_message = DepositMessage {
        pubkey: pubkey.clone(),
        withdrawal_credentials,
        amount,
    };
    let domain = compute_domain(DOMAIN_DEPOSIT, spec.genesis_fork_version, B256::ZERO);
    let signature = key
        .sign(compute_signing_root(&deposit_message, domain).as_slice())
        .map_err(|err| anyhow!("Failed to sign deposit: {err:?}"))?;

    Ok(DepositData {
        pubkey,
        withdrawal_credentials,
        amount,
        signature,
    })
}

/// Root of the deposit contract tree holding ``leaves``, length mixed in.
pub fn deposit_root(leaves: &[B256]) -> anyhow::Result<B256> {
    let root = merkleize(leaves, Some(1 << DEPOSIT_CONTRACT_TREE_DEPTH))?;
    Ok(mix_in_length(root, leaves.len()))
}

/// Proofs for every leaf against [`deposit_root`] of ``leaves``.
pub fn deposit_proofs(leaves: &[B256]) -> anyhow::Result<Vec<FixedVector<B256, U33>>> {
    let mut length_chunk = B256::ZERO;
    length_chunk[..8].copy_from_slice(&(leaves.len() as u64).to_le_bytes());

    (0..leaves.len())
        .map(|index| {
            let mut branch = merkle_branch(leaves, index, DEPOSIT_CONTRACT_TREE_DEPTH as usize)?;
            branch.push(length_chunk);
            FixedVector::new(branch).map_err(|err| anyhow!("Invalid deposit proof: {err:?}"))
        })
        .collect()
}

/// Build a genesis state of ``fork`` where every key owns an active validator.
pub fn interop_genesis_state(
    spec: &BeaconNetworkSpec,
    fork: ForkName,
    keys: &[PrivateKey],
    genesis_time: u64,
) -> anyhow::Result<BeaconState> {
    let deposits = keys
        .iter()
        .map(|key| {
            deposit_data_for_key(
                key,
                bls_withdrawal_credentials(key)?,
                MAX_EFFECTIVE_BALANCE,
                spec,
            )
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let leaves = deposits
        .iter()
        .map(|deposit| deposit.tree_hash_root())
        .collect::<Vec<_>>();

    let validators = deposits
        .into_iter()
        .map(|deposit| {
            let mut validator = get_validator_from_deposit(
                deposit.pubkey,
                deposit.withdrawal_credentials,
                deposit.amount,
            );
            if validator.effective_balance == MAX_EFFECTIVE_BALANCE {
                validator.activation_eligibility_epoch = GENESIS_EPOCH;
                validator.activation_epoch = GENESIS_EPOCH;
            }
            validator
        })
        .collect::<Vec<_>>();
    let validators = Shared::new(validators.into());
    let genesis_validators_root = validators.tree_hash_root();
    let fork_version = spec.fork_version(fork);

    let phase0_state = phase0::beacon_state::BeaconState {
        genesis_time,
        genesis_validators_root,
        slot: GENESIS_SLOT,
        fork: Fork {
            previous_version: fork_version,
            current_version: fork_version,
            epoch: GENESIS_EPOCH,
        },
        latest_block_header: BeaconBlockHeader {
            body_root: genesis_body_root(fork),
            ..Default::default()
        },
        block_roots: Shared::default(),
        state_roots: Shared::default(),
        historical_roots: Shared::default(),
        eth1_data: Eth1Data {
            deposit_root: deposit_root(&leaves)?,
            deposit_count: leaves.len() as u64,
            block_hash: INTEROP_ETH1_BLOCK_HASH,
        },
        eth1_data_votes: Shared::default(),
        eth1_deposit_index: leaves.len() as u64,
        validators,
        balances: Shared::new(vec![MAX_EFFECTIVE_BALANCE; leaves.len()].into()),
        randao_mixes: Shared::new(
            vec![INTEROP_ETH1_BLOCK_HASH; EPOCHS_PER_HISTORICAL_VECTOR as usize].into(),
        ),
        slashings: Shared::default(),
        previous_epoch_attestations: Shared::default(),
        current_epoch_attestations: Shared::default(),
        justification_bits: BitVector::new(),
        previous_justified_checkpoint: Checkpoint::default(),
        current_justified_checkpoint: Checkpoint::default(),
        finalized_checkpoint: Checkpoint::default(),
    };

    let mut state = BeaconState::Phase0(phase0_state);
    while state.fork_name() < fork {
        state = upgrade_state(&state, spec)?;
    }
    // Genesis in a later fork starts with both versions set to that fork
    *state.fork_mut() = Fork {
        previous_version: fork_version,
        current_version: fork_version,
        epoch: GENESIS_EPOCH,
    };

    info!(
        "Built {fork} genesis state with {} validators, root {genesis_validators_root}",
        keys.len()
    );
    Ok(state)
}

fn genesis_body_root(fork: ForkName) -> B256 {
    match fork {
        ForkName::Phase0 => {
            phase0::beacon_block_body::BeaconBlockBody::default().tree_hash_root()
        }
        ForkName::Altair => {
            altair::beacon_block_body::BeaconBlockBody::default().tree_hash_root()
        }
        ForkName::Bellatrix => {
            bellatrix::beacon_block_body::BeaconBlockBody::default().tree_hash_root()
        }
        ForkName::Capella => {
            capella::beacon_block_body::BeaconBlockBody::default().tree_hash_root()
        }
    }
}
