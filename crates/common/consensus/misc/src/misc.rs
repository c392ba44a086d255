use std::cmp::max;

use alloy_primitives::{B256, aliases::B32};
use anyhow::{anyhow, ensure};
use ethereum_hashing::hash;
use tree_hash::TreeHash;

use crate::{
    constants::{
        EPOCHS_PER_SYNC_COMMITTEE_PERIOD, MAX_SEED_LOOKAHEAD, SHUFFLE_ROUND_COUNT,
        SLOTS_PER_EPOCH,
    },
    fork_data::ForkData,
    signing_data::SigningData,
};

pub mod checksummed_address {
    use alloy_primitives::Address;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&address.to_checksum(None))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse::<Address>().map_err(D::Error::custom)
    }
}

/// Return the signing root for the corresponding signing data.
pub fn compute_signing_root<SSZObject: TreeHash>(ssz_object: &SSZObject, domain: B256) -> B256 {
    SigningData {
        object_root: ssz_object.tree_hash_root(),
        domain,
    }
    .tree_hash_root()
}

/// Return the shuffled index corresponding to ``seed`` (and ``index_count``).
pub fn compute_shuffled_index(
    mut index: usize,
    index_count: usize,
    seed: B256,
) -> anyhow::Result<usize> {
    ensure!(index < index_count, "Index must be less than index_count");
    for round in 0..SHUFFLE_ROUND_COUNT {
        let seed_with_round = [seed.as_slice(), &round.to_le_bytes()].concat();
        let pivot = bytes_to_int64(&hash(&seed_with_round)[..]) % index_count as u64;

        let flip = (pivot as usize + (index_count - index)) % index_count;
        let position = max(index, flip);
        let seed_with_position = [
            seed_with_round.as_slice(),
            &((position / 256) as u32).to_le_bytes(),
        ]
        .concat();
        let source = hash(&seed_with_position);
        let byte = source[(position % 256) / 8];
        let bit = (byte >> (position % 8)) % 2;

        index = if bit == 1 { flip } else { index };
    }
    Ok(index)
}

/// Return the integer deserialization of ``data`` interpreted as little-endian.
pub fn bytes_to_int64(slice: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    let len = slice.len().min(8);
    bytes[..len].copy_from_slice(&slice[..len]);
    u64::from_le_bytes(bytes)
}

/// Return the committee corresponding to ``indices``, ``seed``, ``index``, and committee ``count``.
pub fn compute_committee(
    indices: &[u64],
    seed: B256,
    index: u64,
    count: u64,
) -> anyhow::Result<Vec<u64>> {
    ensure!(count > 0, "Committee count must be positive");
    let start = (indices.len() as u64 * index) / count;
    let end = (indices.len() as u64 * (index + 1)) / count;
    (start..end)
        .map(|i| {
            let shuffled_index = compute_shuffled_index(i as usize, indices.len(), seed)?;
            indices
                .get(shuffled_index)
                .copied()
                .ok_or_else(|| anyhow!("Index out of bounds: {shuffled_index}"))
        })
        .collect()
}

/// Return the epoch number at ``slot``.
pub fn compute_epoch_at_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

/// Return the start slot of ``epoch``.
pub fn compute_start_slot_at_epoch(epoch: u64) -> u64 {
    epoch * SLOTS_PER_EPOCH
}

/// Return the epoch during which validator activations and exits initiated in ``epoch`` take
/// effect.
pub fn compute_activation_exit_epoch(epoch: u64) -> u64 {
    epoch + 1 + MAX_SEED_LOOKAHEAD
}

/// Return the domain for the ``domain_type`` and ``fork_version``.
pub fn compute_domain(
    domain_type: B32,
    fork_version: B32,
    genesis_validators_root: B256,
) -> B256 {
    let fork_data_root = ForkData {
        current_version: fork_version,
        genesis_validators_root,
    }
    .compute_fork_data_root();
    let mut domain = B256::ZERO;
    domain[..4].copy_from_slice(domain_type.as_slice());
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

pub fn is_sorted_and_unique(indices: &[u64]) -> bool {
    indices.windows(2).all(|window| window[0] < window[1])
}

pub fn compute_sync_committee_period(epoch: u64) -> u64 {
    epoch / EPOCHS_PER_SYNC_COMMITTEE_PERIOD
}

pub fn compute_sync_committee_period_at_slot(slot: u64) -> u64 {
    compute_sync_committee_period(compute_epoch_at_slot(slot))
}

/// Return the largest integer ``x`` such that ``x**2 <= n``.
pub fn integer_squareroot(n: u64) -> u64 {
    if n == u64::MAX {
        return crate::constants::UINT64_MAX_SQRT;
    }
    let mut x = n;
    let mut y = x.div_ceil(2);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

pub fn xor(left: B256, right: B256) -> B256 {
    left ^ right
}

pub fn add_flag(flags: u8, flag_index: u8) -> u8 {
    flags | (1 << flag_index)
}

pub fn has_flag(flags: u8, flag_index: u8) -> bool {
    let flag = 1 << flag_index;
    flags & flag == flag
}
