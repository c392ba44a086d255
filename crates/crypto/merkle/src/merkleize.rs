//! https://github.com/ethereum/consensus-specs/blob/dev/ssz/simple-serialize.md#merkleization

use alloy_primitives::B256;
use anyhow::ensure;

use crate::{
    hash::hash_concat,
    zero_hashes::{MAX_TREE_DEPTH, ZERO_HASHES},
};

pub const BYTES_PER_CHUNK: usize = 32;

/// Depth of the smallest tree with at least `leaf_count` leaves.
pub fn tree_depth(leaf_count: usize) -> usize {
    leaf_count.next_power_of_two().trailing_zeros() as usize
}

/// Pack serialized basic values into 32-byte chunks, right-padding the last chunk with zeros.
pub fn pack(bytes: &[u8]) -> Vec<B256> {
    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|chunk| {
            let mut padded = [0u8; BYTES_PER_CHUNK];
            padded[..chunk.len()].copy_from_slice(chunk);
            B256::from(padded)
        })
        .collect()
}

/// Merkleize `chunks` into a tree of `next_pow_of_two(limit)` leaves.
///
/// When `limit` is `None` the tree is sized to the number of chunks. Padding is never
/// materialized: a missing right sibling at level `i` is `ZERO_HASHES[i]`.
pub fn merkleize(chunks: &[B256], limit: Option<usize>) -> anyhow::Result<B256> {
    let limit = limit.unwrap_or(chunks.len());
    ensure!(
        chunks.len() <= limit,
        "Number of chunks ({}) exceeds the limit ({limit})",
        chunks.len()
    );
    let depth = tree_depth(limit);
    ensure!(
        depth <= MAX_TREE_DEPTH,
        "Tree depth {depth} exceeds the maximum of {MAX_TREE_DEPTH}"
    );

    let mut layer = chunks.to_vec();
    for level in 0..depth {
        if layer.is_empty() {
            return Ok(ZERO_HASHES[depth]);
        }
        layer = hash_layer(layer, level);
    }

    Ok(layer.first().copied().unwrap_or(ZERO_HASHES[depth]))
}

/// Merkleize the roots of a container's fields, in declaration order.
pub fn merkleize_container(field_roots: &[B256]) -> B256 {
    let depth = tree_depth(field_roots.len());
    let mut layer = field_roots.to_vec();
    for level in 0..depth {
        layer = hash_layer(layer, level);
    }
    layer.first().copied().unwrap_or(B256::ZERO)
}

pub fn mix_in_length(root: B256, length: usize) -> B256 {
    let mut length_chunk = [0u8; BYTES_PER_CHUNK];
    length_chunk[..8].copy_from_slice(&(length as u64).to_le_bytes());
    hash_concat(root.as_slice(), &length_chunk)
}

/// Build the branch for `leaves[index]` in a sparse tree of the given `depth`.
///
/// Leaves past the end of `leaves` are treated as zero chunks.
pub fn merkle_branch(leaves: &[B256], index: usize, depth: usize) -> anyhow::Result<Vec<B256>> {
    ensure!(
        depth <= MAX_TREE_DEPTH,
        "Tree depth {depth} exceeds the maximum of {MAX_TREE_DEPTH}"
    );
    if depth < usize::BITS as usize {
        ensure!(
            leaves.len() <= 1 << depth && index < 1 << depth,
            "Index {index} or leaf count {} does not fit a tree of depth {depth}",
            leaves.len()
        );
    }

    let mut branch = Vec::with_capacity(depth);
    let mut layer = leaves.to_vec();
    let mut position = index;
    for level in 0..depth {
        branch.push(
            layer
                .get(position ^ 1)
                .copied()
                .unwrap_or(ZERO_HASHES[level]),
        );
        layer = hash_layer(layer, level);
        position /= 2;
    }

    Ok(branch)
}

fn hash_layer(mut layer: Vec<B256>, level: usize) -> Vec<B256> {
    if layer.len() % 2 == 1 {
        layer.push(ZERO_HASHES[level]);
    }
    layer
        .chunks_exact(2)
        .map(|pair| hash_concat(pair[0].as_slice(), pair[1].as_slice()))
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{is_valid_merkle_branch, tests::merkle_tree};

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(2, 1)]
    #[case(3, 2)]
    #[case(4, 2)]
    #[case(5, 3)]
    #[case(8192, 13)]
    fn test_tree_depth(#[case] leaf_count: usize, #[case] depth: usize) {
        assert_eq!(tree_depth(leaf_count), depth);
    }

    #[test]
    fn test_pack_pads_last_chunk() {
        let chunks = pack(&[1u8; 33]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], B256::from([1u8; 32]));
        let mut expected = [0u8; 32];
        expected[0] = 1;
        assert_eq!(chunks[1], B256::from(expected));
    }

    #[test]
    fn test_merkleize_matches_full_tree() {
        let leaves: Vec<B256> = (1..=5u8).map(|byte| B256::from([byte; 32])).collect();
        let tree = merkle_tree(&leaves, 3).unwrap();

        assert_eq!(merkleize(&leaves, Some(8)).unwrap(), tree[1]);
        assert_eq!(merkleize(&leaves, None).unwrap(), tree[1]);
    }

    #[test]
    fn test_merkleize_empty_uses_zero_hash() {
        assert_eq!(merkleize(&[], Some(1 << 40)).unwrap(), ZERO_HASHES[40]);
        assert_eq!(merkleize(&[], None).unwrap(), B256::ZERO);
    }

    #[test]
    fn test_merkleize_rejects_overflow() {
        let leaves = vec![B256::ZERO; 3];
        assert!(merkleize(&leaves, Some(2)).is_err());
    }

    #[test]
    fn test_merkle_branch_is_valid() {
        let leaves: Vec<B256> = (1..=3u8).map(|byte| B256::from([byte; 32])).collect();
        let depth = 32;
        let root = merkleize(&leaves, Some(1 << depth)).unwrap();

        for (index, leaf) in leaves.iter().enumerate() {
            let branch = merkle_branch(&leaves, index, depth).unwrap();
            assert_eq!(branch.len(), depth);
            assert!(is_valid_merkle_branch(
                *leaf,
                &branch,
                depth as u64,
                index as u64,
                root
            ));
        }
    }

    #[test]
    fn test_mix_in_length_branch() {
        let leaves = vec![B256::from([7u8; 32])];
        let depth = 4;
        let root = mix_in_length(merkleize(&leaves, Some(1 << depth)).unwrap(), leaves.len());

        let mut branch = merkle_branch(&leaves, 0, depth).unwrap();
        let mut length_chunk = [0u8; 32];
        length_chunk[0] = 1;
        branch.push(B256::from(length_chunk));

        assert!(is_valid_merkle_branch(
            leaves[0],
            &branch,
            depth as u64 + 1,
            0,
            root
        ));
    }
}
