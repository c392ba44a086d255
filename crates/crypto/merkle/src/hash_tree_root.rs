use alloy_primitives::B256;
use ssz_types::{FixedVector, VariableList, typenum::Unsigned};
use tree_hash::{TreeHash, TreeHashType};

use crate::merkleize::{merkleize, mix_in_length, pack};

/// Hash tree root of an SSZ collection computed by the local merkleization engine.
pub trait HashTreeRoot {
    fn hash_tree_root(&self) -> anyhow::Result<B256>;
}

impl<T: TreeHash, N: Unsigned> HashTreeRoot for VariableList<T, N> {
    fn hash_tree_root(&self) -> anyhow::Result<B256> {
        let root = merkleize(&chunks(self.iter()), Some(chunk_limit::<T>(N::to_usize())))?;
        Ok(mix_in_length(root, self.len()))
    }
}

impl<T: TreeHash, N: Unsigned> HashTreeRoot for FixedVector<T, N> {
    fn hash_tree_root(&self) -> anyhow::Result<B256> {
        merkleize(&chunks(self.iter()), Some(chunk_limit::<T>(N::to_usize())))
    }
}

/// Basic values are packed several to a chunk, composite values contribute their own root.
fn chunks<'a, T: TreeHash + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<B256> {
    match T::tree_hash_type() {
        TreeHashType::Basic => {
            let mut bytes = vec![];
            for item in items {
                bytes.extend_from_slice(&item.tree_hash_packed_encoding());
            }
            pack(&bytes)
        }
        _ => items.map(|item| item.tree_hash_root()).collect(),
    }
}

fn chunk_limit<T: TreeHash>(length: usize) -> usize {
    match T::tree_hash_type() {
        TreeHashType::Basic => length.div_ceil(T::tree_hash_packing_factor()),
        _ => length,
    }
}

#[cfg(test)]
mod tests {
    use ssz_types::typenum::{U4, U8, U1024, U1099511627776};
    use tree_hash_derive::TreeHash;

    use super::*;

    #[derive(TreeHash)]
    struct Pair {
        epoch: u64,
        root: B256,
    }

    #[test]
    fn test_basic_list_matches_tree_hash() {
        let list = VariableList::<u64, U1024>::new((0..100).collect()).unwrap();
        assert_eq!(list.hash_tree_root().unwrap(), list.tree_hash_root());
    }

    #[test]
    fn test_empty_list_matches_tree_hash() {
        let list = VariableList::<u64, U1099511627776>::empty();
        assert_eq!(list.hash_tree_root().unwrap(), list.tree_hash_root());
    }

    #[test]
    fn test_byte_vector_matches_tree_hash() {
        let vector = FixedVector::<u8, U8>::new(vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(vector.hash_tree_root().unwrap(), vector.tree_hash_root());
    }

    #[test]
    fn test_root_vector_matches_tree_hash() {
        let vector = FixedVector::<B256, U4>::new(vec![
            B256::repeat_byte(1),
            B256::repeat_byte(2),
            B256::ZERO,
            B256::repeat_byte(4),
        ])
        .unwrap();
        assert_eq!(vector.hash_tree_root().unwrap(), vector.tree_hash_root());
    }

    #[test]
    fn test_container_list_matches_tree_hash() {
        let list = VariableList::<Pair, U1024>::new(
            (0..7)
                .map(|epoch| Pair {
                    epoch,
                    root: B256::repeat_byte(epoch as u8),
                })
                .collect(),
        )
        .unwrap();
        assert_eq!(list.hash_tree_root().unwrap(), list.tree_hash_root());
    }
}
