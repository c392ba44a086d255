use std::sync::LazyLock;

use alloy_primitives::B256;

use crate::hash::hash_concat;

/// Deepest subtree the zero hash table covers.
pub const MAX_TREE_DEPTH: usize = 64;

/// `ZERO_HASHES[i]` is the root of a subtree of depth `i` whose leaves are all zero chunks.
pub static ZERO_HASHES: LazyLock<[B256; MAX_TREE_DEPTH + 1]> = LazyLock::new(|| {
    let mut hashes = [B256::ZERO; MAX_TREE_DEPTH + 1];
    for depth in 1..=MAX_TREE_DEPTH {
        hashes[depth] = hash_concat(hashes[depth - 1].as_slice(), hashes[depth - 1].as_slice());
    }
    hashes
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_hashes_chain() {
        assert_eq!(ZERO_HASHES[0], B256::ZERO);
        assert_eq!(
            ZERO_HASHES[1],
            hash_concat(B256::ZERO.as_slice(), B256::ZERO.as_slice())
        );
        for depth in 1..=MAX_TREE_DEPTH {
            assert_eq!(
                ZERO_HASHES[depth],
                hash_concat(
                    ZERO_HASHES[depth - 1].as_slice(),
                    ZERO_HASHES[depth - 1].as_slice()
                )
            );
        }
    }
}
