/// ``GeneralizedIndex`` is the index of a node in the ``tree``.
pub(crate) type GeneralizedIndex = u64;

/// Return the given bit of a generalized index.
/// Note: It is fine to pass ``LeafIndex`` to this function,
/// as the result will be the same.
pub(crate) fn get_generalized_index_bit(index: GeneralizedIndex, position: u64) -> bool {
    (index & (1 << position)) > 0
}

#[cfg(test)]
pub(crate) fn generalized_index_child(
    index: GeneralizedIndex,
    right_side: bool,
) -> GeneralizedIndex {
    index * 2 + right_side as GeneralizedIndex
}
