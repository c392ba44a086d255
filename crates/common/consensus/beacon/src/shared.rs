use std::{
    fmt,
    ops::Deref,
    sync::{Arc, OnceLock},
};

use alloy_primitives::B256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{Decode, DecodeError, Encode};
use tree_hash::{PackedEncoding, TreeHash, TreeHashType};

/// Copy-on-write handle for a large beacon state field.
///
/// Clones share one buffer. The hash tree root is computed on first use and cached until the
/// next [`Shared::make_mut`], so an unset cache marks the field as dirty.
pub struct Shared<T> {
    inner: Arc<T>,
    root: OnceLock<B256>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            root: OnceLock::new(),
        }
    }

    /// True until the root of the current value has been computed.
    pub fn is_dirty(&self) -> bool {
        self.root.get().is_none()
    }

    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }
}

impl<T: Clone> Shared<T> {
    /// Mutable access to the value. Detaches from other clones first if the buffer is shared.
    pub fn make_mut(&mut self) -> &mut T {
        self.root.take();
        Arc::make_mut(&mut self.inner)
    }

    pub fn into_inner(self) -> T {
        Arc::unwrap_or_clone(self.inner)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            root: self.root.clone(),
        }
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> From<T> for Shared<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T: PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        Shared::ptr_eq(self, other) || self.inner == other.inner
    }
}

impl<T: Eq> Eq for Shared<T> {}

impl<T: TreeHash> TreeHash for Shared<T> {
    fn tree_hash_type() -> TreeHashType {
        T::tree_hash_type()
    }

    fn tree_hash_packed_encoding(&self) -> PackedEncoding {
        self.inner.tree_hash_packed_encoding()
    }

    fn tree_hash_packing_factor() -> usize {
        T::tree_hash_packing_factor()
    }

    fn tree_hash_root(&self) -> B256 {
        *self.root.get_or_init(|| self.inner.tree_hash_root())
    }
}

impl<T: Encode> Encode for Shared<T> {
    fn is_ssz_fixed_len() -> bool {
        T::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        T::ssz_fixed_len()
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        self.inner.ssz_append(buf)
    }

    fn ssz_bytes_len(&self) -> usize {
        self.inner.ssz_bytes_len()
    }
}

impl<T: Decode> Decode for Shared<T> {
    fn is_ssz_fixed_len() -> bool {
        T::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        T::ssz_fixed_len()
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        T::from_ssz_bytes(bytes).map(Self::new)
    }
}

impl<T: Serialize> Serialize for Shared<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.inner.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Shared<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self::new)
    }
}

/// Names of the `Shared` fields of a state whose cached root is unset.
macro_rules! collect_dirty {
    ($state:expr; $($field:ident),+ $(,)?) => {
        [$((stringify!($field), $state.$field.is_dirty())),+]
            .into_iter()
            .filter_map(|(name, dirty)| dirty.then_some(name))
            .collect()
    };
}

/// Roots of the given fields of a container, in the order listed.
macro_rules! field_roots {
    ($state:expr; $($field:ident),+ $(,)?) => {
        vec![$(tree_hash::TreeHash::tree_hash_root(&$state.$field)),+]
    };
}

pub(crate) use collect_dirty;
pub(crate) use field_roots;

pub mod quoted_u64_var_list {
    use serde::{Deserializer, Serializer};
    use ssz_types::{VariableList, serde_utils::quoted_u64_var_list, typenum::Unsigned};

    use super::Shared;

    pub fn serialize<S, N>(
        value: &Shared<VariableList<u64, N>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        N: Unsigned,
    {
        quoted_u64_var_list::serialize(&**value, serializer)
    }

    pub fn deserialize<'de, D, N>(deserializer: D) -> Result<Shared<VariableList<u64, N>>, D::Error>
    where
        D: Deserializer<'de>,
        N: Unsigned,
    {
        quoted_u64_var_list::deserialize(deserializer).map(Shared::new)
    }
}

pub mod quoted_u64_fixed_vec {
    use serde::{Deserializer, Serializer};
    use ssz_types::{FixedVector, serde_utils::quoted_u64_fixed_vec, typenum::Unsigned};

    use super::Shared;

    pub fn serialize<S, N>(
        value: &Shared<FixedVector<u64, N>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        N: Unsigned,
    {
        quoted_u64_fixed_vec::serialize(&**value, serializer)
    }

    pub fn deserialize<'de, D, N>(deserializer: D) -> Result<Shared<FixedVector<u64, N>>, D::Error>
    where
        D: Deserializer<'de>,
        N: Unsigned,
    {
        quoted_u64_fixed_vec::deserialize(deserializer).map(Shared::new)
    }
}

/// Participation flags serialized as a list of quoted integers.
pub mod quoted_u8_var_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use ssz_types::{VariableList, typenum::Unsigned};

    use super::Shared;

    pub fn serialize<S, N>(
        value: &Shared<VariableList<u8, N>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        N: Unsigned,
    {
        let string_vec: Vec<String> = value.iter().map(|flags| flags.to_string()).collect();
        string_vec.serialize(serializer)
    }

    pub fn deserialize<'de, D, N>(deserializer: D) -> Result<Shared<VariableList<u8, N>>, D::Error>
    where
        D: Deserializer<'de>,
        N: Unsigned,
    {
        let string_vec: Vec<String> = Vec::deserialize(deserializer)?;
        let flags = string_vec
            .into_iter()
            .map(|s| s.parse::<u8>().map_err(serde::de::Error::custom))
            .collect::<Result<Vec<_>, _>>()?;
        VariableList::new(flags).map(Shared::new).map_err(|err| {
            serde::de::Error::custom(format!("Cannot create VariableList from flags: {err:?}"))
        })
    }
}
