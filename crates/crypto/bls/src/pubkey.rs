use std::str::FromStr;

use alloy_primitives::hex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz_derive::{Decode, Encode};
use ssz_types::{FixedVector, typenum::U48};
use tree_hash_derive::TreeHash;

use crate::{constants::PUBKEY_BYTES_LEN, errors::BLSError};

#[derive(Debug, PartialEq, Clone, Encode, Decode, TreeHash, Default, Eq, Hash)]
pub struct PubKey {
    pub inner: FixedVector<u8, U48>,
}

impl Serialize for PubKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.to_bytes())))
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_string: String = Deserialize::deserialize(deserializer)?;
        PubKey::from_str(&hex_string).map_err(serde::de::Error::custom)
    }
}

impl PubKey {
    pub fn to_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BLSError> {
        if bytes.len() != PUBKEY_BYTES_LEN {
            return Err(BLSError::InvalidByteLength);
        }
        Ok(PubKey {
            inner: FixedVector::new(bytes.to_vec()).map_err(|_| BLSError::InvalidByteLength)?,
        })
    }
}

impl FromStr for PubKey {
    type Err = BLSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clean_str = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(clean_str).map_err(|_| BLSError::InvalidHexString)?;
        PubKey::from_bytes(&bytes)
    }
}
