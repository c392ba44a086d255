use blst::min_pk::{AggregatePublicKey as BlstAggregatePublicKey, PublicKey as BlstPublicKey};
use ssz_types::FixedVector;

use crate::{errors::BLSError, pubkey::PubKey, traits::Aggregatable};

impl TryFrom<BlstPublicKey> for PubKey {
    type Error = BLSError;

    fn try_from(value: BlstPublicKey) -> Result<Self, Self::Error> {
        Ok(PubKey {
            inner: FixedVector::new(value.to_bytes().to_vec())
                .map_err(|_| BLSError::InvalidPublicKey)?,
        })
    }
}

impl PubKey {
    pub fn to_blst_pubkey(&self) -> Result<BlstPublicKey, BLSError> {
        BlstPublicKey::from_bytes(&self.inner).map_err(BLSError::from)
    }
}

impl Aggregatable<PubKey> for PubKey {
    type Error = BLSError;

    fn aggregate(pubkeys: &[&PubKey]) -> Result<PubKey, BLSError> {
        if pubkeys.is_empty() {
            return Err(BLSError::EmptyAggregation);
        }
        let pubkeys = pubkeys
            .iter()
            .map(|pubkey| pubkey.to_blst_pubkey())
            .collect::<Result<Vec<_>, _>>()?;
        let aggregate_pubkey =
            BlstAggregatePublicKey::aggregate(&pubkeys.iter().collect::<Vec<_>>(), true)?;
        PubKey::try_from(aggregate_pubkey.to_public_key())
    }
}
