use crate::{AggregatePubKey, PubKey, errors::BLSError, traits::Aggregatable};

impl AggregatePubKey {
    pub fn aggregate(pubkeys: &[&PubKey]) -> Result<Self, BLSError> {
        Ok(Self {
            inner: PubKey::aggregate(pubkeys)?,
        })
    }
}
