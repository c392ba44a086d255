use alloy_primitives::B256;
use blst::min_pk::SecretKey as BlstSecretKey;

use crate::{
    PrivateKey, PubKey,
    constants::DST,
    errors::BLSError,
    signature::BLSSignature,
    traits::Signable,
};

impl PrivateKey {
    /// Derive a key from input keying material (at least 32 bytes) per the IETF KeyGen.
    pub fn key_gen(ikm: &[u8]) -> Result<Self, BLSError> {
        let secret_key = BlstSecretKey::key_gen(ikm, &[])?;
        Ok(Self {
            inner: B256::from(secret_key.to_bytes()),
        })
    }

    pub fn public_key(&self) -> Result<PubKey, BLSError> {
        PubKey::try_from(self.to_blst_secret_key()?.sk_to_pk())
    }

    fn to_blst_secret_key(&self) -> Result<BlstSecretKey, BLSError> {
        BlstSecretKey::from_bytes(self.inner.as_slice()).map_err(|_| BLSError::InvalidPrivateKey)
    }
}

impl Signable for PrivateKey {
    type Error = BLSError;

    fn sign(&self, message: &[u8]) -> Result<BLSSignature, Self::Error> {
        let signature = self.to_blst_secret_key()?.sign(message, DST, &[]);
        BLSSignature::try_from(signature)
    }
}
