use blst::BLST_ERROR;
use thiserror::Error;

#[derive(Error, PartialEq, Debug, Clone)]
pub enum BLSError {
    #[error("blst error: {0:?}")]
    BlstError(BLST_ERROR),
    #[error("invalid byte length")]
    InvalidByteLength,
    #[error("invalid hex string")]
    InvalidHexString,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("cannot aggregate an empty set")]
    EmptyAggregation,
}

impl From<BLST_ERROR> for BLSError {
    fn from(err: BLST_ERROR) -> Self {
        BLSError::BlstError(err)
    }
}
