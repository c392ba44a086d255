use blst::{
    BLST_ERROR, blst_scalar,
    min_pk::{PublicKey as BlstPublicKey, Signature as BlstSignature},
};
use rand::Rng;

use crate::{PubKey, constants::DST, errors::BLSError, signature::BLSSignature};

/// Number of random bits mixed into each signature of a batch.
const RAND_BITS: usize = 64;

/// A single `(signature, pubkey, message)` triple of a batch.
#[derive(Debug, Clone, Copy)]
pub struct SignatureSetItem<'a> {
    pub signature: &'a BLSSignature,
    pub pubkey: &'a PubKey,
    pub message: &'a [u8],
}

/// Verify every item with one multi-pairing, each signature weighted by a random non-zero
/// 64-bit scalar.
///
/// Returns `Ok(false)` if any signature is invalid or the batch is empty, and `Err` when an item
/// carries a malformed pubkey or signature encoding.
pub fn verify_signature_sets<'a>(
    items: impl IntoIterator<Item = SignatureSetItem<'a>>,
) -> Result<bool, BLSError> {
    let mut rng = rand::rng();
    let mut signatures: Vec<BlstSignature> = vec![];
    let mut pubkeys: Vec<BlstPublicKey> = vec![];
    let mut messages: Vec<&[u8]> = vec![];
    let mut scalars: Vec<blst_scalar> = vec![];

    for item in items {
        signatures.push(item.signature.to_blst_signature()?);
        pubkeys.push(item.pubkey.to_blst_pubkey()?);
        messages.push(item.message);
        scalars.push(random_scalar(&mut rng));
    }

    if signatures.is_empty() {
        return Ok(false);
    }

    let result = BlstSignature::verify_multiple_aggregate_signatures(
        &messages,
        DST,
        &pubkeys.iter().collect::<Vec<_>>(),
        true,
        &signatures.iter().collect::<Vec<_>>(),
        true,
        &scalars,
        RAND_BITS,
    );

    Ok(result == BLST_ERROR::BLST_SUCCESS)
}

fn random_scalar(rng: &mut impl Rng) -> blst_scalar {
    let mut value: u64 = 0;
    while value == 0 {
        value = rng.random();
    }
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&value.to_le_bytes());
    blst_scalar { b: bytes }
}
