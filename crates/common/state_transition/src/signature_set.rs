use alloy_primitives::B256;
use ream_bls::{
    BLSError, BLSSignature, PubKey, SignatureSetItem, traits::Verifiable, verify_signature_sets,
};

/// One signature check deferred by block processing.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureSetEntry {
    pub pubkey: PubKey,
    pub signing_root: B256,
    pub signature: BLSSignature,
    pub description: &'static str,
}

/// Signatures collected while processing a block, verified together in one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureSet {
    entries: Vec<SignatureSetEntry>,
}

impl SignatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        pubkey: PubKey,
        signing_root: B256,
        signature: BLSSignature,
        description: &'static str,
    ) {
        self.entries.push(SignatureSetEntry {
            pubkey,
            signing_root,
            signature,
            description,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SignatureSetEntry] {
        &self.entries
    }

    pub fn descriptions(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.description).collect()
    }

    /// Batch verify every entry. An empty set does not verify.
    pub fn verify(&self) -> Result<bool, BLSError> {
        verify_signature_sets(self.entries.iter().map(|entry| SignatureSetItem {
            signature: &entry.signature,
            pubkey: &entry.pubkey,
            message: entry.signing_root.as_slice(),
        }))
    }

    /// Check entries one by one and return the description of the first that fails.
    pub fn find_invalid(&self) -> Result<Option<&'static str>, BLSError> {
        for entry in &self.entries {
            if !entry
                .signature
                .verify(&entry.pubkey, entry.signing_root.as_slice())?
            {
                return Ok(Some(entry.description));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use ream_bls::{PrivateKey, traits::Signable};

    use super::*;

    fn signed_entry(seed: u8) -> (PubKey, B256, BLSSignature) {
        let private_key = PrivateKey::key_gen(&[seed; 32]).unwrap();
        let signing_root = B256::repeat_byte(seed);
        let signature = private_key.sign(signing_root.as_slice()).unwrap();
        (private_key.public_key().unwrap(), signing_root, signature)
    }

    fn set_of(seeds: &[(u8, &'static str)]) -> SignatureSet {
        let mut set = SignatureSet::new();
        for &(seed, description) in seeds {
            let (pubkey, signing_root, signature) = signed_entry(seed);
            set.add(pubkey, signing_root, signature, description);
        }
        set
    }

    #[test]
    fn test_empty_set_does_not_verify() {
        let set = SignatureSet::new();
        assert!(set.is_empty());
        assert!(!set.verify().unwrap());
        assert_eq!(set.find_invalid().unwrap(), None);
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let set = set_of(&[
            (1, "block signature"),
            (2, "randao signature"),
            (3, "attestation signature"),
        ]);

        assert_eq!(set.len(), 3);
        assert_eq!(
            set.descriptions(),
            vec!["block signature", "randao signature", "attestation signature"]
        );
        assert!(set.verify().unwrap());
    }

    #[test]
    fn test_find_invalid_names_the_bad_entry() {
        let mut set = set_of(&[(1, "block signature"), (2, "randao signature")]);
        let (pubkey, signing_root, _) = signed_entry(3);
        let (_, _, wrong_signature) = signed_entry(4);
        set.add(pubkey, signing_root, wrong_signature, "voluntary exit signature");

        assert!(!set.verify().unwrap());
        assert_eq!(
            set.find_invalid().unwrap(),
            Some("voluntary exit signature")
        );
    }
}
