pub mod aggregate_pubkey;
pub mod constants;
pub mod errors;
pub mod private_key;
pub mod pubkey;
pub mod signature;
pub mod supranational;
pub mod traits;

pub use aggregate_pubkey::AggregatePubKey;
pub use errors::BLSError;
pub use private_key::PrivateKey;
pub use pubkey::PubKey;
pub use signature::BLSSignature;
pub use supranational::batch::{SignatureSetItem, verify_signature_sets};
