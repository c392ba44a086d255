//! `blst` backed implementations of the BLS primitives.

pub mod aggregate_pubkey;
pub mod batch;
pub mod private_key;
pub mod pubkey;
pub mod signature;
