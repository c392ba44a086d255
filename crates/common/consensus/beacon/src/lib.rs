pub mod altair;
pub mod attestation;
pub mod attester_slashing;
pub mod beacon_block;
pub mod beacon_state;
pub mod bellatrix;
pub mod bls_to_execution_change;
pub mod capella;
pub mod deposit;
pub mod error;
pub mod execution_engine;
pub mod helpers;
pub mod phase0;
pub mod proposer_slashing;
pub mod shared;
pub mod sync_aggregate;
pub mod sync_committee;
pub mod voluntary_exit;
pub mod withdrawal;
