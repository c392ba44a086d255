pub mod attestation_data;
pub mod beacon_block_header;
pub mod checkpoint;
pub mod constants;
pub mod deposit_data;
pub mod deposit_message;
pub mod eth_1_data;
pub mod fork;
pub mod fork_data;
pub mod fork_name;
pub mod historical_batch;
pub mod historical_summary;
pub mod indexed_attestation;
pub mod misc;
pub mod pending_attestation;
pub mod signing_data;
pub mod validator;
