pub mod beacon_block;
pub mod beacon_block_body;
pub mod beacon_state;
pub mod execution_payload;
pub mod execution_payload_header;
