pub mod beacon_block;
pub mod beacon_block_body;
pub mod beacon_state;
