pub mod b32_hex;
pub mod cli;
pub mod fork_schedule;
pub mod networks;
