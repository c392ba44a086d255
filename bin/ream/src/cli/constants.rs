pub const DEFAULT_GENESIS_TIME: u64 = 1_606_824_023;
pub const DEFAULT_NETWORK: &str = "mainnet";
pub const DEFAULT_VALIDATOR_COUNT: usize = 64;
pub const DEFAULT_VERBOSITY: &str = "3";
