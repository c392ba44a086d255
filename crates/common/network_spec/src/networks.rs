mod beacon;

pub use beacon::{BeaconNetworkSpec, DEV, MAINNET};
