use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use ream_consensus_misc::fork_name::ForkName;
use ream_network_spec::{cli::beacon_network_parser, networks::BeaconNetworkSpec};

use crate::cli::{
    constants::{
        DEFAULT_GENESIS_TIME, DEFAULT_NETWORK, DEFAULT_VALIDATOR_COUNT, DEFAULT_VERBOSITY,
    },
    verbosity::{Verbosity, verbosity_parser},
};

#[derive(Debug, Parser)]
pub struct GenesisConfig {
    /// Verbosity level
    #[arg(short, long, default_value = DEFAULT_VERBOSITY, value_parser = verbosity_parser)]
    pub verbosity: Verbosity,

    #[arg(
        long,
        help = "Choose mainnet, dev or provide a path to a YAML config file",
        default_value = DEFAULT_NETWORK,
        value_parser = beacon_network_parser
    )]
    pub network: Arc<BeaconNetworkSpec>,

    #[arg(long, help = "Fork of the genesis state", default_value_t = ForkName::Phase0)]
    pub fork: ForkName,

    #[arg(long, help = "Number of interop validators", default_value_t = DEFAULT_VALIDATOR_COUNT)]
    pub validator_count: usize,

    #[arg(
        long,
        help = "Genesis time in seconds since the unix epoch",
        default_value_t = DEFAULT_GENESIS_TIME
    )]
    pub genesis_time: u64,

    #[arg(long, help = "Where to write the SSZ encoded genesis state")]
    pub output: PathBuf,
}
