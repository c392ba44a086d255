use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use ream_consensus_misc::fork_name::ForkName;
use ream_network_spec::{cli::beacon_network_parser, networks::BeaconNetworkSpec};

use crate::cli::{
    constants::{DEFAULT_NETWORK, DEFAULT_VERBOSITY},
    verbosity::{Verbosity, verbosity_parser},
};

#[derive(Debug, Parser)]
pub struct TransitionConfig {
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

    #[arg(long, help = "SSZ encoded pre-state, optionally snappy compressed (.ssz_snappy)")]
    pub pre_state: PathBuf,

    #[arg(long, help = "SSZ encoded signed block, optionally snappy compressed (.ssz_snappy)")]
    pub block: PathBuf,

    #[arg(
        long,
        help = "Fork of the pre-state and block. Derived from the network's fork schedule when omitted"
    )]
    pub fork: Option<ForkName>,

    #[arg(long, help = "Where to write the SSZ encoded post-state")]
    pub post_state: PathBuf,

    #[arg(long, help = "Skip verification of every signature in the block")]
    pub no_signature_verification: bool,

    #[arg(long, help = "YAML file with the payload status the mock execution engine reports")]
    pub execution_status: Option<PathBuf>,
}
