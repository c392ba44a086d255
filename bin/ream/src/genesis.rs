use alloy_primitives::B256;
use anyhow::ensure;
use ream_state_transition::genesis::{interop_genesis_state, interop_secret_keys};
use ssz::Encode;
use tracing::info;

use crate::{cli::genesis::GenesisConfig, ssz_file::write_ssz_file};

/// Write an interop genesis state and return its root.
pub fn run_genesis(config: &GenesisConfig) -> anyhow::Result<B256> {
    ensure!(
        config.validator_count > 0,
        "A genesis state needs at least one validator"
    );
    let keys = interop_secret_keys(config.validator_count)?;
    let state = interop_genesis_state(&config.network, config.fork, &keys, config.genesis_time)?;
    write_ssz_file(&config.output, &state.as_ssz_bytes())?;

    let root = state.hash_tree_root();
    info!("Wrote genesis state {root} to {}", config.output.display());
    Ok(root)
}
