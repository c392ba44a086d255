use std::sync::{Arc, LazyLock};

use alloy_primitives::{Address, B256, U256, address, aliases::B32, fixed_bytes};
use ream_consensus_misc::{
    constants::FAR_FUTURE_EPOCH, fork::Fork, fork_data::ForkData, fork_name::ForkName,
    misc::checksummed_address,
};
use serde::{Deserialize, Serialize};

use crate::fork_schedule::ForkSchedule;

/// Runtime configuration of a beacon network, as found in a consensus `config.yaml`.
///
/// The value is immutable once built and is passed by reference into every state transition
/// call. Keys of the yaml file this type does not know about are ignored.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct BeaconNetworkSpec {
    pub preset_base: String,
    pub config_name: String,

    // Transition
    #[serde(with = "serde_utils::quoted_u256")]
    pub terminal_total_difficulty: U256,

    // Genesis
    pub min_genesis_active_validator_count: u64,
    pub min_genesis_time: u64,
    #[serde(with = "crate::b32_hex")]
    pub genesis_fork_version: B32,
    pub genesis_delay: u64,

    // Forking
    #[serde(with = "crate::b32_hex")]
    pub altair_fork_version: B32,
    pub altair_fork_epoch: u64,
    #[serde(with = "crate::b32_hex")]
    pub bellatrix_fork_version: B32,
    pub bellatrix_fork_epoch: u64,
    #[serde(with = "crate::b32_hex")]
    pub capella_fork_version: B32,
    pub capella_fork_epoch: u64,

    // Time parameters
    pub seconds_per_slot: u64,
    pub seconds_per_eth1_block: u64,
    pub min_validator_withdrawability_delay: u64,
    pub shard_committee_period: u64,
    pub eth1_follow_distance: u64,

    // Validator cycle
    pub inactivity_score_bias: u64,
    pub inactivity_score_recovery_rate: u64,
    pub ejection_balance: u64,
    pub min_per_epoch_churn_limit: u64,
    pub churn_limit_quotient: u64,

    // Deposit contract
    pub deposit_chain_id: u64,
    pub deposit_network_id: u64,
    #[serde(with = "checksummed_address")]
    pub deposit_contract_address: Address,
}

impl BeaconNetworkSpec {
    pub fn fork_version(&self, fork_name: ForkName) -> B32 {
        match fork_name {
            ForkName::Phase0 => self.genesis_fork_version,
            ForkName::Altair => self.altair_fork_version,
            ForkName::Bellatrix => self.bellatrix_fork_version,
            ForkName::Capella => self.capella_fork_version,
        }
    }

    pub fn fork_epoch(&self, fork_name: ForkName) -> u64 {
        match fork_name {
            ForkName::Phase0 => 0,
            ForkName::Altair => self.altair_fork_epoch,
            ForkName::Bellatrix => self.bellatrix_fork_epoch,
            ForkName::Capella => self.capella_fork_epoch,
        }
    }

    /// The latest fork scheduled at or before ``epoch``.
    pub fn fork_at_epoch(&self, epoch: u64) -> ForkName {
        ForkName::ALL
            .into_iter()
            .rev()
            .find(|fork_name| self.fork_epoch(*fork_name) <= epoch)
            .unwrap_or(ForkName::Phase0)
    }

    /// The fork whose activation epoch is exactly ``epoch``, if any. Forks sharing an epoch
    /// resolve to the latest of them.
    pub fn fork_activated_at(&self, epoch: u64) -> Option<ForkName> {
        ForkName::ALL
            .into_iter()
            .skip(1)
            .rev()
            .find(|fork_name| self.fork_epoch(*fork_name) == epoch)
    }

    pub fn fork_schedule(&self) -> ForkSchedule {
        ForkSchedule(ForkName::ALL.map(|fork_name| Fork {
            previous_version: self.fork_version(fork_name.previous().unwrap_or(fork_name)),
            current_version: self.fork_version(fork_name),
            epoch: self.fork_epoch(fork_name),
        }))
    }

    pub fn fork_digest(&self, fork_name: ForkName, genesis_validators_root: B256) -> B32 {
        ForkData {
            current_version: self.fork_version(fork_name),
            genesis_validators_root,
        }
        .compute_fork_digest()
    }

    /// Same configuration with every fork after phase0 scheduled at the given epochs.
    pub fn with_fork_epochs(&self, altair: u64, bellatrix: u64, capella: u64) -> Self {
        Self {
            altair_fork_epoch: altair,
            bellatrix_fork_epoch: bellatrix,
            capella_fork_epoch: capella,
            ..self.clone()
        }
    }
}

pub static MAINNET: LazyLock<Arc<BeaconNetworkSpec>> = LazyLock::new(|| {
    BeaconNetworkSpec {
        preset_base: "mainnet".to_string(),
        config_name: "mainnet".to_string(),
        terminal_total_difficulty: U256::from(58_750_000_000_000_000_000_000u128),
        min_genesis_active_validator_count: 16384,
        min_genesis_time: 1606824000,
        genesis_fork_version: fixed_bytes!("0x00000000"),
        genesis_delay: 604800,
        altair_fork_version: fixed_bytes!("0x01000000"),
        altair_fork_epoch: 74240,
        bellatrix_fork_version: fixed_bytes!("0x02000000"),
        bellatrix_fork_epoch: 144896,
        capella_fork_version: fixed_bytes!("0x03000000"),
        capella_fork_epoch: 194048,
        seconds_per_slot: 12,
        seconds_per_eth1_block: 14,
        min_validator_withdrawability_delay: 256,
        shard_committee_period: 256,
        eth1_follow_distance: 2048,
        inactivity_score_bias: 4,
        inactivity_score_recovery_rate: 16,
        ejection_balance: 16000000000,
        min_per_epoch_churn_limit: 4,
        churn_limit_quotient: 65536,
        deposit_chain_id: 1,
        deposit_network_id: 1,
        deposit_contract_address: address!("0x00000000219ab540356cBB839Cbe05303d7705Fa"),
    }
    .into()
});

/// Local development network: mainnet parameters with no fork scheduled after genesis, so a
/// state built at any fork stays in it.
pub static DEV: LazyLock<Arc<BeaconNetworkSpec>> = LazyLock::new(|| {
    BeaconNetworkSpec {
        config_name: "dev".to_string(),
        min_genesis_active_validator_count: 64,
        genesis_delay: 0,
        altair_fork_epoch: FAR_FUTURE_EPOCH,
        bellatrix_fork_epoch: FAR_FUTURE_EPOCH,
        capella_fork_epoch: FAR_FUTURE_EPOCH,
        deposit_chain_id: 1337,
        deposit_network_id: 1337,
        deposit_contract_address: address!("0x4242424242424242424242424242424242424242"),
        ..MAINNET.as_ref().clone()
    }
    .into()
});
