use alloy_primitives::B256;
use ream_consensus_misc::{
    beacon_block_header::BeaconBlockHeader, checkpoint::Checkpoint, eth_1_data::Eth1Data,
    fork::Fork,
};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{BitVector, typenum::U4};
use tree_hash_derive::TreeHash;

use crate::{
    beacon_state::{
        Balances, BlockRoots, EpochParticipation, Eth1DataVotes, HistoricalRoots,
        HistoricalSummaries, InactivityScores, RandaoMixes, Slashings, StateRoots, Validators,
    },
    capella::execution_payload_header::ExecutionPayloadHeader,
    shared::{Shared, collect_dirty, field_roots},
    sync_committee::SyncCommittee,
};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconState {
    // Versioning
    #[serde(with = "serde_utils::quoted_u64")]
    pub genesis_time: u64,
    pub genesis_validators_root: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    pub fork: Fork,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: Shared<BlockRoots>,
    pub state_roots: Shared<StateRoots>,
    pub historical_roots: Shared<HistoricalRoots>,

    // Eth1
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: Shared<Eth1DataVotes>,
    #[serde(with = "serde_utils::quoted_u64")]
    pub eth1_deposit_index: u64,

    // Registry
    pub validators: Shared<Validators>,
    #[serde(with = "crate::shared::quoted_u64_var_list")]
    pub balances: Shared<Balances>,

    // Randomness
    pub randao_mixes: Shared<RandaoMixes>,

    // Slashings
    #[serde(with = "crate::shared::quoted_u64_fixed_vec")]
    pub slashings: Shared<Slashings>,

    // Participation
    #[serde(with = "crate::shared::quoted_u8_var_list")]
    pub previous_epoch_participation: Shared<EpochParticipation>,
    #[serde(with = "crate::shared::quoted_u8_var_list")]
    pub current_epoch_participation: Shared<EpochParticipation>,

    // Finality
    pub justification_bits: BitVector<U4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,

    // Inactivity
    #[serde(with = "crate::shared::quoted_u64_var_list")]
    pub inactivity_scores: Shared<InactivityScores>,

    // Sync
    pub current_sync_committee: Shared<SyncCommittee>,
    pub next_sync_committee: Shared<SyncCommittee>,

    // Execution
    pub latest_execution_payload_header: ExecutionPayloadHeader,

    // Withdrawals
    #[serde(with = "serde_utils::quoted_u64")]
    pub next_withdrawal_index: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub next_withdrawal_validator_index: u64,

    // Deep history valid from Capella onwards
    pub historical_summaries: Shared<HistoricalSummaries>,
}

impl BeaconState {
    pub fn field_roots(&self) -> Vec<B256> {
        field_roots!(self;
            genesis_time, genesis_validators_root, slot, fork, latest_block_header, block_roots,
            state_roots, historical_roots, eth1_data, eth1_data_votes, eth1_deposit_index,
            validators, balances, randao_mixes, slashings, previous_epoch_participation,
            current_epoch_participation, justification_bits, previous_justified_checkpoint,
            current_justified_checkpoint, finalized_checkpoint, inactivity_scores,
            current_sync_committee, next_sync_committee, latest_execution_payload_header,
            next_withdrawal_index, next_withdrawal_validator_index, historical_summaries,
        )
    }

    pub fn dirty_fields(&self) -> Vec<&'static str> {
        collect_dirty!(self;
            block_roots, state_roots, historical_roots, eth1_data_votes, validators, balances,
            randao_mixes, slashings, previous_epoch_participation, current_epoch_participation,
            inactivity_scores, current_sync_committee, next_sync_committee, historical_summaries,
        )
    }
}
