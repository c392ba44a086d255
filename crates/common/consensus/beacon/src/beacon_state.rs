mod helpers;
mod mutators;

use alloy_primitives::B256;
use ream_consensus_misc::{
    beacon_block_header::BeaconBlockHeader, checkpoint::Checkpoint, eth_1_data::Eth1Data,
    fork::Fork, fork_name::ForkName, historical_summary::HistoricalSummary,
    misc::compute_epoch_at_slot, pending_attestation::PendingAttestation, validator::Validator,
};
use ream_merkle::merkleize_container;
use ream_network_spec::networks::BeaconNetworkSpec;
use serde::Serialize;
use ssz::{Decode, DecodeError, Encode};
use ssz_types::{
    BitVector, FixedVector, VariableList,
    typenum::{U4, U2048, U4096, U8192, U65536, U16777216, U1099511627776},
};
use tree_hash::{PackedEncoding, TreeHash, TreeHashType};

use crate::{
    altair, beacon_block::read_slot, bellatrix, capella, error::BeaconStateError, phase0,
    sync_committee::SyncCommittee,
};

pub type BlockRoots = FixedVector<B256, U8192>;
pub type StateRoots = FixedVector<B256, U8192>;
pub type HistoricalRoots = VariableList<B256, U16777216>;
pub type Eth1DataVotes = VariableList<Eth1Data, U2048>;
pub type Validators = VariableList<Validator, U1099511627776>;
pub type Balances = VariableList<u64, U1099511627776>;
pub type RandaoMixes = FixedVector<B256, U65536>;
pub type Slashings = FixedVector<u64, U8192>;
pub type PendingAttestations = VariableList<PendingAttestation, U4096>;
pub type EpochParticipation = VariableList<u8, U1099511627776>;
pub type InactivityScores = VariableList<u64, U1099511627776>;
pub type HistoricalSummaries = VariableList<HistoricalSummary, U16777216>;

/// Offset of ``slot`` in an encoded state: ``genesis_time`` then ``genesis_validators_root``.
const STATE_SLOT_OFFSET: usize = 8 + 32;

macro_rules! map_state {
    ($state:expr, $inner:ident => $body:expr) => {
        match $state {
            BeaconState::Phase0($inner) => $body,
            BeaconState::Altair($inner) => $body,
            BeaconState::Bellatrix($inner) => $body,
            BeaconState::Capella($inner) => $body,
        }
    };
}

/// Fields held by value in every fork.
macro_rules! copy_fields {
    ($($field:ident, $field_mut:ident: $ty:ty;)+) => {
        $(
            pub fn $field(&self) -> $ty {
                map_state!(self, state => state.$field)
            }

            pub fn $field_mut(&mut self) -> &mut $ty {
                map_state!(self, state => &mut state.$field)
            }
        )+
    };
}

macro_rules! ref_fields {
    ($($field:ident, $field_mut:ident: $ty:ty;)+) => {
        $(
            pub fn $field(&self) -> &$ty {
                map_state!(self, state => &state.$field)
            }

            pub fn $field_mut(&mut self) -> &mut $ty {
                map_state!(self, state => &mut state.$field)
            }
        )+
    };
}

/// Copy-on-write fields present in every fork. The `_mut` accessor detaches and dirties.
macro_rules! shared_fields {
    ($($field:ident, $field_mut:ident: $ty:ty;)+) => {
        $(
            pub fn $field(&self) -> &$ty {
                map_state!(self, state => &*state.$field)
            }

            pub fn $field_mut(&mut self) -> &mut $ty {
                map_state!(self, state => state.$field.make_mut())
            }
        )+
    };
}

/// Copy-on-write fields present only in the listed forks.
macro_rules! gated_shared_fields {
    ($($field:ident, $field_mut:ident: $ty:ty => [$($variant:ident),+];)+) => {
        $(
            pub fn $field(&self) -> Result<&$ty, BeaconStateError> {
                match self {
                    $(BeaconState::$variant(state) => Ok(&*state.$field),)+
                    _ => Err(self.unsupported(stringify!($field))),
                }
            }

            pub fn $field_mut(&mut self) -> Result<&mut $ty, BeaconStateError> {
                let error = self.unsupported(stringify!($field));
                match self {
                    $(BeaconState::$variant(state) => Ok(state.$field.make_mut()),)+
                    _ => Err(error),
                }
            }
        )+
    };
}

/// A beacon state of any supported fork.
///
/// Accessors for fields that a fork lacks return [`BeaconStateError::UnsupportedField`].
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(untagged)]
pub enum BeaconState {
    Phase0(phase0::beacon_state::BeaconState),
    Altair(altair::beacon_state::BeaconState),
    Bellatrix(bellatrix::beacon_state::BeaconState),
    Capella(capella::beacon_state::BeaconState),
}

impl BeaconState {
    pub fn fork_name(&self) -> ForkName {
        match self {
            BeaconState::Phase0(_) => ForkName::Phase0,
            BeaconState::Altair(_) => ForkName::Altair,
            BeaconState::Bellatrix(_) => ForkName::Bellatrix,
            BeaconState::Capella(_) => ForkName::Capella,
        }
    }

    fn unsupported(&self, field: &'static str) -> BeaconStateError {
        BeaconStateError::UnsupportedField {
            field,
            fork: self.fork_name(),
        }
    }

    copy_fields! {
        genesis_time, genesis_time_mut: u64;
        genesis_validators_root, genesis_validators_root_mut: B256;
        slot, slot_mut: u64;
        fork, fork_mut: Fork;
        eth1_deposit_index, eth1_deposit_index_mut: u64;
        previous_justified_checkpoint, previous_justified_checkpoint_mut: Checkpoint;
        current_justified_checkpoint, current_justified_checkpoint_mut: Checkpoint;
        finalized_checkpoint, finalized_checkpoint_mut: Checkpoint;
    }

    ref_fields! {
        latest_block_header, latest_block_header_mut: BeaconBlockHeader;
        eth1_data, eth1_data_mut: Eth1Data;
        justification_bits, justification_bits_mut: BitVector<U4>;
    }

    shared_fields! {
        block_roots, block_roots_mut: BlockRoots;
        state_roots, state_roots_mut: StateRoots;
        historical_roots, historical_roots_mut: HistoricalRoots;
        eth1_data_votes, eth1_data_votes_mut: Eth1DataVotes;
        validators, validators_mut: Validators;
        balances, balances_mut: Balances;
        randao_mixes, randao_mixes_mut: RandaoMixes;
        slashings, slashings_mut: Slashings;
    }

    gated_shared_fields! {
        previous_epoch_attestations, previous_epoch_attestations_mut: PendingAttestations
            => [Phase0];
        current_epoch_attestations, current_epoch_attestations_mut: PendingAttestations
            => [Phase0];
        previous_epoch_participation, previous_epoch_participation_mut: EpochParticipation
            => [Altair, Bellatrix, Capella];
        current_epoch_participation, current_epoch_participation_mut: EpochParticipation
            => [Altair, Bellatrix, Capella];
        inactivity_scores, inactivity_scores_mut: InactivityScores
            => [Altair, Bellatrix, Capella];
        current_sync_committee, current_sync_committee_mut: SyncCommittee
            => [Altair, Bellatrix, Capella];
        next_sync_committee, next_sync_committee_mut: SyncCommittee
            => [Altair, Bellatrix, Capella];
        historical_summaries, historical_summaries_mut: HistoricalSummaries => [Capella];
    }

    pub fn next_withdrawal_index(&self) -> Result<u64, BeaconStateError> {
        match self {
            BeaconState::Capella(state) => Ok(state.next_withdrawal_index),
            _ => Err(self.unsupported("next_withdrawal_index")),
        }
    }

    pub fn next_withdrawal_index_mut(&mut self) -> Result<&mut u64, BeaconStateError> {
        let error = self.unsupported("next_withdrawal_index");
        match self {
            BeaconState::Capella(state) => Ok(&mut state.next_withdrawal_index),
            _ => Err(error),
        }
    }

    pub fn next_withdrawal_validator_index(&self) -> Result<u64, BeaconStateError> {
        match self {
            BeaconState::Capella(state) => Ok(state.next_withdrawal_validator_index),
            _ => Err(self.unsupported("next_withdrawal_validator_index")),
        }
    }

    pub fn next_withdrawal_validator_index_mut(&mut self) -> Result<&mut u64, BeaconStateError> {
        let error = self.unsupported("next_withdrawal_validator_index");
        match self {
            BeaconState::Capella(state) => Ok(&mut state.next_withdrawal_validator_index),
            _ => Err(error),
        }
    }

    /// Block hash of ``latest_execution_payload_header``.
    pub fn latest_execution_payload_block_hash(&self) -> Result<B256, BeaconStateError> {
        match self {
            BeaconState::Bellatrix(state) => Ok(state.latest_execution_payload_header.block_hash),
            BeaconState::Capella(state) => Ok(state.latest_execution_payload_header.block_hash),
            _ => Err(self.unsupported("latest_execution_payload_header")),
        }
    }

    /// False before Bellatrix, and until the first non-empty payload is stored.
    pub fn is_merge_transition_complete(&self) -> bool {
        match self {
            BeaconState::Phase0(_) | BeaconState::Altair(_) => false,
            BeaconState::Bellatrix(state) => !state.latest_execution_payload_header.is_default(),
            BeaconState::Capella(state) => !state.latest_execution_payload_header.is_default(),
        }
    }

    /// Root of the state, reusing the cached roots of clean copy-on-write fields.
    pub fn hash_tree_root(&self) -> B256 {
        merkleize_container(&map_state!(self, state => state.field_roots()))
    }

    /// Copy-on-write fields whose root must be recomputed.
    pub fn dirty_fields(&self) -> Vec<&'static str> {
        map_state!(self, state => state.dirty_fields())
    }

    pub fn from_ssz_bytes(bytes: &[u8], fork: ForkName) -> Result<Self, BeaconStateError> {
        let decode_error = |err: DecodeError| BeaconStateError::Decode {
            fork,
            reason: format!("{err:?}"),
        };
        Ok(match fork {
            ForkName::Phase0 => BeaconState::Phase0(
                phase0::beacon_state::BeaconState::from_ssz_bytes(bytes).map_err(decode_error)?,
            ),
            ForkName::Altair => BeaconState::Altair(
                altair::beacon_state::BeaconState::from_ssz_bytes(bytes).map_err(decode_error)?,
            ),
            ForkName::Bellatrix => BeaconState::Bellatrix(
                bellatrix::beacon_state::BeaconState::from_ssz_bytes(bytes)
                    .map_err(decode_error)?,
            ),
            ForkName::Capella => BeaconState::Capella(
                capella::beacon_state::BeaconState::from_ssz_bytes(bytes).map_err(decode_error)?,
            ),
        })
    }

    /// Decode a state, picking the fork the network schedules at the state's slot.
    pub fn from_ssz_bytes_with_spec(
        bytes: &[u8],
        spec: &BeaconNetworkSpec,
    ) -> Result<Self, BeaconStateError> {
        let slot =
            read_slot(bytes, STATE_SLOT_OFFSET).ok_or_else(|| BeaconStateError::Decode {
                fork: ForkName::Phase0,
                reason: format!("state is too short to hold a slot: {} bytes", bytes.len()),
            })?;
        Self::from_ssz_bytes(bytes, spec.fork_at_epoch(compute_epoch_at_slot(slot)))
    }
}

impl Encode for BeaconState {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        map_state!(self, state => state.ssz_append(buf))
    }

    fn ssz_bytes_len(&self) -> usize {
        map_state!(self, state => state.ssz_bytes_len())
    }
}

impl TreeHash for BeaconState {
    fn tree_hash_type() -> TreeHashType {
        TreeHashType::Container
    }

    fn tree_hash_packed_encoding(&self) -> PackedEncoding {
        unreachable!("Container should never be packed.")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("Container should never be packed.")
    }

    fn tree_hash_root(&self) -> B256 {
        self.hash_tree_root()
    }
}

impl From<phase0::beacon_state::BeaconState> for BeaconState {
    fn from(state: phase0::beacon_state::BeaconState) -> Self {
        BeaconState::Phase0(state)
    }
}

impl From<altair::beacon_state::BeaconState> for BeaconState {
    fn from(state: altair::beacon_state::BeaconState) -> Self {
        BeaconState::Altair(state)
    }
}

impl From<bellatrix::beacon_state::BeaconState> for BeaconState {
    fn from(state: bellatrix::beacon_state::BeaconState) -> Self {
        BeaconState::Bellatrix(state)
    }
}

impl From<capella::beacon_state::BeaconState> for BeaconState {
    fn from(state: capella::beacon_state::BeaconState) -> Self {
        BeaconState::Capella(state)
    }
}

#[cfg(test)]
mod tests {
    use ream_bls::PubKey;
    use ream_consensus_misc::{
        constants::{
            EPOCHS_PER_SLASHINGS_VECTOR, FAR_FUTURE_EPOCH, MAX_EFFECTIVE_BALANCE,
            WHISTLEBLOWER_REWARD_QUOTIENT,
        },
        misc::compute_activation_exit_epoch,
    };
    use rstest::rstest;

    use super::*;
    use crate::shared::Shared;

    fn validator(index: u8) -> Validator {
        Validator {
            pubkey: PubKey::default(),
            withdrawal_credentials: B256::repeat_byte(index),
            effective_balance: MAX_EFFECTIVE_BALANCE,
            slashed: false,
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        }
    }

    fn phase0_state(count: u8) -> phase0::beacon_state::BeaconState {
        phase0::beacon_state::BeaconState {
            genesis_time: 1_600_000_000,
            genesis_validators_root: B256::repeat_byte(0xaa),
            slot: 5,
            fork: Fork::default(),
            latest_block_header: BeaconBlockHeader::default(),
            block_roots: Shared::default(),
            state_roots: Shared::default(),
            historical_roots: Shared::default(),
            eth1_data: Eth1Data::default(),
            eth1_data_votes: Shared::default(),
            eth1_deposit_index: count as u64,
            validators: Shared::new((0..count).map(validator).collect::<Vec<_>>().into()),
            balances: Shared::new(vec![MAX_EFFECTIVE_BALANCE; count as usize].into()),
            randao_mixes: Shared::default(),
            slashings: Shared::default(),
            previous_epoch_attestations: Shared::default(),
            current_epoch_attestations: Shared::default(),
            justification_bits: BitVector::new(),
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
        }
    }

    fn altair_state(count: u8) -> altair::beacon_state::BeaconState {
        let base = phase0_state(count);
        altair::beacon_state::BeaconState {
            genesis_time: base.genesis_time,
            genesis_validators_root: base.genesis_validators_root,
            slot: base.slot,
            fork: base.fork,
            latest_block_header: base.latest_block_header,
            block_roots: base.block_roots,
            state_roots: base.state_roots,
            historical_roots: base.historical_roots,
            eth1_data: base.eth1_data,
            eth1_data_votes: base.eth1_data_votes,
            eth1_deposit_index: base.eth1_deposit_index,
            validators: base.validators,
            balances: base.balances,
            randao_mixes: base.randao_mixes,
            slashings: base.slashings,
            previous_epoch_participation: Shared::new(vec![0; count as usize].into()),
            current_epoch_participation: Shared::new(vec![7; count as usize].into()),
            justification_bits: base.justification_bits,
            previous_justified_checkpoint: base.previous_justified_checkpoint,
            current_justified_checkpoint: base.current_justified_checkpoint,
            finalized_checkpoint: base.finalized_checkpoint,
            inactivity_scores: Shared::new(vec![0; count as usize].into()),
            current_sync_committee: Shared::default(),
            next_sync_committee: Shared::default(),
        }
    }

    fn capella_state(count: u8) -> capella::beacon_state::BeaconState {
        let base = altair_state(count);
        capella::beacon_state::BeaconState {
            genesis_time: base.genesis_time,
            genesis_validators_root: base.genesis_validators_root,
            slot: base.slot,
            fork: base.fork,
            latest_block_header: base.latest_block_header,
            block_roots: base.block_roots,
            state_roots: base.state_roots,
            historical_roots: base.historical_roots,
            eth1_data: base.eth1_data,
            eth1_data_votes: base.eth1_data_votes,
            eth1_deposit_index: base.eth1_deposit_index,
            validators: base.validators,
            balances: base.balances,
            randao_mixes: base.randao_mixes,
            slashings: base.slashings,
            previous_epoch_participation: base.previous_epoch_participation,
            current_epoch_participation: base.current_epoch_participation,
            justification_bits: base.justification_bits,
            previous_justified_checkpoint: base.previous_justified_checkpoint,
            current_justified_checkpoint: base.current_justified_checkpoint,
            finalized_checkpoint: base.finalized_checkpoint,
            inactivity_scores: base.inactivity_scores,
            current_sync_committee: base.current_sync_committee,
            next_sync_committee: base.next_sync_committee,
            latest_execution_payload_header: Default::default(),
            next_withdrawal_index: 3,
            next_withdrawal_validator_index: 1,
            historical_summaries: Shared::default(),
        }
    }

    fn state_for(fork: ForkName) -> BeaconState {
        match fork {
            ForkName::Phase0 => phase0_state(8).into(),
            ForkName::Altair => altair_state(8).into(),
            ForkName::Bellatrix => bellatrix_from_altair(altair_state(8)).into(),
            ForkName::Capella => capella_state(8).into(),
        }
    }

    fn bellatrix_from_altair(
        base: altair::beacon_state::BeaconState,
    ) -> bellatrix::beacon_state::BeaconState {
        bellatrix::beacon_state::BeaconState {
            genesis_time: base.genesis_time,
            genesis_validators_root: base.genesis_validators_root,
            slot: base.slot,
            fork: base.fork,
            latest_block_header: base.latest_block_header,
            block_roots: base.block_roots,
            state_roots: base.state_roots,
            historical_roots: base.historical_roots,
            eth1_data: base.eth1_data,
            eth1_data_votes: base.eth1_data_votes,
            eth1_deposit_index: base.eth1_deposit_index,
            validators: base.validators,
            balances: base.balances,
            randao_mixes: base.randao_mixes,
            slashings: base.slashings,
            previous_epoch_participation: base.previous_epoch_participation,
            current_epoch_participation: base.current_epoch_participation,
            justification_bits: base.justification_bits,
            previous_justified_checkpoint: base.previous_justified_checkpoint,
            current_justified_checkpoint: base.current_justified_checkpoint,
            finalized_checkpoint: base.finalized_checkpoint,
            inactivity_scores: base.inactivity_scores,
            current_sync_committee: base.current_sync_committee,
            next_sync_committee: base.next_sync_committee,
            latest_execution_payload_header: Default::default(),
        }
    }

    #[rstest]
    #[case(ForkName::Phase0)]
    #[case(ForkName::Altair)]
    #[case(ForkName::Bellatrix)]
    #[case(ForkName::Capella)]
    fn test_ssz_roundtrip_keeps_root(#[case] fork: ForkName) {
        let state = state_for(fork);
        let decoded = BeaconState::from_ssz_bytes(&state.as_ssz_bytes(), fork).unwrap();
        assert_eq!(decoded.fork_name(), fork);
        assert_eq!(decoded.hash_tree_root(), state.hash_tree_root());
    }

    #[rstest]
    #[case(ForkName::Phase0)]
    #[case(ForkName::Altair)]
    #[case(ForkName::Bellatrix)]
    #[case(ForkName::Capella)]
    fn test_root_matches_derived_tree_hash(#[case] fork: ForkName) {
        let state = state_for(fork);
        let derived = match &state {
            BeaconState::Phase0(inner) => inner.tree_hash_root(),
            BeaconState::Altair(inner) => inner.tree_hash_root(),
            BeaconState::Bellatrix(inner) => inner.tree_hash_root(),
            BeaconState::Capella(inner) => inner.tree_hash_root(),
        };
        assert_eq!(state.hash_tree_root(), derived);
    }

    #[test]
    fn test_decode_picks_fork_from_slot() {
        let spec = ream_network_spec::networks::DEV.with_fork_epochs(0, u64::MAX, u64::MAX);
        let state = state_for(ForkName::Altair);
        let decoded = BeaconState::from_ssz_bytes_with_spec(&state.as_ssz_bytes(), &spec).unwrap();
        assert_eq!(decoded.fork_name(), ForkName::Altair);
        assert!(BeaconState::from_ssz_bytes(&state.as_ssz_bytes(), ForkName::Capella).is_err());
    }

    #[test]
    fn test_unsupported_fields() {
        let mut phase0 = state_for(ForkName::Phase0);
        assert_eq!(
            phase0.inactivity_scores().unwrap_err(),
            BeaconStateError::UnsupportedField {
                field: "inactivity_scores",
                fork: ForkName::Phase0
            }
        );
        assert!(phase0.current_epoch_participation_mut().is_err());
        assert!(phase0.next_withdrawal_index().is_err());
        assert!(phase0.latest_execution_payload_block_hash().is_err());
        assert!(phase0.current_epoch_attestations().is_ok());

        let altair = state_for(ForkName::Altair);
        assert!(altair.previous_epoch_attestations().is_err());
        assert!(altair.historical_summaries().is_err());
        assert!(altair.next_sync_committee().is_ok());

        let capella = state_for(ForkName::Capella);
        assert_eq!(capella.next_withdrawal_index().unwrap(), 3);
        assert_eq!(capella.next_withdrawal_validator_index().unwrap(), 1);
        assert!(!capella.is_merge_transition_complete());
    }

    #[test]
    fn test_clone_detaches_on_write() {
        let original = state_for(ForkName::Altair);
        original.hash_tree_root();
        assert!(original.dirty_fields().is_empty());

        let mut copy = original.clone();
        copy.balances_mut()[0] += 1;
        copy.current_epoch_participation_mut().unwrap()[1] = 0;

        assert_eq!(copy.dirty_fields(), vec!["balances", "current_epoch_participation"]);
        assert!(original.dirty_fields().is_empty());
        assert_eq!(original.balances()[0], MAX_EFFECTIVE_BALANCE);
        assert_ne!(copy.hash_tree_root(), original.hash_tree_root());

        let (BeaconState::Altair(original), BeaconState::Altair(copy)) = (&original, &copy) else {
            panic!("expected altair states");
        };
        assert!(Shared::ptr_eq(&original.validators, &copy.validators));
        assert!(!Shared::ptr_eq(&original.balances, &copy.balances));
    }

    #[rstest]
    #[case(ForkName::Phase0, 128)]
    #[case(ForkName::Altair, 64)]
    #[case(ForkName::Bellatrix, 32)]
    #[case(ForkName::Capella, 32)]
    fn test_slash_validator_pays_whistleblower_and_proposer(
        #[case] fork: ForkName,
        #[case] penalty_quotient: u64,
    ) {
        let spec = &ream_network_spec::networks::DEV;
        let mut state = state_for(fork);
        let proposer = state.get_beacon_proposer_index().unwrap();
        let slashed = (proposer + 1) % 8;
        let whistleblower = (proposer + 2) % 8;

        state
            .slash_validator(slashed, Some(whistleblower), spec)
            .unwrap();

        let validator = &state.validators()[slashed as usize];
        assert!(validator.slashed);
        assert_eq!(validator.exit_epoch, compute_activation_exit_epoch(0));
        assert_eq!(validator.withdrawable_epoch, EPOCHS_PER_SLASHINGS_VECTOR);
        assert_eq!(state.slashings()[0], MAX_EFFECTIVE_BALANCE);

        let whistleblower_reward = MAX_EFFECTIVE_BALANCE / WHISTLEBLOWER_REWARD_QUOTIENT;
        let proposer_reward = whistleblower_reward / 8;
        assert_eq!(
            state.balances()[slashed as usize],
            MAX_EFFECTIVE_BALANCE - MAX_EFFECTIVE_BALANCE / penalty_quotient
        );
        assert_eq!(
            state.balances()[proposer as usize],
            MAX_EFFECTIVE_BALANCE + proposer_reward
        );
        assert_eq!(
            state.balances()[whistleblower as usize],
            MAX_EFFECTIVE_BALANCE + whistleblower_reward - proposer_reward
        );
    }

    #[test]
    fn test_slash_validator_without_whistleblower_pays_proposer() {
        let spec = &ream_network_spec::networks::DEV;
        let mut state = state_for(ForkName::Altair);
        let proposer = state.get_beacon_proposer_index().unwrap();
        let slashed = (proposer + 1) % 8;

        state.slash_validator(slashed, None, spec).unwrap();
        // A second slashing keeps the exit already scheduled
        state.slash_validator(slashed, None, spec).unwrap();

        assert_eq!(
            state.validators()[slashed as usize].exit_epoch,
            compute_activation_exit_epoch(0)
        );
        assert_eq!(state.slashings()[0], 2 * MAX_EFFECTIVE_BALANCE);
        assert_eq!(
            state.balances()[proposer as usize],
            MAX_EFFECTIVE_BALANCE + 2 * (MAX_EFFECTIVE_BALANCE / WHISTLEBLOWER_REWARD_QUOTIENT)
        );
    }

    #[test]
    fn test_plain_field_accessors() {
        let mut state = state_for(ForkName::Phase0);
        *state.slot_mut() = 64;
        state.eth1_data_mut().deposit_count = 9;
        assert_eq!(state.slot(), 64);
        assert_eq!(state.get_current_epoch(), 2);
        assert_eq!(state.get_previous_epoch(), 1);
        assert_eq!(state.eth1_data().deposit_count, 9);
    }
}
