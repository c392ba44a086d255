use std::{cmp::max, collections::HashSet};

use alloy_primitives::{B256, aliases::B32};
use anyhow::{anyhow, ensure};
use ethereum_hashing::{hash, hash_fixed};
use itertools::Itertools;
use ream_bls::PubKey;
use ream_consensus_misc::{
    attestation_data::AttestationData,
    constants::{
        BASE_REWARD_FACTOR, BASE_REWARDS_PER_EPOCH, DOMAIN_BEACON_ATTESTER,
        DOMAIN_BEACON_PROPOSER, DOMAIN_SYNC_COMMITTEE, EFFECTIVE_BALANCE_INCREMENT,
        EPOCHS_PER_HISTORICAL_VECTOR, GENESIS_EPOCH, MAX_COMMITTEES_PER_SLOT,
        MAX_EFFECTIVE_BALANCE, MAX_RANDOM_BYTE, MIN_ATTESTATION_INCLUSION_DELAY,
        MIN_EPOCHS_TO_INACTIVITY_PENALTY, MIN_SEED_LOOKAHEAD, SLOTS_PER_EPOCH,
        SLOTS_PER_HISTORICAL_ROOT, SYNC_COMMITTEE_SIZE, TARGET_COMMITTEE_SIZE,
        TIMELY_HEAD_FLAG_INDEX, TIMELY_SOURCE_FLAG_INDEX, TIMELY_TARGET_FLAG_INDEX,
    },
    indexed_attestation::IndexedAttestation,
    misc::{
        compute_committee, compute_domain, compute_epoch_at_slot, compute_shuffled_index,
        compute_start_slot_at_epoch, has_flag, integer_squareroot, is_sorted_and_unique,
    },
};
use ream_network_spec::networks::BeaconNetworkSpec;
use ssz_types::{BitList, typenum::U2048};

use super::BeaconState;
use crate::{attestation::Attestation, helpers::eth_aggregate_pubkeys, sync_committee::SyncCommittee};

impl BeaconState {
    /// Return the current epoch.
    pub fn get_current_epoch(&self) -> u64 {
        compute_epoch_at_slot(self.slot())
    }

    /// Return the previous epoch (unless the current epoch is ``GENESIS_EPOCH``).
    pub fn get_previous_epoch(&self) -> u64 {
        let current_epoch = self.get_current_epoch();
        if current_epoch == GENESIS_EPOCH {
            GENESIS_EPOCH
        } else {
            current_epoch - 1
        }
    }

    /// Return the block root at the start of a recent ``epoch``.
    pub fn get_block_root(&self, epoch: u64) -> anyhow::Result<B256> {
        self.get_block_root_at_slot(compute_start_slot_at_epoch(epoch))
    }

    /// Return the block root at a recent ``slot``.
    pub fn get_block_root_at_slot(&self, slot: u64) -> anyhow::Result<B256> {
        ensure!(
            slot < self.slot() && self.slot() <= slot + SLOTS_PER_HISTORICAL_ROOT,
            "slot given was outside of block_roots range"
        );
        Ok(self.block_roots()[(slot % SLOTS_PER_HISTORICAL_ROOT) as usize])
    }

    /// Return the randao mix at a recent ``epoch``.
    pub fn get_randao_mix(&self, epoch: u64) -> B256 {
        self.randao_mixes()[(epoch % EPOCHS_PER_HISTORICAL_VECTOR) as usize]
    }

    /// Return the sequence of active validator indices at ``epoch``.
    pub fn get_active_validator_indices(&self, epoch: u64) -> Vec<u64> {
        self.validators()
            .iter()
            .enumerate()
            .filter(|(_, validator)| validator.is_active_validator(epoch))
            .map(|(index, _)| index as u64)
            .collect()
    }

    /// Return the validator churn limit for the current epoch.
    pub fn get_validator_churn_limit(&self, spec: &BeaconNetworkSpec) -> u64 {
        let active_validator_indices = self.get_active_validator_indices(self.get_current_epoch());
        max(
            spec.min_per_epoch_churn_limit,
            active_validator_indices.len() as u64 / spec.churn_limit_quotient,
        )
    }

    /// Return the seed at ``epoch``.
    pub fn get_seed(&self, epoch: u64, domain_type: B32) -> B256 {
        let mix =
            self.get_randao_mix(epoch + EPOCHS_PER_HISTORICAL_VECTOR - MIN_SEED_LOOKAHEAD - 1);
        let epoch_with_index =
            [domain_type.as_slice(), &epoch.to_le_bytes(), mix.as_slice()].concat();
        B256::from(hash_fixed(&epoch_with_index))
    }

    /// Return the number of committees in each slot for the given ``epoch``.
    pub fn get_committee_count_per_slot(&self, epoch: u64) -> u64 {
        (self.get_active_validator_indices(epoch).len() as u64
            / SLOTS_PER_EPOCH
            / TARGET_COMMITTEE_SIZE)
            .clamp(1, MAX_COMMITTEES_PER_SLOT)
    }

    /// Return the beacon committee at ``slot`` for ``index``.
    pub fn get_beacon_committee(&self, slot: u64, index: u64) -> anyhow::Result<Vec<u64>> {
        let epoch = compute_epoch_at_slot(slot);
        let committees_per_slot = self.get_committee_count_per_slot(epoch);
        compute_committee(
            &self.get_active_validator_indices(epoch),
            self.get_seed(epoch, DOMAIN_BEACON_ATTESTER),
            (slot % SLOTS_PER_EPOCH) * committees_per_slot + index,
            committees_per_slot * SLOTS_PER_EPOCH,
        )
    }

    /// Return from ``indices`` a random index sampled by effective balance.
    pub fn compute_proposer_index(&self, indices: &[u64], seed: B256) -> anyhow::Result<u64> {
        ensure!(!indices.is_empty(), "Cannot pick a proposer from an empty index set");

        let total = indices.len();
        let mut i: usize = 0;
        loop {
            let candidate_index = indices[compute_shuffled_index(i % total, total, seed)?];
            let random_byte =
                hash(&[seed.as_slice(), &((i / 32) as u64).to_le_bytes()].concat())[i % 32];
            let effective_balance = self
                .validators()
                .get(candidate_index as usize)
                .ok_or_else(|| anyhow!("Validator {candidate_index} not found"))?
                .effective_balance;

            if effective_balance * MAX_RANDOM_BYTE >= MAX_EFFECTIVE_BALANCE * random_byte as u64 {
                return Ok(candidate_index);
            }

            i += 1;
        }
    }

    /// Return the beacon proposer index at the current slot.
    pub fn get_beacon_proposer_index(&self) -> anyhow::Result<u64> {
        let epoch = self.get_current_epoch();
        let seed = B256::from(hash_fixed(
            &[
                self.get_seed(epoch, DOMAIN_BEACON_PROPOSER).as_slice(),
                &self.slot().to_le_bytes(),
            ]
            .concat(),
        ));
        let indices = self.get_active_validator_indices(epoch);
        self.compute_proposer_index(&indices, seed)
    }

    /// Return the combined effective balance of the ``indices``.
    /// ``EFFECTIVE_BALANCE_INCREMENT`` Gwei minimum to avoid divisions by zero.
    pub fn get_total_balance(&self, indices: impl IntoIterator<Item = u64>) -> u64 {
        let validators = self.validators();
        max(
            EFFECTIVE_BALANCE_INCREMENT,
            indices
                .into_iter()
                .filter_map(|index| validators.get(index as usize))
                .map(|validator| validator.effective_balance)
                .sum(),
        )
    }

    /// Return the combined effective balance of the active validators.
    pub fn get_total_active_balance(&self) -> u64 {
        self.get_total_balance(self.get_active_validator_indices(self.get_current_epoch()))
    }

    /// Return the signature domain (fork version concatenated with domain type) of a message.
    pub fn get_domain(&self, domain_type: B32, epoch: Option<u64>) -> B256 {
        let epoch = epoch.unwrap_or_else(|| self.get_current_epoch());
        let fork = self.fork();
        let fork_version = if epoch < fork.epoch {
            fork.previous_version
        } else {
            fork.current_version
        };
        compute_domain(domain_type, fork_version, self.genesis_validators_root())
    }

    /// Return the set of attesting indices corresponding to ``data`` and ``bits``.
    pub fn get_attesting_indices(
        &self,
        data: &AttestationData,
        bits: &BitList<U2048>,
    ) -> anyhow::Result<HashSet<u64>> {
        let committee = self.get_beacon_committee(data.slot, data.index)?;
        ensure!(
            bits.len() == committee.len(),
            "Aggregation bits length {} does not match committee size {}",
            bits.len(),
            committee.len()
        );
        Ok(committee
            .into_iter()
            .enumerate()
            .filter(|(i, _)| bits.get(*i).unwrap_or(false))
            .map(|(_, index)| index)
            .collect())
    }

    /// Return the indexed attestation corresponding to ``attestation``.
    pub fn get_indexed_attestation(
        &self,
        attestation: &Attestation,
    ) -> anyhow::Result<IndexedAttestation> {
        let attesting_indices = self
            .get_attesting_indices(&attestation.data, &attestation.aggregation_bits)?
            .into_iter()
            .sorted()
            .collect::<Vec<_>>();
        Ok(IndexedAttestation {
            attesting_indices: attesting_indices.into(),
            data: attestation.data.clone(),
            signature: attestation.signature.clone(),
        })
    }

    /// Check that ``indexed_attestation`` is not empty and has sorted and unique indices that
    /// all exist in the registry. The signature is checked separately.
    pub fn is_valid_indexed_attestation_structure(
        &self,
        indexed_attestation: &IndexedAttestation,
    ) -> bool {
        let indices = &indexed_attestation.attesting_indices;
        !indices.is_empty()
            && is_sorted_and_unique(indices)
            && indices
                .iter()
                .all(|&index| (index as usize) < self.validators().len())
    }

    /// Public keys of the attesters of ``indexed_attestation``, in index order.
    pub fn get_attesting_pubkeys(
        &self,
        indexed_attestation: &IndexedAttestation,
    ) -> anyhow::Result<Vec<&PubKey>> {
        indexed_attestation
            .attesting_indices
            .iter()
            .map(|&index| {
                self.validators()
                    .get(index as usize)
                    .map(|validator| &validator.pubkey)
                    .ok_or_else(|| anyhow!("Invalid attesting index {index}"))
            })
            .collect()
    }

    /// Return the set of validator indices that are both active and unslashed for the given
    /// ``flag_index`` and ``epoch``.
    pub fn get_unslashed_participating_indices(
        &self,
        flag_index: u8,
        epoch: u64,
    ) -> anyhow::Result<HashSet<u64>> {
        ensure!(
            epoch == self.get_previous_epoch() || epoch == self.get_current_epoch(),
            "Epoch must be either the previous or current epoch"
        );
        let epoch_participation = if epoch == self.get_current_epoch() {
            self.current_epoch_participation()?
        } else {
            self.previous_epoch_participation()?
        };
        let validators = self.validators();
        Ok(self
            .get_active_validator_indices(epoch)
            .into_iter()
            .filter(|&index| {
                epoch_participation
                    .get(index as usize)
                    .is_some_and(|&flags| has_flag(flags, flag_index))
                    && !validators[index as usize].slashed
            })
            .collect())
    }

    pub fn get_base_reward_per_increment(&self, total_active_balance: u64) -> u64 {
        EFFECTIVE_BALANCE_INCREMENT * BASE_REWARD_FACTOR / integer_squareroot(total_active_balance)
    }

    /// Return the base reward for the validator defined by ``index``.
    ///
    /// Phase0 divides the reward among ``BASE_REWARDS_PER_EPOCH`` components, later forks scale
    /// a per-increment reward.
    pub fn get_base_reward(&self, index: u64, total_active_balance: u64) -> anyhow::Result<u64> {
        let effective_balance = self
            .validators()
            .get(index as usize)
            .ok_or_else(|| anyhow!("Validator {index} not found"))?
            .effective_balance;
        Ok(match self {
            BeaconState::Phase0(_) => {
                effective_balance * BASE_REWARD_FACTOR
                    / integer_squareroot(total_active_balance)
                    / BASE_REWARDS_PER_EPOCH
            }
            _ => {
                effective_balance / EFFECTIVE_BALANCE_INCREMENT
                    * self.get_base_reward_per_increment(total_active_balance)
            }
        })
    }

    pub fn get_finality_delay(&self) -> u64 {
        self.get_previous_epoch() - self.finalized_checkpoint().epoch
    }

    pub fn is_in_inactivity_leak(&self) -> bool {
        self.get_finality_delay() > MIN_EPOCHS_TO_INACTIVITY_PENALTY
    }

    pub fn get_eligible_validator_indices(&self) -> Vec<u64> {
        let previous_epoch = self.get_previous_epoch();
        self.validators()
            .iter()
            .enumerate()
            .filter(|(_, validator)| {
                validator.is_active_validator(previous_epoch)
                    || (validator.slashed && previous_epoch + 1 < validator.withdrawable_epoch)
            })
            .map(|(index, _)| index as u64)
            .collect()
    }

    /// Return the flag indices that are satisfied by an attestation.
    pub fn get_attestation_participation_flag_indices(
        &self,
        data: &AttestationData,
        inclusion_delay: u64,
    ) -> anyhow::Result<Vec<u8>> {
        let justified_checkpoint = if data.target.epoch == self.get_current_epoch() {
            self.current_justified_checkpoint()
        } else {
            self.previous_justified_checkpoint()
        };
        let is_matching_source = data.source == justified_checkpoint;
        ensure!(is_matching_source, "Attestation source does not match justified checkpoint");
        let is_matching_target = data.target.root == self.get_block_root(data.target.epoch)?;
        let is_matching_head =
            is_matching_target && data.beacon_block_root == self.get_block_root_at_slot(data.slot)?;

        let mut participation_flag_indices = vec![];
        if inclusion_delay <= integer_squareroot(SLOTS_PER_EPOCH) {
            participation_flag_indices.push(TIMELY_SOURCE_FLAG_INDEX);
        }
        if is_matching_target && inclusion_delay <= SLOTS_PER_EPOCH {
            participation_flag_indices.push(TIMELY_TARGET_FLAG_INDEX);
        }
        if is_matching_head && inclusion_delay == MIN_ATTESTATION_INCLUSION_DELAY {
            participation_flag_indices.push(TIMELY_HEAD_FLAG_INDEX);
        }

        Ok(participation_flag_indices)
    }

    /// Return the sync committee indices, with possible duplicates, for the next sync committee.
    pub fn get_next_sync_committee_indices(&self) -> anyhow::Result<Vec<u64>> {
        let epoch = self.get_current_epoch() + 1;
        let active_validator_indices = self.get_active_validator_indices(epoch);
        ensure!(
            !active_validator_indices.is_empty(),
            "No active validators to form a sync committee"
        );
        let active_validator_count = active_validator_indices.len();
        let seed = self.get_seed(epoch, DOMAIN_SYNC_COMMITTEE);
        let validators = self.validators();

        let mut i: usize = 0;
        let mut sync_committee_indices = Vec::with_capacity(SYNC_COMMITTEE_SIZE as usize);
        while sync_committee_indices.len() < SYNC_COMMITTEE_SIZE as usize {
            let shuffled_index =
                compute_shuffled_index(i % active_validator_count, active_validator_count, seed)?;
            let candidate_index = active_validator_indices[shuffled_index];
            let random_byte =
                hash(&[seed.as_slice(), &((i / 32) as u64).to_le_bytes()].concat())[i % 32];
            let effective_balance = validators[candidate_index as usize].effective_balance;
            if effective_balance * MAX_RANDOM_BYTE >= MAX_EFFECTIVE_BALANCE * random_byte as u64 {
                sync_committee_indices.push(candidate_index);
            }
            i += 1;
        }

        Ok(sync_committee_indices)
    }

    /// Return the next sync committee, with possible pubkey duplicates.
    pub fn get_next_sync_committee(&self) -> anyhow::Result<SyncCommittee> {
        let validators = self.validators();
        let pubkeys = self
            .get_next_sync_committee_indices()?
            .into_iter()
            .map(|index| validators[index as usize].pubkey.clone())
            .collect::<Vec<_>>();
        let aggregate_pubkey = eth_aggregate_pubkeys(&pubkeys.iter().collect::<Vec<_>>())?;
        Ok(SyncCommittee {
            pubkeys: pubkeys.into(),
            aggregate_pubkey,
        })
    }

    /// Wall-clock time of ``slot``, in seconds.
    pub fn compute_timestamp_at_slot(&self, slot: u64, spec: &BeaconNetworkSpec) -> u64 {
        self.genesis_time() + slot * spec.seconds_per_slot
    }
}
