#![allow(dead_code)]

use std::sync::Arc;

use alloy_primitives::B256;
use ream_bls::{
    BLSSignature, PrivateKey,
    traits::{Aggregatable, Signable},
};
use ream_consensus_beacon::{
    altair, attestation::Attestation, beacon_block::SignedBeaconBlock, beacon_state::BeaconState,
    bellatrix, capella, deposit::Deposit, execution_engine::mock_engine::MockExecutionEngine,
    phase0,
    voluntary_exit::{SignedVoluntaryExit, VoluntaryExit},
};
use ream_consensus_misc::{
    attestation_data::AttestationData,
    checkpoint::Checkpoint,
    constants::{
        DOMAIN_BEACON_ATTESTER, DOMAIN_BEACON_PROPOSER, DOMAIN_RANDAO, DOMAIN_VOLUNTARY_EXIT,
    },
    eth_1_data::Eth1Data,
    fork_name::ForkName,
    misc::{compute_epoch_at_slot, compute_signing_root},
};
use ream_network_spec::networks::{BeaconNetworkSpec, DEV};
use ream_state_transition::{
    Cancellation, calculate_state_root, execute_state_transition,
    genesis::{interop_genesis_state, interop_secret_keys},
    per_block_processing::withdrawals::get_expected_withdrawals,
    process_slots,
};
use ssz_types::BitList;
use tree_hash::TreeHash;

pub const GENESIS_TIME: u64 = 1_606_824_023;

#[derive(Default)]
pub struct BlockContents {
    pub attestations: Vec<Attestation>,
    pub deposits: Vec<Deposit>,
    pub voluntary_exits: Vec<SignedVoluntaryExit>,
    pub eth1_data: Option<Eth1Data>,
}

/// Interop keys plus the helpers needed to produce valid signed blocks on top of a state.
pub struct Harness {
    pub spec: Arc<BeaconNetworkSpec>,
    pub keys: Vec<PrivateKey>,
    pub engine: MockExecutionEngine,
}

impl Harness {
    pub fn new(validator_count: usize) -> Self {
        Self {
            spec: DEV.clone(),
            keys: interop_secret_keys(validator_count).unwrap(),
            engine: MockExecutionEngine::default(),
        }
    }

    pub fn genesis(&self, fork: ForkName) -> BeaconState {
        interop_genesis_state(&self.spec, fork, &self.keys, GENESIS_TIME).unwrap()
    }

    /// A copy of ``state`` advanced through empty slots to ``slot``.
    pub fn advance(&self, state: &BeaconState, slot: u64) -> BeaconState {
        let mut state = state.clone();
        process_slots(&mut state, slot, &self.spec, Cancellation::never()).unwrap();
        state
    }

    /// Fully signed attestations from every committee of ``slot``, built against ``state``
    /// which must already be past ``slot``.
    pub fn attestations_for_slot(&self, state: &BeaconState, slot: u64) -> Vec<Attestation> {
        let epoch = compute_epoch_at_slot(slot);
        let source = if epoch == state.get_current_epoch() {
            state.current_justified_checkpoint()
        } else {
            state.previous_justified_checkpoint()
        };
        let target = Checkpoint {
            epoch,
            root: state.get_block_root(epoch).unwrap(),
        };
        let domain = state.get_domain(DOMAIN_BEACON_ATTESTER, Some(epoch));

        (0..state.get_committee_count_per_slot(epoch))
            .map(|index| {
                let committee = state.get_beacon_committee(slot, index).unwrap();
                let data = AttestationData {
                    slot,
                    index,
                    beacon_block_root: state.get_block_root_at_slot(slot).unwrap(),
                    source,
                    target,
                };
                let signing_root = compute_signing_root(&data, domain);
                let signatures = committee
                    .iter()
                    .map(|&member| {
                        self.keys[member as usize]
                            .sign(signing_root.as_slice())
                            .unwrap()
                    })
                    .collect::<Vec<_>>();
                let signature =
                    BLSSignature::aggregate(&signatures.iter().collect::<Vec<_>>()).unwrap();
                let mut aggregation_bits = BitList::with_capacity(committee.len()).unwrap();
                for position in 0..committee.len() {
                    aggregation_bits.set(position, true).unwrap();
                }
                Attestation {
                    aggregation_bits,
                    data,
                    signature,
                }
            })
            .collect()
    }

    /// An exit for ``validator_index`` valid from the current epoch of ``state``.
    pub fn voluntary_exit(
        &self,
        state: &BeaconState,
        validator_index: u64,
    ) -> SignedVoluntaryExit {
        let message = VoluntaryExit {
            epoch: state.get_current_epoch(),
            validator_index,
        };
        let domain = state.get_domain(DOMAIN_VOLUNTARY_EXIT, Some(message.epoch));
        let signature = self.keys[validator_index as usize]
            .sign(compute_signing_root(&message, domain).as_slice())
            .unwrap();
        SignedVoluntaryExit { message, signature }
    }

    /// A block for ``slot`` on top of ``state`` with the correct state root, not yet signed.
    pub fn unsigned_block(
        &self,
        state: &BeaconState,
        slot: u64,
        contents: BlockContents,
    ) -> SignedBeaconBlock {
        let advanced = self.advance(state, slot);
        let proposer_index = advanced.get_beacon_proposer_index().unwrap();
        let epoch = advanced.get_current_epoch();
        let randao_reveal = self.keys[proposer_index as usize]
            .sign(
                compute_signing_root(&epoch, advanced.get_domain(DOMAIN_RANDAO, None))
                    .as_slice(),
            )
            .unwrap();
        let parent_root = advanced.latest_block_header().tree_hash_root();
        let eth1_data = contents
            .eth1_data
            .unwrap_or_else(|| advanced.eth1_data().clone());

        let mut block = match advanced.fork_name() {
            ForkName::Phase0 => SignedBeaconBlock::from(phase0::beacon_block::SignedBeaconBlock {
                message: phase0::beacon_block::BeaconBlock {
                    slot,
                    proposer_index,
                    parent_root,
                    state_root: B256::ZERO,
                    body: phase0::beacon_block_body::BeaconBlockBody {
                        randao_reveal,
                        eth1_data,
                        attestations: contents.attestations.into(),
                        deposits: contents.deposits.into(),
                        voluntary_exits: contents.voluntary_exits.into(),
                        ..Default::default()
                    },
                },
                signature: BLSSignature::infinity(),
            }),
            ForkName::Altair => SignedBeaconBlock::from(altair::beacon_block::SignedBeaconBlock {
                message: altair::beacon_block::BeaconBlock {
                    slot,
                    proposer_index,
                    parent_root,
                    state_root: B256::ZERO,
                    body: altair::beacon_block_body::BeaconBlockBody {
                        randao_reveal,
                        eth1_data,
                        attestations: contents.attestations.into(),
                        deposits: contents.deposits.into(),
                        voluntary_exits: contents.voluntary_exits.into(),
                        ..Default::default()
                    },
                },
                signature: BLSSignature::infinity(),
            }),
            ForkName::Bellatrix => {
                SignedBeaconBlock::from(bellatrix::beacon_block::SignedBeaconBlock {
                    message: bellatrix::beacon_block::BeaconBlock {
                        slot,
                        proposer_index,
                        parent_root,
                        state_root: B256::ZERO,
                        body: bellatrix::beacon_block_body::BeaconBlockBody {
                            randao_reveal,
                            eth1_data,
                            attestations: contents.attestations.into(),
                            deposits: contents.deposits.into(),
                            voluntary_exits: contents.voluntary_exits.into(),
                            ..Default::default()
                        },
                    },
                    signature: BLSSignature::infinity(),
                })
            }
            ForkName::Capella => {
                let execution_payload = capella::execution_payload::ExecutionPayload {
                    parent_hash: advanced.latest_execution_payload_block_hash().unwrap(),
                    prev_randao: advanced.get_randao_mix(epoch),
                    block_number: slot,
                    timestamp: advanced.compute_timestamp_at_slot(slot, &self.spec),
                    block_hash: B256::left_padding_from(&slot.to_be_bytes()),
                    withdrawals: get_expected_withdrawals(&advanced).unwrap().into(),
                    ..Default::default()
                };
                SignedBeaconBlock::from(capella::beacon_block::SignedBeaconBlock {
                    message: capella::beacon_block::BeaconBlock {
                        slot,
                        proposer_index,
                        parent_root,
                        state_root: B256::ZERO,
                        body: capella::beacon_block_body::BeaconBlockBody {
                            randao_reveal,
                            eth1_data,
                            attestations: contents.attestations.into(),
                            deposits: contents.deposits.into(),
                            voluntary_exits: contents.voluntary_exits.into(),
                            execution_payload,
                            ..Default::default()
                        },
                    },
                    signature: BLSSignature::infinity(),
                })
            }
        };

        let state_root = calculate_state_root(state, &block, &self.spec, &self.engine).unwrap();
        block.set_state_root(state_root);
        block
    }

    /// Sign ``block`` with its proposer's key, using the fork of ``state``.
    pub fn sign_block(&self, state: &BeaconState, block: &mut SignedBeaconBlock) {
        let advanced = self.advance(state, block.slot());
        let domain = advanced.get_domain(DOMAIN_BEACON_PROPOSER, None);
        let signature = self.keys[block.proposer_index() as usize]
            .sign(compute_signing_root(&block.block_root(), domain).as_slice())
            .unwrap();
        block.set_signature(signature);
    }

    pub fn build_block(
        &self,
        state: &BeaconState,
        slot: u64,
        contents: BlockContents,
    ) -> SignedBeaconBlock {
        let mut block = self.unsigned_block(state, slot, contents);
        self.sign_block(state, &mut block);
        block
    }

    /// Apply a block at every slot up to ``until_slot``. Each block carries attestations from
    /// every committee of the previous slot when ``attest`` is set.
    pub fn extend_chain(
        &self,
        mut state: BeaconState,
        until_slot: u64,
        attest: bool,
    ) -> BeaconState {
        for slot in state.slot() + 1..=until_slot {
            let attestations = if attest {
                self.attestations_for_slot(&self.advance(&state, slot), slot - 1)
            } else {
                vec![]
            };
            let block = self.build_block(
                &state,
                slot,
                BlockContents {
                    attestations,
                    ..Default::default()
                },
            );
            state = execute_state_transition(state, &block, &self.spec, &self.engine).unwrap();
        }
        state
    }
}
