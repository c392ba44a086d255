use alloy_primitives::B256;
use ream_bls::BLSSignature;
use ream_consensus_misc::{
    beacon_block_header::SignedBeaconBlockHeader, eth_1_data::Eth1Data, fork_name::ForkName,
    misc::compute_epoch_at_slot,
};
use ream_network_spec::networks::BeaconNetworkSpec;
use serde::Serialize;
use ssz::{Decode, DecodeError, Encode};

use crate::{
    altair, attestation::Attestation, attester_slashing::AttesterSlashing, bellatrix,
    bls_to_execution_change::SignedBLSToExecutionChange, capella, deposit::Deposit,
    error::BeaconStateError, phase0, proposer_slashing::ProposerSlashing,
    sync_aggregate::SyncAggregate, voluntary_exit::SignedVoluntaryExit, withdrawal::Withdrawal,
};

/// Offset of ``message.slot`` in an encoded signed block: one message offset then the signature.
const SIGNED_BLOCK_SLOT_OFFSET: usize = 4 + 96;

macro_rules! map_block {
    ($block:expr, $inner:ident => $body:expr) => {
        match $block {
            SignedBeaconBlock::Phase0($inner) => $body,
            SignedBeaconBlock::Altair($inner) => $body,
            SignedBeaconBlock::Bellatrix($inner) => $body,
            SignedBeaconBlock::Capella($inner) => $body,
        }
    };
}

/// A signed beacon block of any supported fork.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(untagged)]
pub enum SignedBeaconBlock {
    Phase0(phase0::beacon_block::SignedBeaconBlock),
    Altair(altair::beacon_block::SignedBeaconBlock),
    Bellatrix(bellatrix::beacon_block::SignedBeaconBlock),
    Capella(capella::beacon_block::SignedBeaconBlock),
}

impl SignedBeaconBlock {
    pub fn fork_name(&self) -> ForkName {
        match self {
            SignedBeaconBlock::Phase0(_) => ForkName::Phase0,
            SignedBeaconBlock::Altair(_) => ForkName::Altair,
            SignedBeaconBlock::Bellatrix(_) => ForkName::Bellatrix,
            SignedBeaconBlock::Capella(_) => ForkName::Capella,
        }
    }

    pub fn slot(&self) -> u64 {
        map_block!(self, block => block.message.slot)
    }

    pub fn proposer_index(&self) -> u64 {
        map_block!(self, block => block.message.proposer_index)
    }

    pub fn parent_root(&self) -> B256 {
        map_block!(self, block => block.message.parent_root)
    }

    pub fn state_root(&self) -> B256 {
        map_block!(self, block => block.message.state_root)
    }

    pub fn signature(&self) -> &BLSSignature {
        map_block!(self, block => &block.signature)
    }

    /// Hash tree root of the unsigned message.
    pub fn block_root(&self) -> B256 {
        map_block!(self, block => block.message.block_root())
    }

    pub fn signed_header(&self) -> SignedBeaconBlockHeader {
        map_block!(self, block => block.signed_header())
    }

    pub fn body(&self) -> BeaconBlockBodyRef<'_> {
        match self {
            SignedBeaconBlock::Phase0(block) => BeaconBlockBodyRef::Phase0(&block.message.body),
            SignedBeaconBlock::Altair(block) => BeaconBlockBodyRef::Altair(&block.message.body),
            SignedBeaconBlock::Bellatrix(block) => {
                BeaconBlockBodyRef::Bellatrix(&block.message.body)
            }
            SignedBeaconBlock::Capella(block) => BeaconBlockBodyRef::Capella(&block.message.body),
        }
    }

    pub fn set_state_root(&mut self, state_root: B256) {
        map_block!(self, block => block.message.state_root = state_root)
    }

    pub fn set_signature(&mut self, signature: BLSSignature) {
        map_block!(self, block => block.signature = signature)
    }

    pub fn from_ssz_bytes_for_fork(bytes: &[u8], fork: ForkName) -> Result<Self, BeaconStateError> {
        let decode_error = |err: DecodeError| BeaconStateError::BlockDecode {
            fork,
            reason: format!("{err:?}"),
        };
        Ok(match fork {
            ForkName::Phase0 => SignedBeaconBlock::Phase0(
                phase0::beacon_block::SignedBeaconBlock::from_ssz_bytes(bytes)
                    .map_err(decode_error)?,
            ),
            ForkName::Altair => SignedBeaconBlock::Altair(
                altair::beacon_block::SignedBeaconBlock::from_ssz_bytes(bytes)
                    .map_err(decode_error)?,
            ),
            ForkName::Bellatrix => SignedBeaconBlock::Bellatrix(
                bellatrix::beacon_block::SignedBeaconBlock::from_ssz_bytes(bytes)
                    .map_err(decode_error)?,
            ),
            ForkName::Capella => SignedBeaconBlock::Capella(
                capella::beacon_block::SignedBeaconBlock::from_ssz_bytes(bytes)
                    .map_err(decode_error)?,
            ),
        })
    }

    /// Decode a block, picking the fork the network schedules at the block's slot.
    pub fn from_ssz_bytes_with_spec(
        bytes: &[u8],
        spec: &BeaconNetworkSpec,
    ) -> Result<Self, BeaconStateError> {
        let slot = read_slot(bytes, SIGNED_BLOCK_SLOT_OFFSET).ok_or_else(|| {
            BeaconStateError::BlockDecode {
                fork: ForkName::Phase0,
                reason: format!("block is too short to hold a slot: {} bytes", bytes.len()),
            }
        })?;
        let fork = spec.fork_at_epoch(compute_epoch_at_slot(slot));
        Self::from_ssz_bytes_for_fork(bytes, fork)
    }
}

pub(crate) fn read_slot(bytes: &[u8], offset: usize) -> Option<u64> {
    let slot_bytes = bytes.get(offset..offset + 8)?;
    Some(u64::from_le_bytes(slot_bytes.try_into().ok()?))
}

impl Encode for SignedBeaconBlock {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        map_block!(self, block => block.ssz_append(buf))
    }

    fn ssz_bytes_len(&self) -> usize {
        map_block!(self, block => block.ssz_bytes_len())
    }
}

impl From<phase0::beacon_block::SignedBeaconBlock> for SignedBeaconBlock {
    fn from(block: phase0::beacon_block::SignedBeaconBlock) -> Self {
        SignedBeaconBlock::Phase0(block)
    }
}

impl From<altair::beacon_block::SignedBeaconBlock> for SignedBeaconBlock {
    fn from(block: altair::beacon_block::SignedBeaconBlock) -> Self {
        SignedBeaconBlock::Altair(block)
    }
}

impl From<bellatrix::beacon_block::SignedBeaconBlock> for SignedBeaconBlock {
    fn from(block: bellatrix::beacon_block::SignedBeaconBlock) -> Self {
        SignedBeaconBlock::Bellatrix(block)
    }
}

impl From<capella::beacon_block::SignedBeaconBlock> for SignedBeaconBlock {
    fn from(block: capella::beacon_block::SignedBeaconBlock) -> Self {
        SignedBeaconBlock::Capella(block)
    }
}

macro_rules! map_body {
    ($body:expr, $inner:ident => $value:expr) => {
        match $body {
            BeaconBlockBodyRef::Phase0($inner) => $value,
            BeaconBlockBodyRef::Altair($inner) => $value,
            BeaconBlockBodyRef::Bellatrix($inner) => $value,
            BeaconBlockBodyRef::Capella($inner) => $value,
        }
    };
}

/// Borrowed view over a block body of any fork.
#[derive(Debug, Clone, Copy)]
pub enum BeaconBlockBodyRef<'a> {
    Phase0(&'a phase0::beacon_block_body::BeaconBlockBody),
    Altair(&'a altair::beacon_block_body::BeaconBlockBody),
    Bellatrix(&'a bellatrix::beacon_block_body::BeaconBlockBody),
    Capella(&'a capella::beacon_block_body::BeaconBlockBody),
}

impl<'a> BeaconBlockBodyRef<'a> {
    pub fn randao_reveal(self) -> &'a BLSSignature {
        map_body!(self, body => &body.randao_reveal)
    }

    pub fn eth1_data(self) -> &'a Eth1Data {
        map_body!(self, body => &body.eth1_data)
    }

    pub fn graffiti(self) -> B256 {
        map_body!(self, body => body.graffiti)
    }

    pub fn proposer_slashings(self) -> &'a [ProposerSlashing] {
        map_body!(self, body => &body.proposer_slashings[..])
    }

    pub fn attester_slashings(self) -> &'a [AttesterSlashing] {
        map_body!(self, body => &body.attester_slashings[..])
    }

    pub fn attestations(self) -> &'a [Attestation] {
        map_body!(self, body => &body.attestations[..])
    }

    pub fn deposits(self) -> &'a [Deposit] {
        map_body!(self, body => &body.deposits[..])
    }

    pub fn voluntary_exits(self) -> &'a [SignedVoluntaryExit] {
        map_body!(self, body => &body.voluntary_exits[..])
    }

    pub fn sync_aggregate(self) -> Option<&'a SyncAggregate> {
        match self {
            BeaconBlockBodyRef::Phase0(_) => None,
            BeaconBlockBodyRef::Altair(body) => Some(&body.sync_aggregate),
            BeaconBlockBodyRef::Bellatrix(body) => Some(&body.sync_aggregate),
            BeaconBlockBodyRef::Capella(body) => Some(&body.sync_aggregate),
        }
    }

    pub fn execution_payload(self) -> Option<ExecutionPayloadRef<'a>> {
        match self {
            BeaconBlockBodyRef::Phase0(_) | BeaconBlockBodyRef::Altair(_) => None,
            BeaconBlockBodyRef::Bellatrix(body) => {
                Some(ExecutionPayloadRef::Bellatrix(&body.execution_payload))
            }
            BeaconBlockBodyRef::Capella(body) => {
                Some(ExecutionPayloadRef::Capella(&body.execution_payload))
            }
        }
    }

    /// Empty before Capella.
    pub fn bls_to_execution_changes(self) -> &'a [SignedBLSToExecutionChange] {
        match self {
            BeaconBlockBodyRef::Capella(body) => &body.bls_to_execution_changes[..],
            _ => &[],
        }
    }
}

/// Borrowed execution payload of a post-merge block.
#[derive(Debug, Clone, Copy)]
pub enum ExecutionPayloadRef<'a> {
    Bellatrix(&'a bellatrix::execution_payload::ExecutionPayload),
    Capella(&'a capella::execution_payload::ExecutionPayload),
}

macro_rules! map_payload {
    ($payload:expr, $inner:ident => $value:expr) => {
        match $payload {
            ExecutionPayloadRef::Bellatrix($inner) => $value,
            ExecutionPayloadRef::Capella($inner) => $value,
        }
    };
}

impl<'a> ExecutionPayloadRef<'a> {
    pub fn parent_hash(self) -> B256 {
        map_payload!(self, payload => payload.parent_hash)
    }

    pub fn prev_randao(self) -> B256 {
        map_payload!(self, payload => payload.prev_randao)
    }

    pub fn block_number(self) -> u64 {
        map_payload!(self, payload => payload.block_number)
    }

    pub fn timestamp(self) -> u64 {
        map_payload!(self, payload => payload.timestamp)
    }

    pub fn block_hash(self) -> B256 {
        map_payload!(self, payload => payload.block_hash)
    }

    /// Empty before Capella.
    pub fn withdrawals(self) -> &'a [Withdrawal] {
        match self {
            ExecutionPayloadRef::Bellatrix(_) => &[],
            ExecutionPayloadRef::Capella(payload) => &payload.withdrawals[..],
        }
    }

    /// A pre-merge block carries an all-zero payload.
    pub fn is_default(self) -> bool {
        match self {
            ExecutionPayloadRef::Bellatrix(payload) => {
                *payload == bellatrix::execution_payload::ExecutionPayload::default()
            }
            ExecutionPayloadRef::Capella(payload) => {
                *payload == capella::execution_payload::ExecutionPayload::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ream_network_spec::networks::DEV;

    use super::*;

    fn altair_block(slot: u64) -> SignedBeaconBlock {
        SignedBeaconBlock::Altair(altair::beacon_block::SignedBeaconBlock {
            message: altair::beacon_block::BeaconBlock {
                slot,
                proposer_index: 3,
                ..Default::default()
            },
            signature: BLSSignature::infinity(),
        })
    }

    #[test]
    fn test_ssz_roundtrip_for_fork() {
        let block = altair_block(42);
        let bytes = block.as_ssz_bytes();
        let decoded = SignedBeaconBlock::from_ssz_bytes_for_fork(&bytes, ForkName::Altair).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.slot(), 42);
        assert_eq!(decoded.proposer_index(), 3);
    }

    #[test]
    fn test_decode_picks_fork_from_slot() {
        let spec = DEV.with_fork_epochs(1, u64::MAX, u64::MAX);
        let block = altair_block(40);
        let decoded =
            SignedBeaconBlock::from_ssz_bytes_with_spec(&block.as_ssz_bytes(), &spec).unwrap();
        assert_eq!(decoded.fork_name(), ForkName::Altair);
    }

    #[test]
    fn test_decode_wrong_fork_fails() {
        let bytes = altair_block(1).as_ssz_bytes();
        assert!(matches!(
            SignedBeaconBlock::from_ssz_bytes_for_fork(&bytes, ForkName::Capella),
            Err(BeaconStateError::BlockDecode { .. })
        ));
    }

    #[test]
    fn test_body_view_gates_fields() {
        let block = altair_block(1);
        assert!(block.body().sync_aggregate().is_some());
        assert!(block.body().execution_payload().is_none());
        assert!(block.body().bls_to_execution_changes().is_empty());
    }
}
