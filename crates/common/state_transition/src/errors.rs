use std::fmt;

use alloy_primitives::B256;
use ream_bls::BLSError;
use ream_consensus_beacon::error::BeaconStateError;
use ream_consensus_misc::fork_name::ForkName;
use thiserror::Error;

/// The block processing step a structural failure was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStage {
    BlockHeader,
    Withdrawals,
    ExecutionPayload,
    Randao,
    Eth1Data,
    Operations,
    ProposerSlashing,
    AttesterSlashing,
    Attestation,
    Deposit,
    VoluntaryExit,
    BlsToExecutionChange,
    SyncAggregate,
}

impl fmt::Display for BlockStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockStage::BlockHeader => "block header",
            BlockStage::Withdrawals => "withdrawals",
            BlockStage::ExecutionPayload => "execution payload",
            BlockStage::Randao => "randao",
            BlockStage::Eth1Data => "eth1 data",
            BlockStage::Operations => "operations",
            BlockStage::ProposerSlashing => "proposer slashing",
            BlockStage::AttesterSlashing => "attester slashing",
            BlockStage::Attestation => "attestation",
            BlockStage::Deposit => "deposit",
            BlockStage::VoluntaryExit => "voluntary exit",
            BlockStage::BlsToExecutionChange => "bls to execution change",
            BlockStage::SyncAggregate => "sync aggregate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("state and block are different version. {state} != {block}")]
    VersionMismatch { state: ForkName, block: ForkName },

    #[error("could not process {stage}{}: {reason}", index_suffix(.index))]
    StructuralInvalid {
        stage: BlockStage,
        index: Option<usize>,
        reason: String,
    },

    #[error("could not verify {description}")]
    SignatureInvalid { description: String },

    #[error("could not validate state root, wanted: {expected}, received: {computed}")]
    StateRootMismatch { expected: B256, computed: B256 },

    #[error(transparent)]
    UnsupportedField(#[from] BeaconStateError),

    #[error("expected state.slot {current} <= slot {target}")]
    SlotRegression { current: u64, target: u64 },

    #[error("state transition cancelled at slot {slot}")]
    Cancelled { slot: u64 },

    #[error("could not process slot {slot}: {reason}")]
    SlotProcessing { slot: u64, reason: String },

    #[error(transparent)]
    Bls(#[from] BLSError),
}

impl StateTransitionError {
    pub(crate) fn structural(stage: BlockStage, index: Option<usize>, err: anyhow::Error) -> Self {
        if let Some(state_err) = err.downcast_ref::<BeaconStateError>() {
            return StateTransitionError::UnsupportedField(state_err.clone());
        }
        StateTransitionError::StructuralInvalid {
            stage,
            index,
            reason: format!("{err:#}"),
        }
    }

    pub(crate) fn slot_processing(slot: u64, err: anyhow::Error) -> Self {
        if let Some(state_err) = err.downcast_ref::<BeaconStateError>() {
            return StateTransitionError::UnsupportedField(state_err.clone());
        }
        StateTransitionError::SlotProcessing {
            slot,
            reason: format!("{err:#}"),
        }
    }
}

fn index_suffix(index: &Option<usize>) -> String {
    index.map(|index| format!(" {index}")).unwrap_or_default()
}

/// Attach the failing block stage to an internal error.
pub(crate) trait StageContext<T> {
    fn at_stage(self, stage: BlockStage) -> Result<T, StateTransitionError>;

    fn at_index(self, stage: BlockStage, index: usize) -> Result<T, StateTransitionError>;
}

impl<T> StageContext<T> for anyhow::Result<T> {
    fn at_stage(self, stage: BlockStage) -> Result<T, StateTransitionError> {
        self.map_err(|err| StateTransitionError::structural(stage, None, err))
    }

    fn at_index(self, stage: BlockStage, index: usize) -> Result<T, StateTransitionError> {
        self.map_err(|err| StateTransitionError::structural(stage, Some(index), err))
    }
}
