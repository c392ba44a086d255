use ream_consensus_misc::fork_name::ForkName;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BeaconStateError {
    #[error("{field} is not part of the {fork} beacon state")]
    UnsupportedField { field: &'static str, fork: ForkName },
    #[error("Failed to decode {fork} beacon state: {reason}")]
    Decode { fork: ForkName, reason: String },
    #[error("Failed to decode {fork} beacon block: {reason}")]
    BlockDecode { fork: ForkName, reason: String },
}
