//! Beacon chain state transition: slot and epoch processing, block processing with deferred
//! signature verification, and fork upgrades.

pub mod cancellation;
pub mod errors;
pub mod genesis;
pub mod per_block_processing;
pub mod per_epoch_processing;
pub mod per_slot_processing;
pub mod signature_set;
pub mod transition;
pub mod upgrade;

pub use cancellation::Cancellation;
pub use errors::{BlockStage, StateTransitionError};
pub use per_block_processing::process_block;
pub use per_slot_processing::{process_slot, process_slots};
pub use signature_set::{SignatureSet, SignatureSetEntry};
pub use transition::{
    calculate_state_root, execute_state_transition, execute_state_transition_no_verify_any_sig,
    verify_signature_set,
};
pub use upgrade::upgrade_state;
