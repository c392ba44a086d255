pub mod attestation;
pub mod attester_slashing;
pub mod block_header;
pub mod bls_to_execution_change;
pub mod deposit;
pub mod eth1_data;
pub mod execution_payload;
pub mod operations;
pub mod proposer_slashing;
pub mod randao;
pub mod sync_aggregate;
pub mod voluntary_exit;
pub mod withdrawals;

use ream_consensus_beacon::{
    beacon_block::SignedBeaconBlock, beacon_state::BeaconState,
    execution_engine::engine_trait::ExecutionApi,
};
use ream_network_spec::networks::BeaconNetworkSpec;

use self::{
    block_header::process_block_header,
    eth1_data::process_eth1_data,
    execution_payload::{is_execution_enabled, process_execution_payload},
    operations::process_operations,
    randao::process_randao,
    sync_aggregate::process_sync_aggregate,
    withdrawals::process_withdrawals,
};
use crate::{
    errors::{BlockStage, StageContext, StateTransitionError},
    signature_set::SignatureSet,
};

/// Apply ``signed_block`` to ``state`` without checking any signature.
///
/// Every signature the block carries is returned in the [`SignatureSet`] for the caller to batch
/// verify. On error the state is left partially updated and must be discarded.
pub fn process_block(
    state: &mut BeaconState,
    signed_block: &SignedBeaconBlock,
    spec: &BeaconNetworkSpec,
    execution_engine: &impl ExecutionApi,
) -> Result<SignatureSet, StateTransitionError> {
    if state.fork_name() != signed_block.fork_name() {
        return Err(StateTransitionError::VersionMismatch {
            state: state.fork_name(),
            block: signed_block.fork_name(),
        });
    }

    let mut signature_set = SignatureSet::new();
    let body = signed_block.body();

    process_block_header(state, signed_block, &mut signature_set)
        .at_stage(BlockStage::BlockHeader)?;

    if let Some(payload) = body.execution_payload() {
        if state.fork_name().capella_enabled() {
            process_withdrawals(state, payload).at_stage(BlockStage::Withdrawals)?;
        }
        if is_execution_enabled(state, payload) {
            process_execution_payload(state, payload, spec, execution_engine)
                .at_stage(BlockStage::ExecutionPayload)?;
        }
    }

    process_randao(state, body, &mut signature_set).at_stage(BlockStage::Randao)?;
    process_eth1_data(state, body.eth1_data()).at_stage(BlockStage::Eth1Data)?;
    process_operations(state, body, spec, &mut signature_set)?;

    if let Some(sync_aggregate) = body.sync_aggregate() {
        process_sync_aggregate(state, sync_aggregate, &mut signature_set)
            .at_stage(BlockStage::SyncAggregate)?;
    }

    Ok(signature_set)
}
