use anyhow::{bail, ensure};
use ream_consensus_beacon::{
    beacon_block::ExecutionPayloadRef,
    beacon_state::BeaconState,
    execution_engine::{engine_trait::ExecutionApi, new_payload_request::NewPayloadRequest},
};
use ream_network_spec::networks::BeaconNetworkSpec;
use tracing::debug;

pub fn is_merge_transition_block(state: &BeaconState, payload: ExecutionPayloadRef<'_>) -> bool {
    !state.is_merge_transition_complete() && !payload.is_default()
}

pub fn is_execution_enabled(state: &BeaconState, payload: ExecutionPayloadRef<'_>) -> bool {
    // Capella assumes the merge has happened and always processes the payload
    state.fork_name().capella_enabled()
        || is_merge_transition_block(state, payload)
        || state.is_merge_transition_complete()
}

pub fn process_execution_payload(
    state: &mut BeaconState,
    payload: ExecutionPayloadRef<'_>,
    spec: &BeaconNetworkSpec,
    execution_engine: &impl ExecutionApi,
) -> anyhow::Result<()> {
    // Verify consistency of the parent hash with respect to the previous execution payload header
    if state.fork_name().capella_enabled() || state.is_merge_transition_complete() {
        ensure!(
            payload.parent_hash() == state.latest_execution_payload_block_hash()?,
            "Execution payload parent hash {} does not extend the latest payload",
            payload.parent_hash()
        );
    }

    // Verify prev_randao
    ensure!(
        payload.prev_randao() == state.get_randao_mix(state.get_current_epoch()),
        "Execution payload prev_randao does not match the current randao mix"
    );

    // Verify timestamp
    let expected_timestamp = state.compute_timestamp_at_slot(state.slot(), spec);
    ensure!(
        payload.timestamp() == expected_timestamp,
        "Execution payload timestamp {} does not match the slot time {expected_timestamp}",
        payload.timestamp()
    );

    // Verify the execution payload is valid
    let payload_status = execution_engine.notify_new_payload(NewPayloadRequest {
        execution_payload: payload,
    })?;
    ensure!(
        payload_status.is_valid(),
        "Execution engine returned {:?} for payload {} with latest valid hash {:?}",
        payload_status.status,
        payload.block_hash(),
        payload_status.latest_valid_hash
    );
    debug!(
        "Execution payload {} at block number {} accepted",
        payload.block_hash(),
        payload.block_number()
    );

    // Cache execution payload header
    match (state, payload) {
        (BeaconState::Bellatrix(state), ExecutionPayloadRef::Bellatrix(payload)) => {
            state.latest_execution_payload_header = payload.to_execution_payload_header();
        }
        (BeaconState::Capella(state), ExecutionPayloadRef::Capella(payload)) => {
            state.latest_execution_payload_header = payload.to_execution_payload_header();
        }
        (state, _) => bail!(
            "Execution payload does not belong to the {} beacon state",
            state.fork_name()
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use ream_consensus_beacon::{
        capella::execution_payload::ExecutionPayload,
        execution_engine::{
            mock_engine::MockExecutionEngine,
            payload_status::{ExecutionStatus, PayloadStatus},
        },
    };
    use ream_consensus_misc::fork_name::ForkName;
    use ream_network_spec::networks::DEV;

    use super::*;
    use crate::genesis::{interop_genesis_state, interop_secret_keys};

    /// Engine that rejects every payload and reports a fixed last valid ancestor.
    struct RejectingEngine {
        latest_valid_hash: Option<B256>,
    }

    impl ExecutionApi for RejectingEngine {
        fn notify_new_payload(
            &self,
            _new_payload_request: NewPayloadRequest<'_>,
        ) -> anyhow::Result<PayloadStatus> {
            Ok(PayloadStatus {
                status: ExecutionStatus::Invalid,
                latest_valid_hash: self.latest_valid_hash,
            })
        }
    }

    fn capella_state_and_payload() -> (BeaconState, ExecutionPayload) {
        let keys = interop_secret_keys(8).unwrap();
        let state = interop_genesis_state(&DEV, ForkName::Capella, &keys, 0).unwrap();
        let payload = ExecutionPayload {
            parent_hash: state.latest_execution_payload_block_hash().unwrap(),
            prev_randao: state.get_randao_mix(state.get_current_epoch()),
            timestamp: state.compute_timestamp_at_slot(state.slot(), &DEV),
            block_hash: B256::repeat_byte(9),
            ..Default::default()
        };
        (state, payload)
    }

    #[test]
    fn test_rejected_payload_reports_latest_valid_hash() {
        let (mut state, payload) = capella_state_and_payload();
        let engine = RejectingEngine {
            latest_valid_hash: Some(B256::repeat_byte(7)),
        };

        let err = process_execution_payload(
            &mut state,
            ExecutionPayloadRef::Capella(&payload),
            &DEV,
            &engine,
        )
        .unwrap_err()
        .to_string();

        assert!(err.contains("Invalid"));
        assert!(err.contains(&B256::repeat_byte(9).to_string()));
        assert!(err.contains(&B256::repeat_byte(7).to_string()));
    }

    #[test]
    fn test_accepted_payload_updates_header() {
        let (mut state, payload) = capella_state_and_payload();

        process_execution_payload(
            &mut state,
            ExecutionPayloadRef::Capella(&payload),
            &DEV,
            &MockExecutionEngine::default(),
        )
        .unwrap();

        assert_eq!(
            state.latest_execution_payload_block_hash().unwrap(),
            B256::repeat_byte(9)
        );
    }
}
