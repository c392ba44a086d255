mod common;

use alloy_primitives::B256;
use common::Harness;
use ream_consensus_beacon::beacon_state::BeaconState;
use ream_consensus_misc::{constants::SLOTS_PER_EPOCH, fork_name::ForkName};
use rstest::rstest;

#[rstest]
#[case(ForkName::Phase0)]
#[case(ForkName::Altair)]
fn test_full_participation_justifies_previous_and_current_epoch(#[case] fork: ForkName) {
    let harness = Harness::new(100);
    let genesis = harness.genesis(fork);

    let state = harness.extend_chain(genesis, 3 * SLOTS_PER_EPOCH - 1, true);
    assert_eq!(state.current_justified_checkpoint().epoch, 0);

    let state = harness.advance(&state, 3 * SLOTS_PER_EPOCH);

    let current_justified = state.current_justified_checkpoint();
    assert_eq!(current_justified.epoch, 2);
    assert_eq!(current_justified.root, state.get_block_root(2).unwrap());
    assert_eq!(state.previous_justified_checkpoint().epoch, 0);
    assert_eq!(state.finalized_checkpoint().epoch, 0);
    assert_eq!(
        state.justification_bits().iter().collect::<Vec<_>>(),
        vec![true, true, false, false]
    );
    assert!(state.validators().iter().all(|validator| !validator.slashed));
    assert_eq!(state.fork_name(), fork);
}

#[test]
fn test_chain_without_attestations_never_justifies() {
    let harness = Harness::new(32);
    let genesis = harness.genesis(ForkName::Altair);

    let state = harness.extend_chain(genesis, 2 * SLOTS_PER_EPOCH, false);
    let state = harness.advance(&state, 3 * SLOTS_PER_EPOCH);

    assert_eq!(state.current_justified_checkpoint().epoch, 0);
    assert!(state.justification_bits().iter().all(|bit| !bit));
    // Missed source and target duties are penalised every epoch
    assert!(
        state
            .balances()
            .iter()
            .all(|&balance| balance < 32_000_000_000)
    );
}

#[test]
fn test_capella_chain_processes_payloads() {
    let harness = Harness::new(32);
    let genesis = harness.genesis(ForkName::Capella);

    let state = harness.extend_chain(genesis, SLOTS_PER_EPOCH + 2, true);

    assert_eq!(state.slot(), SLOTS_PER_EPOCH + 2);
    let BeaconState::Capella(capella_state) = &state else {
        panic!("expected a capella state, got {}", state.fork_name());
    };
    let header = &capella_state.latest_execution_payload_header;
    assert_eq!(header.block_number, SLOTS_PER_EPOCH + 2);
    assert_eq!(
        header.timestamp,
        state.compute_timestamp_at_slot(state.slot(), &harness.spec)
    );
    assert_eq!(
        header.block_hash,
        B256::left_padding_from(&state.slot().to_be_bytes())
    );
    assert!(state.is_merge_transition_complete());
}
