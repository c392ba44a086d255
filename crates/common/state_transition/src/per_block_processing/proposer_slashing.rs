use anyhow::{anyhow, ensure};
use ream_consensus_beacon::{beacon_state::BeaconState, proposer_slashing::ProposerSlashing};
use ream_consensus_misc::{
    constants::DOMAIN_BEACON_PROPOSER,
    misc::{compute_epoch_at_slot, compute_signing_root},
};
use ream_network_spec::networks::BeaconNetworkSpec;

use crate::signature_set::SignatureSet;

pub fn process_proposer_slashing(
    state: &mut BeaconState,
    proposer_slashing: &ProposerSlashing,
    spec: &BeaconNetworkSpec,
    signature_set: &mut SignatureSet,
) -> anyhow::Result<()> {
    let header_1 = &proposer_slashing.signed_header_1.message;
    let header_2 = &proposer_slashing.signed_header_2.message;

    // Verify header slots match
    ensure!(
        header_1.slot == header_2.slot,
        "Proposer slashing headers are for different slots"
    );
    // Verify header proposer indices match
    ensure!(
        header_1.proposer_index == header_2.proposer_index,
        "Proposer slashing headers are from different proposers"
    );
    // Verify the headers are different
    ensure!(header_1 != header_2, "Proposer slashing headers are identical");

    // Verify the proposer is slashable
    let proposer = state
        .validators()
        .get(header_1.proposer_index as usize)
        .ok_or_else(|| anyhow!("Proposer {} not found", header_1.proposer_index))?;
    ensure!(
        proposer.is_slashable_validator(state.get_current_epoch()),
        "Proposer {} is not slashable",
        header_1.proposer_index
    );

    // Verify signatures
    for signed_header in [
        &proposer_slashing.signed_header_1,
        &proposer_slashing.signed_header_2,
    ] {
        let domain = state.get_domain(
            DOMAIN_BEACON_PROPOSER,
            Some(compute_epoch_at_slot(signed_header.message.slot)),
        );
        signature_set.add(
            proposer.pubkey.clone(),
            compute_signing_root(&signed_header.message, domain),
            signed_header.signature.clone(),
            "proposer slashing signature",
        );
    }

    state.slash_validator(header_1.proposer_index, None, spec)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use ream_bls::{PrivateKey, traits::Signable};
    use ream_consensus_misc::{
        beacon_block_header::{BeaconBlockHeader, SignedBeaconBlockHeader},
        fork_name::ForkName,
    };
    use ream_network_spec::networks::DEV;
    use rstest::rstest;

    use super::*;
    use crate::genesis::{interop_genesis_state, interop_secret_keys};

    fn signed_header(
        state: &BeaconState,
        key: &PrivateKey,
        proposer_index: u64,
        body_root: B256,
    ) -> SignedBeaconBlockHeader {
        let message = BeaconBlockHeader {
            slot: 0,
            proposer_index,
            body_root,
            ..Default::default()
        };
        let domain = state.get_domain(DOMAIN_BEACON_PROPOSER, Some(0));
        let signature = key
            .sign(compute_signing_root(&message, domain).as_slice())
            .unwrap();
        SignedBeaconBlockHeader { message, signature }
    }

    #[rstest]
    #[case(ForkName::Phase0)]
    #[case(ForkName::Altair)]
    #[case(ForkName::Bellatrix)]
    #[case(ForkName::Capella)]
    fn test_double_proposal_slashes_proposer(#[case] fork: ForkName) {
        let keys = interop_secret_keys(16).unwrap();
        let mut state = interop_genesis_state(&DEV, fork, &keys, 0).unwrap();
        let slashing = ProposerSlashing {
            signed_header_1: signed_header(&state, &keys[5], 5, B256::repeat_byte(1)),
            signed_header_2: signed_header(&state, &keys[5], 5, B256::repeat_byte(2)),
        };
        let mut signature_set = SignatureSet::new();

        process_proposer_slashing(&mut state, &slashing, &DEV, &mut signature_set).unwrap();

        assert!(state.validators()[5].slashed);
        assert!(state.balances()[5] < state.validators()[5].effective_balance);
        assert_eq!(
            signature_set.descriptions(),
            vec!["proposer slashing signature"; 2]
        );
        assert_eq!(
            signature_set.entries()[0].signing_root,
            compute_signing_root(
                &slashing.signed_header_1.message,
                state.get_domain(DOMAIN_BEACON_PROPOSER, Some(0))
            )
        );
        assert!(signature_set.verify().unwrap());
    }

    #[test]
    fn test_identical_headers_are_rejected() {
        let keys = interop_secret_keys(16).unwrap();
        let mut state = interop_genesis_state(&DEV, ForkName::Altair, &keys, 0).unwrap();
        let header = signed_header(&state, &keys[5], 5, B256::repeat_byte(1));
        let slashing = ProposerSlashing {
            signed_header_1: header.clone(),
            signed_header_2: header,
        };
        let mut signature_set = SignatureSet::new();

        let err = process_proposer_slashing(&mut state, &slashing, &DEV, &mut signature_set)
            .unwrap_err();

        assert!(err.to_string().contains("identical"));
        assert!(signature_set.is_empty());
        assert!(!state.validators()[5].slashed);
    }

    #[test]
    fn test_slashed_proposer_cannot_be_slashed_again() {
        let keys = interop_secret_keys(16).unwrap();
        let mut state = interop_genesis_state(&DEV, ForkName::Phase0, &keys, 0).unwrap();
        let slashing = ProposerSlashing {
            signed_header_1: signed_header(&state, &keys[5], 5, B256::repeat_byte(1)),
            signed_header_2: signed_header(&state, &keys[5], 5, B256::repeat_byte(2)),
        };
        process_proposer_slashing(&mut state, &slashing, &DEV, &mut SignatureSet::new()).unwrap();

        let err = process_proposer_slashing(&mut state, &slashing, &DEV, &mut SignatureSet::new())
            .unwrap_err();

        assert!(err.to_string().contains("is not slashable"));
    }
}
