use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use ethereum_hashing::hash_fixed;
use ream_consensus_beacon::{
    beacon_state::BeaconState, bls_to_execution_change::SignedBLSToExecutionChange,
};
use ream_consensus_misc::{
    constants::{
        BLS_WITHDRAWAL_PREFIX, DOMAIN_BLS_TO_EXECUTION_CHANGE, ETH1_ADDRESS_WITHDRAWAL_PREFIX,
    },
    misc::{compute_domain, compute_signing_root},
};
use ream_network_spec::networks::BeaconNetworkSpec;

use crate::signature_set::SignatureSet;

pub fn process_bls_to_execution_change(
    state: &mut BeaconState,
    signed_address_change: &SignedBLSToExecutionChange,
    spec: &BeaconNetworkSpec,
    signature_set: &mut SignatureSet,
) -> anyhow::Result<()> {
    let address_change = &signed_address_change.message;
    let validator_index = address_change.validator_index;
    let validator = state
        .validators()
        .get(validator_index as usize)
        .ok_or_else(|| anyhow!("Validator {validator_index} not found"))?;

    ensure!(
        validator.withdrawal_credentials[0] == BLS_WITHDRAWAL_PREFIX,
        "Validator {validator_index} does not have BLS withdrawal credentials"
    );
    ensure!(
        validator.withdrawal_credentials[1..]
            == hash_fixed(address_change.from_bls_pubkey.to_bytes())[1..],
        "BLS pubkey does not match the withdrawal credentials of validator {validator_index}"
    );

    // Fork-agnostic domain since address changes are valid across forks
    let domain = compute_domain(
        DOMAIN_BLS_TO_EXECUTION_CHANGE,
        spec.genesis_fork_version,
        state.genesis_validators_root(),
    );
    signature_set.add(
        address_change.from_bls_pubkey.clone(),
        compute_signing_root(address_change, domain),
        signed_address_change.signature.clone(),
        "bls to execution change signature",
    );

    let mut withdrawal_credentials = B256::ZERO;
    withdrawal_credentials[0] = ETH1_ADDRESS_WITHDRAWAL_PREFIX;
    withdrawal_credentials[12..].copy_from_slice(address_change.to_execution_address.as_slice());
    state
        .validators_mut()
        .get_mut(validator_index as usize)
        .ok_or_else(|| anyhow!("Validator {validator_index} not found"))?
        .withdrawal_credentials = withdrawal_credentials;

    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;
    use ream_bls::{PrivateKey, traits::Signable};
    use ream_consensus_beacon::bls_to_execution_change::BLSToExecutionChange;
    use ream_consensus_misc::fork_name::ForkName;
    use ream_network_spec::networks::DEV;

    use super::*;
    use crate::genesis::{interop_genesis_state, interop_secret_keys};

    fn signed_change(
        state: &BeaconState,
        key: &PrivateKey,
        validator_index: u64,
    ) -> SignedBLSToExecutionChange {
        let message = BLSToExecutionChange {
            validator_index,
            from_bls_pubkey: key.public_key().unwrap(),
            to_execution_address: Address::repeat_byte(0x42),
        };
        let domain = compute_domain(
            DOMAIN_BLS_TO_EXECUTION_CHANGE,
            DEV.genesis_fork_version,
            state.genesis_validators_root(),
        );
        let signature = key
            .sign(compute_signing_root(&message, domain).as_slice())
            .unwrap();
        SignedBLSToExecutionChange { message, signature }
    }

    #[test]
    fn test_change_sets_execution_address_credentials() {
        let keys = interop_secret_keys(8).unwrap();
        let mut state = interop_genesis_state(&DEV, ForkName::Capella, &keys, 0).unwrap();
        let change = signed_change(&state, &keys[2], 2);
        let mut signature_set = SignatureSet::new();

        process_bls_to_execution_change(&mut state, &change, &DEV, &mut signature_set).unwrap();

        let credentials = state.validators()[2].withdrawal_credentials;
        assert_eq!(credentials[0], ETH1_ADDRESS_WITHDRAWAL_PREFIX);
        assert_eq!(&credentials[1..12], &[0u8; 11]);
        assert_eq!(&credentials[12..], Address::repeat_byte(0x42).as_slice());
        assert_eq!(
            signature_set.descriptions(),
            vec!["bls to execution change signature"]
        );
        assert!(signature_set.verify().unwrap());
    }

    #[test]
    fn test_pubkey_not_matching_credentials_is_rejected() {
        let keys = interop_secret_keys(8).unwrap();
        let mut state = interop_genesis_state(&DEV, ForkName::Capella, &keys, 0).unwrap();
        let change = signed_change(&state, &keys[3], 2);
        let mut signature_set = SignatureSet::new();

        let err = process_bls_to_execution_change(&mut state, &change, &DEV, &mut signature_set)
            .unwrap_err();

        assert!(err.to_string().contains("does not match the withdrawal credentials"));
        assert!(signature_set.is_empty());
        assert_eq!(
            state.validators()[2].withdrawal_credentials[0],
            BLS_WITHDRAWAL_PREFIX
        );
    }

    #[test]
    fn test_second_change_is_rejected() {
        let keys = interop_secret_keys(8).unwrap();
        let mut state = interop_genesis_state(&DEV, ForkName::Capella, &keys, 0).unwrap();
        let change = signed_change(&state, &keys[2], 2);
        process_bls_to_execution_change(&mut state, &change, &DEV, &mut SignatureSet::new())
            .unwrap();

        let err =
            process_bls_to_execution_change(&mut state, &change, &DEV, &mut SignatureSet::new())
                .unwrap_err();

        assert!(err.to_string().contains("does not have BLS withdrawal credentials"));
    }
}
