use std::cmp::min;

use alloy_primitives::{B256, aliases::B32};
use anyhow::{anyhow, ensure};
use ream_bls::{AggregatePubKey, BLSSignature, PubKey, traits::Verifiable};
use ream_consensus_misc::{
    constants::{
        DOMAIN_DEPOSIT, EFFECTIVE_BALANCE_INCREMENT, FAR_FUTURE_EPOCH,
        INACTIVITY_PENALTY_QUOTIENT, INACTIVITY_PENALTY_QUOTIENT_ALTAIR,
        INACTIVITY_PENALTY_QUOTIENT_BELLATRIX, MAX_EFFECTIVE_BALANCE,
        MIN_SLASHING_PENALTY_QUOTIENT, MIN_SLASHING_PENALTY_QUOTIENT_ALTAIR,
        MIN_SLASHING_PENALTY_QUOTIENT_BELLATRIX, PROPORTIONAL_SLASHING_MULTIPLIER,
        PROPORTIONAL_SLASHING_MULTIPLIER_ALTAIR, PROPORTIONAL_SLASHING_MULTIPLIER_BELLATRIX,
    },
    deposit_message::DepositMessage,
    fork_name::ForkName,
    misc::{compute_domain, compute_signing_root},
    validator::Validator,
};

pub fn get_validator_from_deposit(
    pubkey: PubKey,
    withdrawal_credentials: B256,
    amount: u64,
) -> Validator {
    Validator {
        pubkey,
        withdrawal_credentials,
        effective_balance: min(
            amount - amount % EFFECTIVE_BALANCE_INCREMENT,
            MAX_EFFECTIVE_BALANCE,
        ),
        slashed: false,
        activation_eligibility_epoch: FAR_FUTURE_EPOCH,
        activation_epoch: FAR_FUTURE_EPOCH,
        exit_epoch: FAR_FUTURE_EPOCH,
        withdrawable_epoch: FAR_FUTURE_EPOCH,
    }
}

/// Return the aggregate public key for the public keys in ``pubkeys``.
pub fn eth_aggregate_pubkeys(pubkeys: &[&PubKey]) -> anyhow::Result<PubKey> {
    ensure!(!pubkeys.is_empty(), "Public keys list cannot be empty");

    let aggregate_pubkey = AggregatePubKey::aggregate(pubkeys)?;
    Ok(aggregate_pubkey.to_pubkey())
}

/// Verify a deposit's proof of possession. Deposits are valid across forks, so the domain is
/// built from the genesis fork version and an empty genesis validators root.
pub fn is_valid_deposit_signature(
    pubkey: &PubKey,
    withdrawal_credentials: B256,
    amount: u64,
    signature: &BLSSignature,
    genesis_fork_version: B32,
) -> anyhow::Result<bool> {
    let deposit_message = DepositMessage {
        pubkey: pubkey.clone(),
        withdrawal_credentials,
        amount,
    };
    let domain = compute_domain(DOMAIN_DEPOSIT, genesis_fork_version, B256::ZERO);
    let signing_root = compute_signing_root(&deposit_message, domain);

    signature
        .verify(pubkey, signing_root.as_ref())
        .map_err(|err| anyhow!("Invalid deposit signature: {err:?}"))
}

pub fn inactivity_penalty_quotient(fork: ForkName) -> u64 {
    match fork {
        ForkName::Phase0 => INACTIVITY_PENALTY_QUOTIENT,
        ForkName::Altair => INACTIVITY_PENALTY_QUOTIENT_ALTAIR,
        ForkName::Bellatrix | ForkName::Capella => INACTIVITY_PENALTY_QUOTIENT_BELLATRIX,
    }
}

pub fn min_slashing_penalty_quotient(fork: ForkName) -> u64 {
    match fork {
        ForkName::Phase0 => MIN_SLASHING_PENALTY_QUOTIENT,
        ForkName::Altair => MIN_SLASHING_PENALTY_QUOTIENT_ALTAIR,
        ForkName::Bellatrix | ForkName::Capella => MIN_SLASHING_PENALTY_QUOTIENT_BELLATRIX,
    }
}

pub fn proportional_slashing_multiplier(fork: ForkName) -> u64 {
    match fork {
        ForkName::Phase0 => PROPORTIONAL_SLASHING_MULTIPLIER,
        ForkName::Altair => PROPORTIONAL_SLASHING_MULTIPLIER_ALTAIR,
        ForkName::Bellatrix | ForkName::Capella => PROPORTIONAL_SLASHING_MULTIPLIER_BELLATRIX,
    }
}

#[cfg(test)]
mod tests {
    use ream_bls::{PrivateKey, traits::Signable};

    use super::*;

    #[test]
    fn test_validator_from_deposit_caps_effective_balance() {
        let validator = get_validator_from_deposit(PubKey::default(), B256::ZERO, 40_500_000_000);
        assert_eq!(validator.effective_balance, MAX_EFFECTIVE_BALANCE);

        let validator = get_validator_from_deposit(PubKey::default(), B256::ZERO, 1_700_000_000);
        assert_eq!(validator.effective_balance, 1_000_000_000);
        assert_eq!(validator.activation_epoch, FAR_FUTURE_EPOCH);
    }

    #[test]
    fn test_deposit_signature() {
        let private_key = PrivateKey::key_gen(&[7u8; 32]).unwrap();
        let pubkey = private_key.public_key().unwrap();
        let genesis_fork_version = B32::ZERO;
        let message = DepositMessage {
            pubkey: pubkey.clone(),
            withdrawal_credentials: B256::ZERO,
            amount: MAX_EFFECTIVE_BALANCE,
        };
        let domain = compute_domain(DOMAIN_DEPOSIT, genesis_fork_version, B256::ZERO);
        let signature = private_key
            .sign(compute_signing_root(&message, domain).as_ref())
            .unwrap();

        assert!(
            is_valid_deposit_signature(
                &pubkey,
                B256::ZERO,
                MAX_EFFECTIVE_BALANCE,
                &signature,
                genesis_fork_version
            )
            .unwrap()
        );
        assert!(
            !is_valid_deposit_signature(
                &pubkey,
                B256::ZERO,
                MAX_EFFECTIVE_BALANCE - 1,
                &signature,
                genesis_fork_version
            )
            .unwrap()
        );
    }

    #[test]
    fn test_per_fork_quotients() {
        assert_eq!(min_slashing_penalty_quotient(ForkName::Phase0), 128);
        assert_eq!(min_slashing_penalty_quotient(ForkName::Altair), 64);
        assert_eq!(min_slashing_penalty_quotient(ForkName::Capella), 32);
        assert_eq!(proportional_slashing_multiplier(ForkName::Bellatrix), 3);
        assert_eq!(inactivity_penalty_quotient(ForkName::Altair), 50_331_648);
    }
}
