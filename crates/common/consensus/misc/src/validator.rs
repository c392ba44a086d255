use alloy_primitives::{Address, B256};
use ream_bls::PubKey;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::constants::{
    ETH1_ADDRESS_WITHDRAWAL_PREFIX, FAR_FUTURE_EPOCH, MAX_EFFECTIVE_BALANCE,
};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Validator {
    pub pubkey: PubKey,

    /// Commitment to pubkey for withdrawals
    pub withdrawal_credentials: B256,

    /// Balance at stake
    #[serde(with = "serde_utils::quoted_u64")]
    pub effective_balance: u64,
    pub slashed: bool,

    /// When criteria for activation were met
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_eligibility_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub exit_epoch: u64,

    /// When validator can withdraw funds
    #[serde(with = "serde_utils::quoted_u64")]
    pub withdrawable_epoch: u64,
}

impl Validator {
    /// Check if ``validator`` has an 0x01 prefixed "eth1" withdrawal credential.
    pub fn has_eth1_withdrawal_credential(&self) -> bool {
        self.withdrawal_credentials[0] == ETH1_ADDRESS_WITHDRAWAL_PREFIX
    }

    /// The execution address funds are withdrawn to, if the credential has the eth1 prefix.
    pub fn withdrawal_address(&self) -> Option<Address> {
        self.has_eth1_withdrawal_credential()
            .then(|| Address::from_slice(&self.withdrawal_credentials[12..]))
    }

    /// Check if ``validator`` is fully withdrawable.
    pub fn is_fully_withdrawable_validator(&self, balance: u64, epoch: u64) -> bool {
        self.has_eth1_withdrawal_credential() && self.withdrawable_epoch <= epoch && balance > 0
    }

    /// Check if ``validator`` is partially withdrawable.
    pub fn is_partially_withdrawable_validator(&self, balance: u64) -> bool {
        self.has_eth1_withdrawal_credential()
            && self.effective_balance == MAX_EFFECTIVE_BALANCE
            && balance > MAX_EFFECTIVE_BALANCE
    }

    pub fn is_slashable_validator(&self, epoch: u64) -> bool {
        !self.slashed && self.activation_epoch <= epoch && epoch < self.withdrawable_epoch
    }

    pub fn is_active_validator(&self, epoch: u64) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }

    /// Check if ``validator`` is eligible to be placed into the activation queue.
    pub fn is_eligible_for_activation_queue(&self) -> bool {
        self.activation_eligibility_epoch == FAR_FUTURE_EPOCH
            && self.effective_balance == MAX_EFFECTIVE_BALANCE
    }

    /// Check if ``validator`` is eligible for activation given the finalized epoch.
    pub fn is_eligible_for_activation(&self, finalized_epoch: u64) -> bool {
        // Placement in queue is finalized
        self.activation_eligibility_epoch <= finalized_epoch
            // Has not yet been activated
            && self.activation_epoch == FAR_FUTURE_EPOCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(prefix: u8) -> Validator {
        let mut withdrawal_credentials = B256::repeat_byte(0x11);
        withdrawal_credentials[0] = prefix;
        Validator {
            pubkey: PubKey::default(),
            withdrawal_credentials,
            effective_balance: MAX_EFFECTIVE_BALANCE,
            slashed: false,
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: 10,
        }
    }

    #[test]
    fn test_withdrawability_requires_eth1_credential() {
        let bls = validator(0x00);
        let eth1 = validator(0x01);

        assert!(!bls.is_fully_withdrawable_validator(1, 10));
        assert!(eth1.is_fully_withdrawable_validator(1, 10));
        assert!(!eth1.is_fully_withdrawable_validator(1, 9));
        assert!(eth1.is_partially_withdrawable_validator(MAX_EFFECTIVE_BALANCE + 1));
        assert!(!eth1.is_partially_withdrawable_validator(MAX_EFFECTIVE_BALANCE));
        assert_eq!(bls.withdrawal_address(), None);
        assert_eq!(eth1.withdrawal_address(), Some(Address::repeat_byte(0x11)));
    }

    #[test]
    fn test_activity_window() {
        let mut validator = validator(0x00);
        validator.activation_epoch = 2;
        validator.exit_epoch = 5;

        assert!(!validator.is_active_validator(1));
        assert!(validator.is_active_validator(2));
        assert!(!validator.is_active_validator(5));
        assert!(validator.is_slashable_validator(4));
    }
}
