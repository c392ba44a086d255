use std::cmp::max;

use alloy_primitives::B256;
use anyhow::{anyhow, bail};
use ream_bls::PubKey;
use ream_consensus_misc::{
    constants::{
        EPOCHS_PER_SLASHINGS_VECTOR, FAR_FUTURE_EPOCH, PROPOSER_REWARD_QUOTIENT, PROPOSER_WEIGHT,
        WEIGHT_DENOMINATOR, WHISTLEBLOWER_REWARD_QUOTIENT,
    },
    misc::compute_activation_exit_epoch,
};
use ream_network_spec::networks::BeaconNetworkSpec;

use super::BeaconState;
use crate::helpers::{get_validator_from_deposit, min_slashing_penalty_quotient};

impl BeaconState {
    /// Increase the validator balance at index ``index`` by ``delta``.
    pub fn increase_balance(&mut self, index: u64, delta: u64) -> anyhow::Result<()> {
        let Some(balance) = self.balances_mut().get_mut(index as usize) else {
            bail!("Failed to increase balance of validator {index}")
        };
        *balance += delta;
        Ok(())
    }

    /// Decrease the validator balance at index ``index`` by ``delta`` with underflow protection.
    pub fn decrease_balance(&mut self, index: u64, delta: u64) -> anyhow::Result<()> {
        let Some(balance) = self.balances_mut().get_mut(index as usize) else {
            bail!("Failed to decrease balance of validator {index}")
        };
        *balance = balance.saturating_sub(delta);
        Ok(())
    }

    /// Initiate the exit of the validator with index ``index``.
    pub fn initiate_validator_exit(
        &mut self,
        index: u64,
        spec: &BeaconNetworkSpec,
    ) -> anyhow::Result<()> {
        let Some(validator) = self.validators().get(index as usize) else {
            bail!("Validator {index} not found")
        };
        if validator.exit_epoch != FAR_FUTURE_EPOCH {
            return Ok(());
        }

        // Compute exit queue epoch
        let exit_epochs = self
            .validators()
            .iter()
            .map(|validator| validator.exit_epoch)
            .filter(|&exit_epoch| exit_epoch != FAR_FUTURE_EPOCH)
            .collect::<Vec<_>>();
        let mut exit_queue_epoch = exit_epochs.iter().copied().fold(
            compute_activation_exit_epoch(self.get_current_epoch()),
            max,
        );
        let exit_queue_churn = exit_epochs
            .iter()
            .filter(|&&exit_epoch| exit_epoch == exit_queue_epoch)
            .count() as u64;
        if exit_queue_churn >= self.get_validator_churn_limit(spec) {
            exit_queue_epoch += 1;
        }

        let Some(validator) = self.validators_mut().get_mut(index as usize) else {
            bail!("Validator {index} not found")
        };
        validator.exit_epoch = exit_queue_epoch;
        validator.withdrawable_epoch = exit_queue_epoch
            .checked_add(spec.min_validator_withdrawability_delay)
            .ok_or_else(|| anyhow!("Failed to set withdrawable epoch"))?;

        Ok(())
    }

    /// Slash the validator with index ``slashed_index``.
    pub fn slash_validator(
        &mut self,
        slashed_index: u64,
        whistleblower_index: Option<u64>,
        spec: &BeaconNetworkSpec,
    ) -> anyhow::Result<()> {
        let epoch = self.get_current_epoch();
        self.initiate_validator_exit(slashed_index, spec)?;

        let Some(validator) = self.validators_mut().get_mut(slashed_index as usize) else {
            bail!("Validator {slashed_index} not found")
        };
        validator.slashed = true;
        validator.withdrawable_epoch = max(
            validator.withdrawable_epoch,
            epoch + EPOCHS_PER_SLASHINGS_VECTOR,
        );
        let effective_balance = validator.effective_balance;

        self.slashings_mut()[(epoch % EPOCHS_PER_SLASHINGS_VECTOR) as usize] += effective_balance;
        self.decrease_balance(
            slashed_index,
            effective_balance / min_slashing_penalty_quotient(self.fork_name()),
        )?;

        // Apply proposer and whistleblower rewards
        let proposer_index = self.get_beacon_proposer_index()?;
        let whistleblower_index = whistleblower_index.unwrap_or(proposer_index);
        let whistleblower_reward = effective_balance / WHISTLEBLOWER_REWARD_QUOTIENT;
        let proposer_reward = match self {
            BeaconState::Phase0(_) => whistleblower_reward / PROPOSER_REWARD_QUOTIENT,
            _ => whistleblower_reward * PROPOSER_WEIGHT / WEIGHT_DENOMINATOR,
        };
        self.increase_balance(proposer_index, proposer_reward)?;
        self.increase_balance(whistleblower_index, whistleblower_reward - proposer_reward)?;

        Ok(())
    }

    /// Append a validator created from a deposit, along with its per-validator bookkeeping.
    pub fn add_validator_to_registry(
        &mut self,
        pubkey: PubKey,
        withdrawal_credentials: B256,
        amount: u64,
    ) -> anyhow::Result<()> {
        self.validators_mut()
            .push(get_validator_from_deposit(pubkey, withdrawal_credentials, amount))
            .map_err(|err| anyhow!("Failed to add validator: {err:?}"))?;
        self.balances_mut()
            .push(amount)
            .map_err(|err| anyhow!("Failed to add balance: {err:?}"))?;

        if self.fork_name().altair_enabled() {
            self.previous_epoch_participation_mut()?
                .push(0)
                .map_err(|err| anyhow!("Failed to add participation: {err:?}"))?;
            self.current_epoch_participation_mut()?
                .push(0)
                .map_err(|err| anyhow!("Failed to add participation: {err:?}"))?;
            self.inactivity_scores_mut()?
                .push(0)
                .map_err(|err| anyhow!("Failed to add inactivity score: {err:?}"))?;
        }

        Ok(())
    }
}
