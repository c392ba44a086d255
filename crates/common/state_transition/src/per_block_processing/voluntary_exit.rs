use anyhow::{anyhow, ensure};
use ream_consensus_beacon::{beacon_state::BeaconState, voluntary_exit::SignedVoluntaryExit};
use ream_consensus_misc::{
    constants::{DOMAIN_VOLUNTARY_EXIT, FAR_FUTURE_EPOCH},
    misc::compute_signing_root,
};
use ream_network_spec::networks::BeaconNetworkSpec;

use crate::signature_set::SignatureSet;

pub fn process_voluntary_exit(
    state: &mut BeaconState,
    signed_voluntary_exit: &SignedVoluntaryExit,
    spec: &BeaconNetworkSpec,
    signature_set: &mut SignatureSet,
) -> anyhow::Result<()> {
    let voluntary_exit = &signed_voluntary_exit.message;
    let current_epoch = state.get_current_epoch();
    let validator = state
        .validators()
        .get(voluntary_exit.validator_index as usize)
        .ok_or_else(|| anyhow!("Validator {} not found", voluntary_exit.validator_index))?;

    // Verify the validator is active
    ensure!(
        validator.is_active_validator(current_epoch),
        "Validator {} is not active",
        voluntary_exit.validator_index
    );
    // Verify exit has not been initiated
    ensure!(
        validator.exit_epoch == FAR_FUTURE_EPOCH,
        "Validator {} has already initiated an exit",
        voluntary_exit.validator_index
    );
    // Exits must specify an epoch when they become valid; they are not valid before then
    ensure!(
        current_epoch >= voluntary_exit.epoch,
        "Voluntary exit epoch {} is in the future",
        voluntary_exit.epoch
    );
    // Verify the validator has been active long enough
    ensure!(
        current_epoch >= validator.activation_epoch + spec.shard_committee_period,
        "Validator {} has not been active long enough to exit",
        voluntary_exit.validator_index
    );

    let domain = state.get_domain(DOMAIN_VOLUNTARY_EXIT, Some(voluntary_exit.epoch));
    signature_set.add(
        validator.pubkey.clone(),
        compute_signing_root(voluntary_exit, domain),
        signed_voluntary_exit.signature.clone(),
        "voluntary exit signature",
    );

    // Initiate exit
    state.initiate_validator_exit(voluntary_exit.validator_index, spec)
}
