use anyhow::anyhow;
use ream_consensus_beacon::beacon_state::BeaconState;
use ream_consensus_misc::{
    constants::{EPOCHS_PER_ETH1_VOTING_PERIOD, SLOTS_PER_EPOCH},
    eth_1_data::Eth1Data,
};

pub fn process_eth1_data(state: &mut BeaconState, eth1_data: &Eth1Data) -> anyhow::Result<()> {
    state
        .eth1_data_votes_mut()
        .push(eth1_data.clone())
        .map_err(|err| anyhow!("Failed to add eth1 data vote: {err:?}"))?;

    let vote_count = state
        .eth1_data_votes()
        .iter()
        .filter(|vote| *vote == eth1_data)
        .count() as u64;
    if vote_count * 2 > EPOCHS_PER_ETH1_VOTING_PERIOD * SLOTS_PER_EPOCH {
        *state.eth1_data_mut() = eth1_data.clone();
    }

    Ok(())
}
