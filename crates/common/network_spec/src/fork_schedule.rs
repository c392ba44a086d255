use std::slice::Iter;

use ream_consensus_misc::{fork::Fork, fork_name::ForkName};
use serde::{Deserialize, Serialize};

/// The `Fork` value a state carries once each fork activates, in activation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkSchedule(pub [Fork; ForkSchedule::TOTAL]);

impl ForkSchedule {
    pub const TOTAL: usize = ForkName::ALL.len();

    pub fn iter(&self) -> Iter<'_, Fork> {
        self.0.iter()
    }

    pub fn get(&self, fork_name: ForkName) -> &Fork {
        &self.0[fork_name as usize]
    }

    pub fn scheduled(&self) -> impl Iterator<Item = &Fork> {
        self.iter()
            .filter(|fork| fork.epoch != Fork::UNSCHEDULED_EPOCH)
    }
}
