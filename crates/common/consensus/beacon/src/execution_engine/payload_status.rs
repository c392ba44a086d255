use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Valid,
    Invalid,
    Syncing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStatus {
    pub status: ExecutionStatus,
    pub latest_valid_hash: Option<B256>,
}

impl PayloadStatus {
    pub fn valid(latest_valid_hash: B256) -> Self {
        Self {
            status: ExecutionStatus::Valid,
            latest_valid_hash: Some(latest_valid_hash),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == ExecutionStatus::Valid
    }
}
