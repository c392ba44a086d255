use std::{fs::File, path::Path};

use serde::Deserialize;

use super::{
    engine_trait::ExecutionApi,
    new_payload_request::NewPayloadRequest,
    payload_status::{ExecutionStatus, PayloadStatus},
};

/// Execution layer stand-in that answers every payload with a fixed status.
#[derive(Deserialize, Debug)]
pub struct MockExecutionEngine {
    #[serde(default = "default_status")]
    status: ExecutionStatus,
}

fn default_status() -> ExecutionStatus {
    ExecutionStatus::Valid
}

impl MockExecutionEngine {
    pub fn new() -> Self {
        Self {
            status: ExecutionStatus::Valid,
        }
    }

    pub fn from_file(execution_yaml_path: &Path) -> anyhow::Result<MockExecutionEngine> {
        let file = File::open(execution_yaml_path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    pub fn set_payload_status(&mut self, status: ExecutionStatus) {
        self.status = status;
    }
}

impl Default for MockExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionApi for MockExecutionEngine {
    fn notify_new_payload(
        &self,
        new_payload_request: NewPayloadRequest<'_>,
    ) -> anyhow::Result<PayloadStatus> {
        let latest_valid_hash = match self.status {
            ExecutionStatus::Valid => Some(new_payload_request.block_hash()),
            ExecutionStatus::Invalid | ExecutionStatus::Syncing => None,
        };
        Ok(PayloadStatus {
            status: self.status,
            latest_valid_hash,
        })
    }
}
