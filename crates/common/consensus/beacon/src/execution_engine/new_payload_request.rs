use alloy_primitives::B256;

use crate::beacon_block::ExecutionPayloadRef;

#[derive(Debug, Clone, Copy)]
pub struct NewPayloadRequest<'a> {
    pub execution_payload: ExecutionPayloadRef<'a>,
}

impl NewPayloadRequest<'_> {
    pub fn block_hash(&self) -> B256 {
        self.execution_payload.block_hash()
    }
}
