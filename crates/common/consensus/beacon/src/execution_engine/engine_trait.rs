use super::{new_payload_request::NewPayloadRequest, payload_status::PayloadStatus};

/// The execution layer as seen by block processing.
pub trait ExecutionApi {
    /// Hand ``new_payload_request`` to the execution layer and return its verdict.
    fn notify_new_payload(
        &self,
        new_payload_request: NewPayloadRequest<'_>,
    ) -> anyhow::Result<PayloadStatus>;
}
