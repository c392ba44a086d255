pub mod engine_trait;
pub mod mock_engine;
pub mod new_payload_request;
pub mod payload_status;
