use rdkafka::error::KafkaError;
use thiserror::Error;

/// A change event payload that could not be turned into a `JobRow`.
#[derive(Debug, Error)]
#[error("malformed change event: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Fatal pipeline outcomes. The process exits on any of these; recovery is
/// a supervised restart plus redelivery into the idempotent upsert.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("fetch from the change log failed: {0}")]
    Fetch(#[source] KafkaError),
    #[error("failed to persist batch: {0}")]
    Persist(#[source] sqlx::Error),
    #[error("failed to commit consumed offsets: {0}")]
    Commit(#[source] KafkaError),
}
