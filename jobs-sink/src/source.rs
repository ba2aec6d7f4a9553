use std::time::Duration;

use async_trait::async_trait;
use common_kafka::kafka_consumer::{
    ConsumedOffsets, FetchError, FetchedEvent, SingleTopicConsumer,
};
use rdkafka::error::KafkaError;

/// The change log the pipeline drains. Seam for tests to drive the
/// pipeline without a broker.
#[async_trait]
pub trait EventSource {
    /// Fetch the next event, waiting at most `deadline`.
    async fn fetch_next(&mut self, deadline: Duration) -> Result<FetchedEvent, FetchError>;

    /// Advance the committed position past `offsets`.
    async fn commit_consumed(&mut self, offsets: &ConsumedOffsets) -> Result<(), KafkaError>;
}

#[async_trait]
impl EventSource for SingleTopicConsumer {
    async fn fetch_next(&mut self, deadline: Duration) -> Result<FetchedEvent, FetchError> {
        SingleTopicConsumer::fetch_next(self, deadline).await
    }

    async fn commit_consumed(&mut self, offsets: &ConsumedOffsets) -> Result<(), KafkaError> {
        SingleTopicConsumer::commit_consumed(self, offsets)
    }
}
