use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rdkafka::{
    consumer::{CommitMode, Consumer, StreamConsumer},
    error::KafkaError,
    ClientConfig, Message, Offset, TopicPartitionList,
};
use tracing::debug;

use crate::config::{ConsumerConfig, KafkaConfig};

#[derive(Clone)]
pub struct SingleTopicConsumer {
    inner: Arc<Inner>,
}

struct Inner {
    consumer: StreamConsumer,
    topic: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("deadline exceeded while waiting for the next event")]
    DeadlineExceeded,
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),
}

/// One raw event pulled off the topic, with its provenance.
pub struct FetchedEvent {
    /// None for tombstones.
    pub payload: Option<Vec<u8>>,
    pub partition: i32,
    pub offset: i64,
}

/// Highest offset consumed per partition, accumulated over one batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsumedOffsets {
    by_partition: HashMap<i32, i64>,
}

impl ConsumedOffsets {
    pub fn track(&mut self, partition: i32, offset: i64) {
        let highest = self.by_partition.entry(partition).or_insert(offset);
        if offset > *highest {
            *highest = offset;
        }
    }

    pub fn get(&self, partition: i32) -> Option<i64> {
        self.by_partition.get(&partition).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_partition.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_partition.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i64)> + '_ {
        self.by_partition.iter().map(|(p, o)| (*p, *o))
    }
}

impl SingleTopicConsumer {
    pub fn new(
        common_config: KafkaConfig,
        consumer_config: ConsumerConfig,
    ) -> Result<Self, KafkaError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &common_config.kafka_hosts)
            .set("statistics.interval.ms", "10000")
            .set("group.id", consumer_config.kafka_consumer_group)
            .set(
                "auto.offset.reset",
                &consumer_config.kafka_consumer_offset_reset,
            )
            .set(
                "fetch.message.max.bytes",
                common_config.kafka_max_message_bytes.to_string(),
            );

        // Offsets are committed explicitly, once the batch they belong to
        // has been persisted.
        client_config
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false");

        if common_config.kafka_tls {
            client_config.set("security.protocol", "ssl").set(
                "enable.ssl.certificate.verification",
                common_config.verify_ssl_certificate.to_string(),
            );
        };

        let consumer: StreamConsumer = client_config.create()?;
        consumer.subscribe(&[consumer_config.kafka_consumer_topic.as_str()])?;

        let inner = Inner {
            consumer,
            topic: consumer_config.kafka_consumer_topic,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Fetch the next event, waiting at most `deadline`.
    pub async fn fetch_next(&self, deadline: Duration) -> Result<FetchedEvent, FetchError> {
        let message = match tokio::time::timeout(deadline, self.inner.consumer.recv()).await {
            Ok(received) => received?,
            Err(_) => return Err(FetchError::DeadlineExceeded),
        };

        Ok(FetchedEvent {
            payload: message.payload().map(|p| p.to_vec()),
            partition: message.partition(),
            offset: message.offset(),
        })
    }

    /// Synchronously commit the group position past every offset in `offsets`.
    /// Committed offsets name the next offset to read, hence the +1.
    pub fn commit_consumed(&self, offsets: &ConsumedOffsets) -> Result<(), KafkaError> {
        if offsets.is_empty() {
            return Ok(());
        }

        let mut positions = TopicPartitionList::new();
        for (partition, offset) in offsets.iter() {
            positions.add_partition_offset(
                &self.inner.topic,
                partition,
                Offset::Offset(offset + 1),
            )?;
        }

        debug!(partitions = offsets.len(), "committing consumed offsets");
        self.inner.consumer.commit(&positions, CommitMode::Sync)
    }
}
