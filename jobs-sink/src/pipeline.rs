use std::time::{Duration, Instant};

use common_kafka::kafka_consumer::FetchError;
use tracing::{debug, trace, warn};

use crate::batch::{dedupe_last_write_wins, Batch};
use crate::config::Config;
use crate::errors::PipelineError;
use crate::liveness::WorkerHealth;
use crate::metrics_consts::{
    BATCHES_COMMITTED, BATCH_WRITE_TIME, EMPTY_EVENTS, EVENTS_RECEIVED, FETCH_DEADLINE_EXPIRED,
    ROWS_WRITTEN,
};
use crate::repository::JobStore;
use crate::source::EventSource;
use crate::types::JobRow;

/// Tunables for the batch cycle, split out of `Config` so tests can run
/// the pipeline without touching the environment.
#[derive(Clone)]
pub struct PipelineSettings {
    pub max_batch_size: usize,
    pub fetch_deadline: Duration,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_batch_size: config.max_batch_size,
            fetch_deadline: config.fetch_deadline(),
        }
    }
}

/// Drive the fetch/decode/dedupe/upsert/commit cycle until a fatal error.
///
/// Offsets are committed only after the batch that produced them has been
/// persisted. A crash between write and commit redelivers the batch, and
/// the idempotent upsert absorbs the replay.
pub async fn run<S, D>(
    mut source: S,
    store: D,
    liveness: WorkerHealth,
    settings: PipelineSettings,
) -> Result<(), PipelineError>
where
    S: EventSource,
    D: JobStore,
{
    let mut batch = Batch::new(settings.max_batch_size);

    loop {
        liveness.report_healthy();

        let deadline_expired = match source.fetch_next(settings.fetch_deadline).await {
            Ok(event) => {
                metrics::counter!(EVENTS_RECEIVED).increment(1);
                match event.payload {
                    Some(payload) => {
                        let row = JobRow::decode(&payload, event.partition)?;
                        trace!(
                            job_id = row.job_id,
                            partition = event.partition,
                            offset = event.offset,
                            "decoded change event"
                        );
                        batch.push(row, event.offset);
                    }
                    None => {
                        // Tombstones carry no row, but their offset still counts.
                        metrics::counter!(EMPTY_EVENTS).increment(1);
                        warn!(
                            partition = event.partition,
                            offset = event.offset,
                            "skipping event with empty payload"
                        );
                        batch.track_offset(event.partition, event.offset);
                    }
                }
                false
            }
            Err(FetchError::DeadlineExceeded) => {
                metrics::counter!(FETCH_DEADLINE_EXPIRED).increment(1);
                true
            }
            Err(FetchError::Kafka(e)) => return Err(PipelineError::Fetch(e)),
        };

        if !batch.should_flush(deadline_expired) {
            debug!(
                current_batch_size = batch.len(),
                max_batch_size = settings.max_batch_size,
                deadline_expired,
                "batch not ready"
            );
            continue;
        }

        let (rows, offsets) = batch.take();
        let fetched = rows.len();
        let rows = dedupe_last_write_wins(rows);

        let write_start = Instant::now();
        store
            .upsert_jobs(&rows)
            .await
            .map_err(PipelineError::Persist)?;
        metrics::histogram!(BATCH_WRITE_TIME).record(write_start.elapsed().as_millis() as f64);
        metrics::counter!(ROWS_WRITTEN).increment(rows.len() as u64);

        source
            .commit_consumed(&offsets)
            .await
            .map_err(PipelineError::Commit)?;
        metrics::counter!(BATCHES_COMMITTED).increment(1);

        debug!(
            fetched,
            written = rows.len(),
            "batch persisted and offsets committed"
        );
    }
}
