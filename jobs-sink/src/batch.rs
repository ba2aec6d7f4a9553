use std::collections::HashMap;

use common_kafka::kafka_consumer::ConsumedOffsets;
use tracing::trace;

use crate::metrics_consts::DUPLICATES_IN_BATCH;
use crate::types::JobRow;

/// Working set for one batch cycle: decoded rows plus the offsets that
/// produced them.
pub struct Batch {
    max_size: usize,
    rows: Vec<JobRow>,
    offsets: ConsumedOffsets,
}

impl Batch {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            rows: Vec::with_capacity(max_size),
            offsets: ConsumedOffsets::default(),
        }
    }

    pub fn push(&mut self, row: JobRow, offset: i64) {
        self.offsets.track(row.source_partition, offset);
        self.rows.push(row);
    }

    /// Record the offset of an event that produced no row (tombstones),
    /// so the next commit still moves past it.
    pub fn track_offset(&mut self, partition: i32, offset: i64) {
        self.offsets.track(partition, offset);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A batch flushes when it is full, or when a fetch deadline expired
    /// with something to write. An empty batch never flushes.
    pub fn should_flush(&self, deadline_expired: bool) -> bool {
        self.rows.len() >= self.max_size || (deadline_expired && !self.rows.is_empty())
    }

    /// Hand over the working set and reset for the next cycle.
    pub fn take(&mut self) -> (Vec<JobRow>, ConsumedOffsets) {
        let rows = std::mem::replace(&mut self.rows, Vec::with_capacity(self.max_size));
        let offsets = std::mem::take(&mut self.offsets);
        (rows, offsets)
    }
}

/// Collapse a batch to one row per job id, keeping the row that arrived
/// last. The store's conflict clause cannot apply two updates to the same
/// key in one statement. Output order is unspecified.
pub fn dedupe_last_write_wins(rows: Vec<JobRow>) -> Vec<JobRow> {
    let mut unique: HashMap<i64, JobRow> = HashMap::with_capacity(rows.len());
    for row in rows {
        if let Some(superseded) = unique.insert(row.job_id, row) {
            metrics::counter!(DUPLICATES_IN_BATCH).increment(1);
            trace!(
                job_id = superseded.job_id,
                "duplicate job in batch, keeping the later row"
            );
        }
    }
    unique.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(job_id: i64, partition: i32, details: &str) -> JobRow {
        JobRow {
            job_id,
            job_details: details.to_string(),
            source_partition: partition,
            ..JobRow::default()
        }
    }

    #[test]
    fn dedupe_keeps_last_arrival_per_key() {
        let rows = vec![row(5, 0, "first"), row(5, 1, "second"), row(7, 2, "only")];
        let mut deduped = dedupe_last_write_wins(rows);
        deduped.sort_by_key(|r| r.job_id);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].job_id, 5);
        assert_eq!(deduped[0].job_details, "second");
        assert_eq!(deduped[0].source_partition, 1);
        assert_eq!(deduped[1].job_id, 7);
        assert_eq!(deduped[1].job_details, "only");
    }

    #[test]
    fn dedupe_without_duplicates_is_identity() {
        let rows = vec![row(1, 0, "a"), row(2, 0, "b")];
        let mut deduped = dedupe_last_write_wins(rows);
        deduped.sort_by_key(|r| r.job_id);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn flushes_when_full() {
        let mut batch = Batch::new(2);
        batch.push(row(1, 0, ""), 10);
        assert!(!batch.should_flush(false));
        batch.push(row(2, 0, ""), 11);
        assert!(batch.should_flush(false));
    }

    #[test]
    fn flushes_partial_batch_on_deadline_only() {
        let mut batch = Batch::new(10);
        batch.push(row(1, 0, ""), 10);
        assert!(!batch.should_flush(false));
        assert!(batch.should_flush(true));
    }

    #[test]
    fn empty_batch_never_flushes() {
        let batch = Batch::new(10);
        assert!(!batch.should_flush(false));
        assert!(!batch.should_flush(true));
    }

    #[test]
    fn take_resets_rows_and_offsets() {
        let mut batch = Batch::new(10);
        batch.push(row(1, 0, ""), 10);
        batch.push(row(2, 1, ""), 3);
        batch.track_offset(2, 17);

        let (rows, offsets) = batch.take();
        assert_eq!(rows.len(), 2);
        assert_eq!(offsets.get(0), Some(10));
        assert_eq!(offsets.get(1), Some(3));
        assert_eq!(offsets.get(2), Some(17));

        assert!(batch.is_empty());
        let (_, offsets) = batch.take();
        assert!(offsets.is_empty());
    }
}
