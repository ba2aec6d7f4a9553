pub const EVENTS_RECEIVED: &str = "jobs_sink_events_received";
pub const EMPTY_EVENTS: &str = "jobs_sink_empty_events";
pub const FETCH_DEADLINE_EXPIRED: &str = "jobs_sink_fetch_deadline_expired";
pub const DUPLICATES_IN_BATCH: &str = "jobs_sink_duplicates_in_batch";
pub const ROWS_WRITTEN: &str = "jobs_sink_rows_written";
pub const BATCH_WRITE_TIME: &str = "jobs_sink_batch_write_time_ms";
pub const BATCHES_COMMITTED: &str = "jobs_sink_batches_committed";
