use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::types::JobRow;

/// The relational sink a deduplicated batch is persisted into.
#[async_trait]
pub trait JobStore {
    async fn upsert_jobs(&self, jobs: &[JobRow]) -> Result<(), sqlx::Error>;
}

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    /// Persist a batch as one insert-or-update statement. Business columns
    /// are overwritten on conflict; `source_partitions` accumulates, and the
    /// append is skipped when the partition is already recorded so replays
    /// leave the row byte-identical. `last_updated_at` is assigned by the
    /// server at write time.
    ///
    /// Callers must have deduplicated the batch: the conflict clause cannot
    /// touch the same job_id twice in one statement.
    async fn upsert_jobs(&self, jobs: &[JobRow]) -> Result<(), sqlx::Error> {
        if jobs.is_empty() {
            return Ok(());
        }

        let mut job_ids = Vec::with_capacity(jobs.len());
        let mut service_ids = Vec::with_capacity(jobs.len());
        let mut user_ids = Vec::with_capacity(jobs.len());
        let mut job_start_type_ids = Vec::with_capacity(jobs.len());
        let mut job_start_dates = Vec::with_capacity(jobs.len());
        let mut job_start_from_times = Vec::with_capacity(jobs.len());
        let mut job_states = Vec::with_capacity(jobs.len());
        let mut job_cities = Vec::with_capacity(jobs.len());
        let mut job_details = Vec::with_capacity(jobs.len());
        let mut job_quote_time_lasts = Vec::with_capacity(jobs.len());
        let mut job_status_ids = Vec::with_capacity(jobs.len());
        let mut create_dates = Vec::with_capacity(jobs.len());
        let mut source_partitions = Vec::with_capacity(jobs.len());

        for job in jobs {
            job_ids.push(job.job_id);
            service_ids.push(job.service_id);
            user_ids.push(job.user_id.clone());
            job_start_type_ids.push(job.job_start_type_id);
            job_start_dates.push(job.job_start_date);
            job_start_from_times.push(job.job_start_from_time);
            job_states.push(job.job_state);
            job_cities.push(job.job_city);
            job_details.push(job.job_details.clone());
            job_quote_time_lasts.push(job.job_quote_time_last);
            job_status_ids.push(job.job_status_id);
            create_dates.push(job.create_date);
            source_partitions.push(job.source_partition.to_string());
        }

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (
                job_id, service_id, user_id, job_start_type_id, job_start_date,
                job_start_from_time, job_state, job_city, job_details,
                job_quote_time_last, job_status_id, create_date,
                source_partitions, last_updated_at)
                (SELECT *, NOW() FROM UNNEST(
                    $1::bigint[],
                    $2::bigint[],
                    $3::text[],
                    $4::bigint[],
                    $5::timestamptz[],
                    $6::bigint[],
                    $7::bigint[],
                    $8::bigint[],
                    $9::text[],
                    $10::timestamptz[],
                    $11::bigint[],
                    $12::timestamptz[],
                    $13::text[]))
                ON CONFLICT (job_id) DO UPDATE SET
                    service_id = excluded.service_id,
                    user_id = excluded.user_id,
                    job_start_type_id = excluded.job_start_type_id,
                    job_start_date = excluded.job_start_date,
                    job_start_from_time = excluded.job_start_from_time,
                    job_state = excluded.job_state,
                    job_city = excluded.job_city,
                    job_details = excluded.job_details,
                    job_quote_time_last = excluded.job_quote_time_last,
                    job_status_id = excluded.job_status_id,
                    create_date = excluded.create_date,
                    last_updated_at = NOW(),
                    source_partitions = CASE
                        WHEN excluded.source_partitions =
                            ANY(string_to_array(jobs.source_partitions, ', '))
                            THEN jobs.source_partitions
                        ELSE jobs.source_partitions || ', ' || excluded.source_partitions
                    END"#,
        )
        .bind(&job_ids)
        .bind(&service_ids)
        .bind(&user_ids)
        .bind(&job_start_type_ids)
        .bind(&job_start_dates)
        .bind(&job_start_from_times)
        .bind(&job_states)
        .bind(&job_cities)
        .bind(&job_details)
        .bind(&job_quote_time_lasts)
        .bind(&job_status_ids)
        .bind(&create_dates)
        .bind(&source_partitions)
        .execute(&self.pool)
        .await?;

        debug!(rows = result.rows_affected(), "job batch upserted");
        Ok(())
    }
}
