use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::errors::DecodeError;

/// One row of the jobs table, decoded from a flattened Debezium change
/// event. Upstream keys are PascalCase; timestamps arrive as epoch
/// milliseconds and are truncated to whole seconds on decode.
///
/// `source_partition` is not part of the payload, it records which log
/// partition produced this row.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct JobRow {
    #[serde(deserialize_with = "default_on_null")]
    pub job_id: i64,
    #[serde(deserialize_with = "default_on_null")]
    pub service_id: i64,
    #[serde(deserialize_with = "default_on_null")]
    pub user_id: String,
    #[serde(deserialize_with = "default_on_null")]
    pub job_start_type_id: i64,
    #[serde(deserialize_with = "datetime_from_epoch_millis")]
    pub job_start_date: DateTime<Utc>,
    #[serde(deserialize_with = "default_on_null")]
    pub job_start_from_time: i64,
    #[serde(deserialize_with = "default_on_null")]
    pub job_state: i64,
    #[serde(deserialize_with = "default_on_null")]
    pub job_city: i64,
    #[serde(deserialize_with = "string_without_nul_bytes")]
    pub job_details: String,
    #[serde(deserialize_with = "datetime_from_epoch_millis")]
    pub job_quote_time_last: DateTime<Utc>,
    #[serde(deserialize_with = "default_on_null")]
    pub job_status_id: i64,
    #[serde(deserialize_with = "datetime_from_epoch_millis")]
    pub create_date: DateTime<Utc>,
    #[serde(skip)]
    pub source_partition: i32,
}

// Missing payload fields decode to zero values, matching the upstream
// producer's sparse updates.
impl Default for JobRow {
    fn default() -> Self {
        Self {
            job_id: 0,
            service_id: 0,
            user_id: String::new(),
            job_start_type_id: 0,
            job_start_date: DateTime::<Utc>::UNIX_EPOCH,
            job_start_from_time: 0,
            job_state: 0,
            job_city: 0,
            job_details: String::new(),
            job_quote_time_last: DateTime::<Utc>::UNIX_EPOCH,
            job_status_id: 0,
            create_date: DateTime::<Utc>::UNIX_EPOCH,
            source_partition: 0,
        }
    }
}

impl JobRow {
    /// Decode a raw event payload that originated from `partition`.
    /// Pure transformation, failure always means malformed input.
    pub fn decode(payload: &[u8], partition: i32) -> Result<JobRow, DecodeError> {
        let mut row: JobRow = serde_json::from_slice(payload)?;
        row.source_partition = partition;
        Ok(row)
    }
}

// Upstream updates are sparse, a null is the same as an absent field.
fn default_on_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Sub-second precision is discarded, the store works at second granularity.
fn datetime_from_epoch_millis<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<i64>::deserialize(deserializer)?.unwrap_or_default();
    DateTime::from_timestamp(millis / 1000, 0)
        .ok_or_else(|| serde::de::Error::custom(format!("epoch millis out of range: {millis}")))
}

// Embedded NUL bytes would be rejected by the text columns downstream.
fn string_without_nul_bytes<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    if raw.contains('\0') {
        Ok(raw.replace('\0', ""))
    } else {
        Ok(raw)
    }
}
