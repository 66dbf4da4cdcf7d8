use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// A scheduled unit of work as the scheduler describes it
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Job {
    /// Assigned by the scheduler on creation, empty before that
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub schedule: String,
    pub command: String,
    pub owner: String,
    pub retries: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub epsilon: String,
    pub disabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub parent_jobs: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub dependent_jobs: Vec<String>,
    #[serde(with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
    pub metadata: Metadata,
}

/// Aggregate execution history of a job
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Metadata {
    pub success_count: u64,
    pub error_count: u64,
    #[serde(with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub last_error: Option<DateTime<Utc>>,
    #[serde(with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub last_attempted_run: Option<DateTime<Utc>>,
}

/// One historical run of a job
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct JobStat {
    pub job_id: String,
    #[serde(with = "timestamp")]
    pub ran_at: Option<DateTime<Utc>>,
    pub number_of_retries: u64,
    pub success: bool,
    #[serde(with = "nanoseconds")]
    pub execution_duration: Duration,
}

/// Point-in-time snapshot of the whole scheduler
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SchedulerStats {
    #[serde(with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    pub jobs: u64,
    pub active_jobs: u64,
    pub disabled_jobs: u64,
    pub success_count: u64,
    pub error_count: u64,
    #[serde(with = "timestamp")]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub last_attempted_run: Option<DateTime<Utc>>,
}

/// Convert a signed count into a retry count, rejecting negative values
pub fn non_negative(value: i64) -> Option<u64> {
    u64::try_from(value).ok()
}

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339 timestamps where empty strings, `null` and the zero time
/// `0001-01-01T00:00:00Z` all mean "never"
mod timestamp {
    use chrono::{DateTime, Datelike, SecondsFormat, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => {
                serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        let raw = match raw.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(raw) => raw,
        };
        let timestamp = DateTime::parse_from_rfc3339(raw)
            .map_err(|err| Error::custom(format!("invalid timestamp \"{raw}\": {err}")))?
            .with_timezone(&Utc);
        Ok((timestamp.year() > 1).then_some(timestamp))
    }
}

/// Durations encoded as an integer number of nanoseconds
mod nanoseconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(value.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Negative durations can only come from clock skew on the server
        let nanos = Option::<i64>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Duration::from_nanos(u64::try_from(nanos).unwrap_or_default()))
    }
}
