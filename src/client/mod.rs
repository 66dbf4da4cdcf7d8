mod http;
#[cfg(test)]
pub mod test_server;

pub use self::http::HttpClient;
use crate::model::{Job, JobStat, SchedulerStats};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint could not be reached or the request timed out
    #[error("request to scheduler failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The scheduler answered with a body that could not be decoded
    #[error("malformed response from scheduler: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{message}")]
    NotFound { message: String },

    #[error("\"{0}\" is not a valid job id")]
    InvalidJobId(String),

    #[error("{0} cannot be used as the scheduler endpoint")]
    InvalidEndpoint(String),

    /// The scheduler answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Service { status: u16, message: String },
}

/// The operations that the remote scheduler exposes. Every method performs
/// exactly one synchronous request and never retries.
pub trait SchedulerClient {
    /// Create a job and return the identifier that the scheduler assigned to it
    fn create_job(&self, job: &Job) -> Result<String, ClientError>;

    /// Delete a job, returning `false` if the scheduler reports that the job
    /// doesn't exist or couldn't be deleted
    fn delete_job(&self, id: &str) -> Result<bool, ClientError>;

    fn get_job(&self, id: &str) -> Result<Job, ClientError>;

    fn list_jobs(&self) -> Result<Vec<Job>, ClientError>;

    /// Load the run history of a job
    fn get_job_stats(&self, id: &str) -> Result<Vec<JobStat>, ClientError>;

    fn get_scheduler_stats(&self) -> Result<SchedulerStats, ClientError>;
}
