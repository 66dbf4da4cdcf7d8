use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "kala", about, version)]
pub struct Cli {
    /// Endpoint where the Kala API is running [default: http://localhost:8000]
    #[arg(short = 'E', long, global = true, env = "KALA_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Request timeout, such as "10s" or "1m 30s" [default: 30s]
    #[arg(long, global = true, env = "KALA_TIMEOUT")]
    pub timeout: Option<String>,

    /// Path to the config file
    #[arg(long, global = true, env = "KALA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug messages
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Display the scheduler's statistics
    #[command(alias = "stat")]
    Stats,

    /// Create a job
    CreateJob(CreateJobArgs),

    /// Delete a job
    DeleteJob(DeleteJobArgs),

    /// List all jobs
    ListJobs,

    /// Describe a job
    DescribeJob(DescribeJobArgs),
}

impl Command {
    /// The name that the command was registered under
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::CreateJob(_) => "create-job",
            Self::DeleteJob(_) => "delete-job",
            Self::ListJobs => "list-jobs",
            Self::DescribeJob(_) => "describe-job",
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct CreateJobArgs {
    /// Name of the job
    pub name: Option<String>,

    /// Schedule spec of the job
    pub schedule: Option<String>,

    /// Command line to run
    pub command: Option<String>,

    /// Email address of the job's owner [default: $USER]
    #[arg(long)]
    pub owner: Option<String>,

    /// Number of times to retry on failed attempt for each run
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub retries: i64,

    /// Duration in which it is safe to retry the job
    #[arg(long)]
    pub epsilon: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct DeleteJobArgs {
    /// Id of the job to delete
    pub id: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct DescribeJobArgs {
    /// Id of the job to describe
    pub id: Option<String>,

    /// Display the job's run statistics
    #[arg(long)]
    pub stats: bool,
}
