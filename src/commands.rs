use crate::cli::{Command, CreateJobArgs, DeleteJobArgs, DescribeJobArgs};
use crate::client::{ClientError, SchedulerClient};
use crate::config::Config;
use crate::model::{non_negative, Job};
use crate::present::Presenter;
use log::debug;
use thiserror::Error;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_REMOTE_ERROR: u8 = 1;
pub const EXIT_DELETE_FAILED: u8 = 2;
pub const EXIT_USAGE: u8 = 255;

#[derive(Debug, Error)]
pub enum CommandError {
    /// Invalid command-line input, detected before contacting the scheduler
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("Failed to load job stats: {0}")]
    JobStats(#[source] ClientError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CommandError {
    fn usage(message: &str) -> Self {
        Self::Usage(message.to_owned())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Client(_) | Self::JobStats(_) | Self::Output(_) => EXIT_REMOTE_ERROR,
        }
    }
}

/// The successful results of a command
#[derive(Debug, Eq, PartialEq)]
pub enum Outcome {
    Done,
    /// The scheduler declined to delete the job
    DeleteRefused,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Done => EXIT_SUCCESS,
            Self::DeleteRefused => EXIT_DELETE_FAILED,
        }
    }
}

/// Everything that a command needs to run
pub struct Context<'a> {
    pub config: &'a Config,
    pub client: &'a dyn SchedulerClient,
}

/// A command validates its input, makes its scheduler calls, and presents the result
pub trait Handler {
    fn run(&self, ctx: &Context, presenter: &mut Presenter) -> Result<Outcome, CommandError>;
}

struct StatsCommand;
struct ListJobsCommand;

/// Look up the handler for a parsed command
fn handler(command: &Command) -> &dyn Handler {
    match command {
        Command::Stats => &StatsCommand,
        Command::CreateJob(args) => args,
        Command::DeleteJob(args) => args,
        Command::ListJobs => &ListJobsCommand,
        Command::DescribeJob(args) => args,
    }
}

/// Run a command and return the process exit code
pub fn dispatch(command: &Command, ctx: &Context, presenter: &mut Presenter) -> u8 {
    let name = command.name();
    debug!("Running command {name}");
    match handler(command).run(ctx, presenter) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            debug!("Command {name} failed: {err:?}");
            // There is nowhere left to report a failure to write to stderr
            let _ = presenter.error(name, &err);
            err.exit_code()
        }
    }
}

/// Return the job id argument. Dot segments can't name a job because they
/// would address a different resource once placed in a URL path.
fn job_id(value: &Option<String>) -> Result<&str, CommandError> {
    const USAGE: &str = "The first argument is a job id.";
    match required(value, USAGE)? {
        "." | ".." => Err(CommandError::usage(USAGE)),
        id => Ok(id),
    }
}

/// Return a required positional argument, rejecting missing and empty values
fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, CommandError> {
    match value.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(CommandError::usage(message)),
    }
}

impl Handler for StatsCommand {
    fn run(&self, ctx: &Context, presenter: &mut Presenter) -> Result<Outcome, CommandError> {
        let stats = ctx.client.get_scheduler_stats()?;
        presenter.scheduler_stats(&stats)?;
        Ok(Outcome::Done)
    }
}

impl Handler for CreateJobArgs {
    fn run(&self, ctx: &Context, presenter: &mut Presenter) -> Result<Outcome, CommandError> {
        const USAGE: &str = "The first argument is a job name, the second is a schedule spec and the third is a command line to run.";
        let name = required(&self.name, USAGE)?;
        let schedule = required(&self.schedule, USAGE)?;
        let command = required(&self.command, USAGE)?;
        let retries = non_negative(self.retries).ok_or_else(|| {
            CommandError::usage("You cannot specify a negative value for --retries.")
        })?;

        let job = Job {
            name: name.to_owned(),
            schedule: schedule.to_owned(),
            command: command.to_owned(),
            owner: self
                .owner
                .clone()
                .unwrap_or_else(|| ctx.config.default_owner.clone()),
            retries,
            epsilon: self.epsilon.clone().unwrap_or_default(),
            ..Default::default()
        };
        debug!("Creating job {name} with schedule {schedule}");
        let id = ctx.client.create_job(&job)?;
        presenter.line(&id)?;
        Ok(Outcome::Done)
    }
}

impl Handler for DeleteJobArgs {
    fn run(&self, ctx: &Context, presenter: &mut Presenter) -> Result<Outcome, CommandError> {
        let id = job_id(&self.id)?;
        if ctx.client.delete_job(id)? {
            presenter.line("success")?;
            Ok(Outcome::Done)
        } else {
            presenter.line("failure")?;
            Ok(Outcome::DeleteRefused)
        }
    }
}

impl Handler for ListJobsCommand {
    fn run(&self, ctx: &Context, presenter: &mut Presenter) -> Result<Outcome, CommandError> {
        let jobs = ctx.client.list_jobs()?;
        debug!("Scheduler returned {} jobs", jobs.len());
        presenter.job_ids(&jobs)?;
        Ok(Outcome::Done)
    }
}

impl Handler for DescribeJobArgs {
    fn run(&self, ctx: &Context, presenter: &mut Presenter) -> Result<Outcome, CommandError> {
        let id = job_id(&self.id)?;
        let job = ctx.client.get_job(id)?;
        // Nothing is printed until every requested fetch has succeeded
        let stats = self
            .stats
            .then(|| ctx.client.get_job_stats(id))
            .transpose()
            .map_err(CommandError::JobStats)?;

        presenter.job(&job)?;
        if let Some(stats) = stats {
            presenter.job_stats(&stats)?;
        }
        Ok(Outcome::Done)
    }
}
