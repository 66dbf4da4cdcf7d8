use crate::format;
use crate::model::{Job, JobStat, SchedulerStats};
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::io::{Result, Write};

pub const PROGRAM: &str = env!("CARGO_PKG_NAME");

const SEPARATOR: &str = "---";

/// Pick one of two words to describe a boolean
pub fn format_bool<'a>(value: bool, true_word: &'a str, false_word: &'a str) -> &'a str {
    if value {
        true_word
    } else {
        false_word
    }
}

/// Renders scheduler data as line-oriented text. Results go to `out` and
/// errors go to `err`.
pub struct Presenter<'a> {
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
    now: DateTime<Utc>,
}

impl<'a> Presenter<'a> {
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self {
            out,
            err,
            now: Utc::now(),
        }
    }

    /// Override the time that relative dates are measured from
    #[cfg(test)]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    fn timestamp(&self, date: Option<&DateTime<Utc>>) -> String {
        format::timestamp(date, &self.now)
    }

    pub fn line(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{line}")
    }

    /// Render a labeled list of fields, leaving nothing after the colon for empty values
    fn fields(&mut self, fields: &[(&str, String)]) -> Result<()> {
        for (label, value) in fields {
            if value.is_empty() {
                writeln!(self.out, "{label}:")?;
            } else {
                writeln!(self.out, "{label}: {value}")?;
            }
        }
        Ok(())
    }

    pub fn job(&mut self, job: &Job) -> Result<()> {
        let lines = [
            ("Job id", job.id.clone()),
            ("Name", job.name.clone()),
            ("Disabled", format_bool(job.disabled, "yes", "no").to_owned()),
            ("Schedule", job.schedule.clone()),
            ("Owner", job.owner.clone()),
            ("Command", job.command.clone()),
            ("Retries", job.retries.to_string()),
            ("Epsilon", job.epsilon.clone()),
            ("Next run", self.timestamp(job.next_run_at.as_ref())),
            ("Parent jobs", job.parent_jobs.join(", ")),
            ("Dependent jobs", job.dependent_jobs.join(", ")),
            ("Success count", job.metadata.success_count.to_string()),
            ("Error count", job.metadata.error_count.to_string()),
            ("Last success", self.timestamp(job.metadata.last_success.as_ref())),
            ("Last error", self.timestamp(job.metadata.last_error.as_ref())),
            (
                "Last attempted run",
                self.timestamp(job.metadata.last_attempted_run.as_ref()),
            ),
        ];
        self.fields(&lines)
    }

    /// Render each run as a block that is preceded by a separator line
    pub fn job_stats(&mut self, stats: &[JobStat]) -> Result<()> {
        for (index, stat) in stats.iter().enumerate() {
            let ran_at = self.timestamp(stat.ran_at.as_ref());
            writeln!(self.out, "{SEPARATOR}")?;
            writeln!(self.out, "Repetition: {index}")?;
            writeln!(self.out, "Ran at: {ran_at}")?;
            writeln!(self.out, "Number of retries: {}", stat.number_of_retries)?;
            writeln!(
                self.out,
                "Status: {}",
                format_bool(stat.success, "success", "failed")
            )?;
            writeln!(
                self.out,
                "Execution duration: {}",
                format::execution_time(&stat.execution_duration)
            )?;
        }
        Ok(())
    }

    pub fn scheduler_stats(&mut self, stats: &SchedulerStats) -> Result<()> {
        let lines = [
            ("Stats retrieved at", self.timestamp(stats.created_at.as_ref())),
            ("Total jobs", stats.jobs.to_string()),
            ("Active jobs", stats.active_jobs.to_string()),
            ("Disabled jobs", stats.disabled_jobs.to_string()),
            ("Success count", stats.success_count.to_string()),
            ("Error count", stats.error_count.to_string()),
            ("Next run", self.timestamp(stats.next_run_at.as_ref())),
            ("Last attempted run", self.timestamp(stats.last_attempted_run.as_ref())),
        ];
        self.fields(&lines)
    }

    /// Render one job id per line
    pub fn job_ids(&mut self, jobs: &[Job]) -> Result<()> {
        for job in jobs {
            writeln!(self.out, "{}", job.id)?;
        }
        Ok(())
    }

    /// Report an error, prefixed by the qualified name of the command that failed
    pub fn error(&mut self, command: &str, message: &dyn Display) -> Result<()> {
        writeln!(self.err, "{PROGRAM} {command}: {message}")
    }
}
