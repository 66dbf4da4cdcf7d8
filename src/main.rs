mod cli;
mod client;
mod commands;
mod config;
mod format;
mod model;
mod present;

use crate::cli::Cli;
use crate::client::HttpClient;
use crate::commands::{Context, EXIT_SUCCESS, EXIT_USAGE};
use crate::config::{Config, Env, Overrides};
use crate::present::{Presenter, PROGRAM};
use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, SetLoggerError};
use std::io::{stderr, stdout, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(parse_error_code(&err));
        }
    };

    if let Err(err) = init_logger(&cli) {
        eprintln!("{PROGRAM} {}: {err}", cli.command.name());
        return ExitCode::from(EXIT_USAGE);
    }

    let code = execute(
        &cli,
        &Env::from_host(),
        &mut stdout().lock(),
        &mut stderr().lock(),
    );
    ExitCode::from(code)
}

/// Exit code for a failed argument parse. --help and --version are reported
/// as errors that print to stdout.
fn parse_error_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        EXIT_USAGE
    } else {
        EXIT_SUCCESS
    }
}

fn init_logger(cli: &Cli) -> Result<(), SetLoggerError> {
    simple_logger::SimpleLogger::new()
        .with_level(if cli.verbose {
            LevelFilter::Debug
        } else if cli.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Warn
        })
        .with_module_level("reqwest", LevelFilter::Warn)
        .with_module_level("hyper", LevelFilter::Warn)
        .with_module_level("rustls", LevelFilter::Warn)
        .init()
}

/// Resolve the configuration and build the scheduler client
fn setup(cli: &Cli, env: &Env) -> Result<(Config, HttpClient)> {
    let overrides = Overrides {
        endpoint: cli.endpoint.as_deref(),
        timeout: cli.timeout.as_deref(),
    };
    let config = Config::load(cli.config.as_deref(), &overrides, env)?;
    let client = HttpClient::new(&config)?;
    Ok((config, client))
}

/// Run the parsed command and return the process exit code. Setup failures are
/// reported through the presenter like any other usage error.
fn execute(cli: &Cli, env: &Env, out: &mut dyn Write, err: &mut dyn Write) -> u8 {
    let mut presenter = Presenter::new(out, err);
    let name = cli.command.name();
    match setup(cli, env) {
        Ok((config, client)) => {
            let ctx = Context {
                config: &config,
                client: &client,
            };
            commands::dispatch(&cli.command, &ctx, &mut presenter)
        }
        Err(err) => {
            let _ = presenter.error(name, &format!("{err:#}"));
            EXIT_USAGE
        }
    }
}
