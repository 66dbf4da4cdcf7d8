use anyhow::{bail, Context, Result};
use log::debug;
use reqwest::Url;
use serde::Deserialize;
use std::env::var;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The parts of the host environment that the client depends on
pub struct Env {
    pub user: Option<String>,
    pub config_dir: Option<PathBuf>,
}

impl Env {
    /// Construct an environment from the user's host environment
    pub fn from_host() -> Self {
        let config_dir = directories::ProjectDirs::from("com", "kala", "kala")
            .map(|project_dirs| project_dirs.config_dir().to_owned());
        Self {
            user: var("USER").or_else(|_| var("USERNAME")).ok(),
            config_dir,
        }
    }

    /// Construct a mock environment for tests
    #[cfg(test)]
    pub fn mock() -> Self {
        Self {
            user: Some("user".to_owned()),
            config_dir: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub endpoint: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub owner: Option<String>,
}

impl RawConfig {
    /// Load the config file. An explicitly requested file must exist, but the
    /// default config file is optional.
    pub fn load(explicit_path: Option<&Path>, env: &Env) -> Result<Self> {
        let path = match explicit_path {
            Some(path) => path.to_owned(),
            None => match &env.config_dir {
                Some(config_dir) => {
                    let path = config_dir.join("config.toml");
                    if !path.exists() {
                        return Ok(Self::default());
                    }
                    path
                }
                None => return Ok(Self::default()),
            },
        };

        debug!("Loading config file {}", path.display());
        let toml_str = read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&toml_str)
            .with_context(|| format!("Failed to deserialize TOML config file {}", path.display()))
    }
}

/// Command-line values that take precedence over the config file
#[derive(Default)]
pub struct Overrides<'a> {
    pub endpoint: Option<&'a str>,
    pub timeout: Option<&'a str>,
}

/// Process-wide configuration, resolved once at startup
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub endpoint: Url,
    pub timeout: Duration,
    pub default_owner: String,
}

impl Config {
    pub fn from_raw(raw: RawConfig, overrides: &Overrides, env: &Env) -> Result<Self> {
        let endpoint = overrides
            .endpoint
            .or(raw.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT);
        let timeout = match overrides.timeout {
            Some(timeout) => humantime::parse_duration(timeout)
                .with_context(|| format!("Invalid timeout \"{timeout}\""))?,
            None => raw.timeout.unwrap_or(DEFAULT_TIMEOUT),
        };

        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            timeout,
            default_owner: raw
                .owner
                .or_else(|| env.user.clone())
                .unwrap_or_default(),
        })
    }

    /// Load the configuration from the config file and the command-line overrides
    pub fn load(config_path: Option<&Path>, overrides: &Overrides, env: &Env) -> Result<Self> {
        let config = Self::from_raw(RawConfig::load(config_path, env)?, overrides, env)?;
        debug!("Using scheduler endpoint {}", config.endpoint);
        Ok(config)
    }

    /// Construct a mock config for tests
    #[cfg(test)]
    pub fn mock() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).unwrap(),
            timeout: Duration::from_secs(5),
            default_owner: "user".to_owned(),
        }
    }
}

/// Validate a scheduler endpoint
fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint).with_context(|| format!("Invalid endpoint \"{endpoint}\""))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("Invalid endpoint \"{endpoint}\": scheme must be http or https");
    }
    Ok(url)
}
