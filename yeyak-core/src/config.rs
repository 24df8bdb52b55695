//! Start-up configuration built from the process environment and `.env`.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use crate::filter::FilterCriteria;
use crate::output::ArtifactPaths;
use crate::retry::RetryPolicy;
use crate::service::DEFAULT_PAGE_SIZE;

/// Variable holding the open-data API key.
pub const API_KEY_VAR: &str = "SEOUL_API_KEY";
/// Variable overriding the API base URL.
pub const API_BASE_VAR: &str = "SEOUL_API_BASE";
/// Variable choosing the directory that holds the artifacts.
pub const OUTPUT_DIR_VAR: &str = "YEYAK_OUTPUT_DIR";
/// Public endpoint of the Seoul open-data API.
pub const DEFAULT_API_BASE: &str = "http://openapi.seoul.go.kr:8088";
/// Per-request timeout applied to every attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
/// Default location of the optional dotenv file.
pub const DOTENV_FILE: &str = ".env";

#[derive(thiserror::Error, Debug)]
/// Configuration problems that prevent a run from starting.
pub enum ConfigError {
    /// The API key is unset or blank.
    #[error("Missing SEOUL_API_KEY environment variable.")]
    MissingApiKey,
}

#[derive(Debug, Clone, Default)]
/// Immutable snapshot of environment variables taken once at start-up.
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Snapshot the process environment, completed by `./.env`.
    #[must_use]
    pub fn load() -> Self {
        Self::from_process().with_dotenv(Path::new(DOTENV_FILE))
    }

    /// Snapshot the process environment only.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_vars(env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    /// Build a snapshot from explicit pairs.
    #[must_use]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Add entries from a dotenv file without overriding existing variables.
    ///
    /// A missing file is ignored; malformed lines are skipped with a warning.
    /// Unquoted and double-quoted values expand `$VAR` references, single
    /// quoted values are taken literally.
    #[must_use]
    pub fn with_dotenv(mut self, path: &Path) -> Self {
        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(dotenvy::Error::Io(err)) if err.kind() == ErrorKind::NotFound => return self,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable dotenv file");
                return self;
            }
        };

        for entry in entries {
            match entry {
                Ok((key, value)) => {
                    if !key.is_empty() {
                        self.vars.entry(key).or_insert(value);
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping dotenv line");
                }
            }
        }

        self
    }

    /// Value of `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Trimmed value of `key`, treating blank values as unset.
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|value| !value.is_empty())
    }
}

#[derive(Clone)]
/// Everything the fetcher needs, resolved once before any request is made.
pub struct FetchConfig {
    /// Open-data API key.
    pub api_key: String,
    /// API base URL without trailing slash.
    pub api_base: String,
    /// Rows per page.
    pub page_size: u64,
    /// Timeout applied to each request.
    pub request_timeout: Duration,
    /// Retry budget for each page.
    pub retry: RetryPolicy,
    /// Filter conditions for the derived sets.
    pub criteria: FilterCriteria,
    /// Where the artifacts are written.
    pub artifacts: ArtifactPaths,
}

impl FetchConfig {
    /// Resolve the fetcher configuration from an environment snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when no usable API key is set.
    pub fn from_env(env: &Env) -> Result<Self, ConfigError> {
        let api_key = env
            .non_empty(API_KEY_VAR)
            .ok_or(ConfigError::MissingApiKey)?
            .to_owned();

        let api_base = env
            .non_empty(API_BASE_VAR)
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_owned();

        Ok(Self {
            api_key,
            api_base,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            criteria: FilterCriteria::default(),
            artifacts: ArtifactPaths::from_env(env),
        })
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FetchConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("page_size", &self.page_size)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .field("criteria", &self.criteria)
            .field("artifacts", &self.artifacts)
            .finish()
    }
}
