use std::path::PathBuf;

use thiserror::Error;

/// Errors that make a run impossible before any target is probed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("concurrency must be a positive integer, got {0}")]
    InvalidConcurrency(i64),

    #[error("timeout_ms must be a positive integer, got {0}")]
    InvalidTimeout(i64),

    #[error("user_agent must not be empty")]
    EmptyUserAgent,

    #[error("no targets configured")]
    NoTargets,

    #[error("invalid target URL {url:?}: {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {scheme:?} in target {url:?}, expected http or https")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("report delimiter {0:?} is not allowed")]
    InvalidDelimiter(char),

    #[error("invalid DNS host {0:?}")]
    InvalidDnsHost(String),

    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("report file {path} is not writable: {source}")]
    ReportSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level failures. Per-target failures never end up here; they are
/// reported as `Down` results instead.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to set up DNS resolver: {0}")]
    Resolver(#[from] trust_dns_resolver::error::ResolveError),

    #[error("failed to write report to {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
