use std::path::PathBuf;

use serde::Deserialize;

/// The configuration file as written by the user.
///
/// Numeric tunables are read as signed integers so that negative values are
/// reported as invalid settings instead of YAML type errors.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Maximum number of probes in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: i64,

    /// Per-probe deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i64,

    /// Sent as the `User-Agent` header on every probe.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Inline targets, probed and reported in this order.
    #[serde(default)]
    pub targets: Vec<TargetEntry>,

    /// Optional YAML or JSON list of targets, relative to the config file.
    /// Its entries are appended after the inline targets.
    #[serde(default)]
    pub targets_file: Option<PathBuf>,

    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,

    #[serde(default = "default_report_delimiter")]
    pub report_delimiter: char,

    /// Name servers to query instead of the system configuration.
    #[serde(default)]
    pub dns_hosts: Vec<String>,

    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` from the environment.
    #[serde(default = "default_true")]
    pub system_proxy: bool,
}

/// A target is either a bare URL or a map with a `url` key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TargetEntry {
    Url(String),
    Detailed { url: String },
}

impl TargetEntry {
    pub fn url(&self) -> &str {
        match self {
            TargetEntry::Url(url) | TargetEntry::Detailed { url } => url,
        }
    }
}

fn default_concurrency() -> i64 {
    10
}

fn default_timeout_ms() -> i64 {
    5000
}

fn default_user_agent() -> String {
    "UptimeOwl/1.0".to_string()
}

fn default_report_path() -> PathBuf {
    PathBuf::from("report.csv")
}

fn default_report_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}
