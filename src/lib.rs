pub mod config;
pub mod error;
pub mod http_probe;
pub mod report;
pub mod runner;
pub mod scheduler;

pub use config::app_config::{AppConfig, ProbeSettings, load_config};
pub use error::{ConfigError, RunError};
pub use http_probe::prelude::*;
pub use report::{ReportFormat, RunSummary, render, summarize};
pub use scheduler::{Scheduler, run};
