pub mod console;

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::ConfigError;
use crate::http_probe::result::{Outcome, ProbeResult};

pub const DEFAULT_DELIMITER: char = ',';

const HEADER: [&str; 5] = ["URL", "Status", "StatusCode", "ResponseTimeMs", "Error"];

/// Up/down counts for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub up: usize,
    pub down: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "total={} up={} down={}", self.total, self.up, self.down)
    }
}

pub fn summarize(results: &[ProbeResult]) -> RunSummary {
    let up = results.iter().filter(|r| r.is_up()).count();
    RunSummary {
        total: results.len(),
        up,
        down: results.len() - up,
    }
}

/// Renders `results` with the default delimiter.
pub fn render(results: &[ProbeResult]) -> Vec<u8> {
    ReportFormat::default().render(results)
}

/// Creates (or truncates) the report file up front, so an unwritable path
/// is reported before anything is probed.
pub fn open_sink(path: &Path) -> Result<File, ConfigError> {
    File::create(path).map_err(|source| ConfigError::ReportSink {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_report(sink: &mut impl Write, report: &[u8]) -> io::Result<()> {
    sink.write_all(report)?;
    sink.flush()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFormat {
    delimiter: char,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl ReportFormat {
    pub fn new(delimiter: char) -> Result<Self, ConfigError> {
        if matches!(delimiter, '"' | '\r' | '\n') {
            return Err(ConfigError::InvalidDelimiter(delimiter));
        }
        Ok(Self { delimiter })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// One header row, then one row per result in the order given.
    pub fn render(&self, results: &[ProbeResult]) -> Vec<u8> {
        let mut out = String::new();
        self.push_row(&mut out, HEADER.iter().map(|h| h.to_string()));

        for result in results {
            let (status, status_code, error) = match &result.outcome {
                Outcome::Up { status_code } => ("UP", status_code.to_string(), String::new()),
                Outcome::Down { error } => ("DOWN", String::new(), error.to_string()),
            };
            self.push_row(
                &mut out,
                [
                    result.target.clone(),
                    status.to_string(),
                    status_code,
                    result.response_time_ms.to_string(),
                    error,
                ],
            );
        }

        out.into_bytes()
    }

    fn push_row(&self, out: &mut String, fields: impl IntoIterator<Item = String>) {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push(self.delimiter);
            }
            self.push_field(out, &field);
        }
        out.push('\n');
    }

    fn push_field(&self, out: &mut String, field: &str) {
        let needs_quotes = field.contains(self.delimiter) || field.contains(['"', '\r', '\n']);
        if !needs_quotes {
            out.push_str(field);
            return;
        }

        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    }
}
