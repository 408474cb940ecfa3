use std::fs::File;
use std::sync::Arc;

use crate::config::app_config::AppConfig;
use crate::error::RunError;
use crate::http_probe::probe::HttpProber;
use crate::report;
use crate::scheduler::Scheduler;

/// Everything a run needs once setup has succeeded.
pub struct PreparedRun {
    pub scheduler: Scheduler,
    pub sink: File,
}

/// Builds the HTTP client first and opens the report file last, so a setup
/// failure never truncates a previous report. Nothing is probed here.
pub fn prepare(config: &AppConfig) -> Result<PreparedRun, RunError> {
    let prober = Arc::new(HttpProber::new(&config.probe)?);
    let scheduler = Scheduler::new(prober, config.concurrency, config.probe.timeout)?;
    let sink = report::open_sink(&config.report_path)?;

    Ok(PreparedRun { scheduler, sink })
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use crate::config::app_config::ProbeSettings;
    use crate::error::ConfigError;
    use crate::http_probe::result::Target;
    use crate::report::ReportFormat;

    fn config(report_path: &Path, user_agent: &str) -> AppConfig {
        AppConfig {
            targets: vec![Target::new("https://ok.example")],
            concurrency: 4,
            probe: ProbeSettings {
                timeout: Duration::from_secs(1),
                user_agent: user_agent.to_string(),
                dns_hosts: vec![IpAddr::from([127, 0, 0, 1])],
                accept_invalid_certs: false,
                system_proxy: false,
            },
            report_path: report_path.to_path_buf(),
            report_format: ReportFormat::default(),
        }
    }

    #[tokio::test]
    async fn failed_client_setup_leaves_previous_report_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report_path = dir.path().join("report.csv");
        std::fs::write(&report_path, "previous run\n").expect("write old report");

        // Not a valid header value, so the HTTP client refuses to build.
        let result = prepare(&config(&report_path, "bad\nagent"));

        assert!(matches!(result, Err(RunError::HttpClient(_))));
        let kept = std::fs::read_to_string(&report_path).expect("read old report");
        assert_eq!(kept, "previous run\n");
    }

    #[tokio::test]
    async fn successful_setup_opens_a_fresh_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report_path = dir.path().join("report.csv");
        std::fs::write(&report_path, "previous run\n").expect("write old report");

        let prepared = prepare(&config(&report_path, "UptimeOwl/1.0")).expect("setup succeeds");

        assert_eq!(prepared.scheduler.concurrency(), 4);
        assert_eq!(prepared.scheduler.timeout(), Duration::from_secs(1));
        assert_eq!(std::fs::read_to_string(&report_path).expect("read report"), "");
    }

    #[tokio::test]
    async fn unwritable_report_path_fails_setup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report_path = dir.path().join("missing").join("report.csv");

        let result = prepare(&config(&report_path, "UptimeOwl/1.0"));

        assert!(matches!(result, Err(RunError::Config(ConfigError::ReportSink { .. }))));
    }
}
