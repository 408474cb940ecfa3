use std::env;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use super::model::{FileConfig, TargetEntry};
use crate::error::ConfigError;
use crate::http_probe::result::Target;
use crate::report::ReportFormat;

/// Everything the prober needs to build its HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub dns_hosts: Vec<IpAddr>,
    pub accept_invalid_certs: bool,
    pub system_proxy: bool,
}

/// Validated configuration for a single run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub targets: Vec<Target>,
    pub concurrency: usize,
    pub probe: ProbeSettings,
    pub report_path: PathBuf,
    pub report_format: ReportFormat,
}

pub fn config_file_location() -> PathBuf {
    env::var("CONFIG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yml"))
}

/// Load the run configuration from the file named by `CONFIG_FILE`
/// (default `config.yml`), with environment overrides applied on top.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_location(), |name| env::var(name).ok())
}

pub fn load_config_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let content = read_file(path)?;
    parse_config(&content, path, env)
}

/// Parse and validate `content`. `path` names the file for diagnostics and
/// anchors a relative `targets_file`.
pub fn parse_config(
    content: &str,
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let mut raw: FileConfig = parse_yaml(content, path)?;

    let mut entries = std::mem::take(&mut raw.targets);
    if let Some(targets_file) = &raw.targets_file {
        let targets_path = path.parent().unwrap_or_else(|| Path::new("")).join(targets_file);
        let listed: Vec<TargetEntry> = parse_yaml(&read_file(&targets_path)?, &targets_path)?;
        log::debug!("Loaded {} targets from {}", listed.len(), targets_path.display());
        entries.extend(listed);
    }

    apply_env_overrides(&mut raw, &env)?;
    validate(raw, entries)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_yaml<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T, ConfigError> {
    serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env_overrides(
    raw: &mut FileConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(value) = env("CONCURRENCY") {
        raw.concurrency = parse_env_int("CONCURRENCY", value)?;
    }
    if let Some(value) = env("TIMEOUT_MS") {
        raw.timeout_ms = parse_env_int("TIMEOUT_MS", value)?;
    }
    if let Some(value) = env("USER_AGENT") {
        raw.user_agent = value;
    }
    if let Some(value) = env("REPORT_PATH") {
        raw.report_path = PathBuf::from(value);
    }
    if let Some(value) = env("DNS_HOSTS") {
        raw.dns_hosts = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    Ok(())
}

fn parse_env_int(name: &'static str, value: String) -> Result<i64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv { name, value })
}

fn validate(raw: FileConfig, entries: Vec<TargetEntry>) -> Result<AppConfig, ConfigError> {
    let concurrency = usize::try_from(raw.concurrency)
        .ok()
        .filter(|c| *c > 0)
        .ok_or(ConfigError::InvalidConcurrency(raw.concurrency))?;

    let timeout_ms = u64::try_from(raw.timeout_ms)
        .ok()
        .filter(|t| *t > 0)
        .ok_or(ConfigError::InvalidTimeout(raw.timeout_ms))?;

    if raw.user_agent.trim().is_empty() {
        return Err(ConfigError::EmptyUserAgent);
    }

    if entries.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    let targets = entries
        .iter()
        .map(|entry| validate_target(entry.url()))
        .collect::<Result<Vec<_>, _>>()?;

    let report_format = ReportFormat::new(raw.report_delimiter)?;

    let dns_hosts = raw
        .dns_hosts
        .iter()
        .map(|host| host.parse().map_err(|_| ConfigError::InvalidDnsHost(host.clone())))
        .collect::<Result<Vec<IpAddr>, _>>()?;

    Ok(AppConfig {
        targets,
        concurrency,
        probe: ProbeSettings {
            timeout: Duration::from_millis(timeout_ms),
            user_agent: raw.user_agent,
            dns_hosts,
            accept_invalid_certs: raw.accept_invalid_certs,
            system_proxy: raw.system_proxy,
        },
        report_path: raw.report_path,
        report_format,
    })
}

fn validate_target(raw: &str) -> Result<Target, ConfigError> {
    let url = raw.trim();
    let parsed = Url::parse(url).map_err(|source| ConfigError::InvalidTarget {
        url: url.to_string(),
        source,
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(Target::new(url)),
        scheme => Err(ConfigError::UnsupportedScheme {
            url: url.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(yaml: &str) -> Result<AppConfig, ConfigError> {
        parse_config(yaml, Path::new("config.yml"), no_env)
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse("targets: [https://ok.example, https://ok.example]").expect("valid config");

        assert_eq!(config.concurrency, 10);
        assert_eq!(config.probe.timeout, Duration::from_millis(5000));
        assert_eq!(config.probe.user_agent, "UptimeOwl/1.0");
        assert!(config.probe.dns_hosts.is_empty());
        assert_eq!(config.report_path, PathBuf::from("report.csv"));
        assert_eq!(config.report_format, ReportFormat::default());
        // duplicates are kept, verbatim
        assert_eq!(
            config.targets,
            vec![Target::new("https://ok.example"), Target::new("https://ok.example")]
        );
    }

    #[test]
    fn non_positive_concurrency_is_an_error() {
        for value in ["0", "-1"] {
            let err = parse(&format!("concurrency: {value}\ntargets: [https://ok.example]")).expect_err("must fail");
            assert!(matches!(err, ConfigError::InvalidConcurrency(_)), "{value}: {err}");
        }
    }

    #[test]
    fn non_positive_timeout_is_an_error() {
        let err = parse("timeout_ms: 0\ntargets: [https://ok.example]").expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidTimeout(0)));
    }

    #[test]
    fn empty_target_list_is_an_error() {
        assert!(matches!(parse("concurrency: 2"), Err(ConfigError::NoTargets)));
        assert!(matches!(parse("targets: []"), Err(ConfigError::NoTargets)));
    }

    #[test]
    fn malformed_and_non_http_targets_are_rejected() {
        assert!(matches!(
            parse("targets: ['not a url']"),
            Err(ConfigError::InvalidTarget { .. })
        ));
        assert!(matches!(
            parse("targets: ['ftp://files.example']"),
            Err(ConfigError::UnsupportedScheme { scheme, .. }) if scheme == "ftp"
        ));
    }

    #[test]
    fn blank_user_agent_and_bad_dns_host_are_rejected() {
        assert!(matches!(
            parse("user_agent: '  '\ntargets: [https://ok.example]"),
            Err(ConfigError::EmptyUserAgent)
        ));
        assert!(matches!(
            parse("dns_hosts: [dns.google]\ntargets: [https://ok.example]"),
            Err(ConfigError::InvalidDnsHost(host)) if host == "dns.google"
        ));
    }

    #[test]
    fn environment_overrides_the_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CONCURRENCY", "3"),
            ("TIMEOUT_MS", "750"),
            ("USER_AGENT", "probe/9"),
            ("REPORT_PATH", "/tmp/out.csv"),
            ("DNS_HOSTS", "1.1.1.1, 8.8.8.8,"),
        ]);

        let config = parse_config(
            "concurrency: 50\ntargets: [https://ok.example]",
            Path::new("config.yml"),
            |name| env.get(name).map(|v| v.to_string()),
        )
        .expect("valid config");

        assert_eq!(config.concurrency, 3);
        assert_eq!(config.probe.timeout, Duration::from_millis(750));
        assert_eq!(config.probe.user_agent, "probe/9");
        assert_eq!(config.report_path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(
            config.probe.dns_hosts,
            vec![IpAddr::from([1, 1, 1, 1]), IpAddr::from([8, 8, 8, 8])]
        );
    }

    #[test]
    fn unparsable_environment_override_is_an_error() {
        let err = parse_config("targets: [https://ok.example]", Path::new("config.yml"), |name| {
            (name == "CONCURRENCY").then(|| "lots".to_string())
        })
        .expect_err("must fail");

        assert!(matches!(err, ConfigError::InvalidEnv { name: "CONCURRENCY", .. }));
    }

    #[test]
    fn targets_file_is_read_relative_to_the_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("websites.json"),
            r#"["https://b.example", "https://c.example"]"#,
        )
        .expect("write targets");
        let config_path = dir.path().join("config.yml");
        std::fs::write(&config_path, "targets: [https://a.example]\ntargets_file: websites.json\n")
            .expect("write config");

        let config = load_config_from(&config_path, no_env).expect("valid config");

        let urls: Vec<String> = config.targets.into_iter().map(|t| t.url).collect();
        assert_eq!(urls, vec!["https://a.example", "https://b.example", "https://c.example"]);
    }

    #[test]
    fn missing_config_file_is_a_read_error() {
        let err = load_config_from(Path::new("/nonexistent/uptimeowl.yml"), no_env).expect_err("must fail");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
