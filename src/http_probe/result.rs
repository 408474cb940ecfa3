use std::fmt;

/// A URL under observation, kept exactly as it was configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub url: String,
}

impl Target {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Why a probe produced no response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    DnsError,
    ConnectionRefused,
    /// Any other transport or protocol failure, with the raw error text.
    Other(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Timeout => f.write_str("Timeout"),
            ErrorKind::DnsError => f.write_str("DNSError"),
            ErrorKind::ConnectionRefused => f.write_str("ConnectionRefused"),
            ErrorKind::Other(message) => write!(f, "Other: {message}"),
        }
    }
}

/// Up means a response arrived, whatever its status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Up { status_code: u16 },
    Down { error: ErrorKind },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub target: String,
    pub outcome: Outcome,
    pub response_time_ms: u64,
}

impl ProbeResult {
    pub fn up(target: &Target, status_code: u16, response_time_ms: u64) -> Self {
        Self {
            target: target.url.clone(),
            outcome: Outcome::Up { status_code },
            response_time_ms,
        }
    }

    pub fn down(target: &Target, error: ErrorKind, response_time_ms: u64) -> Self {
        Self {
            target: target.url.clone(),
            outcome: Outcome::Down { error },
            response_time_ms,
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self.outcome, Outcome::Up { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self.outcome {
            Outcome::Up { status_code } => Some(status_code),
            Outcome::Down { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<&ErrorKind> {
        match &self.outcome {
            Outcome::Up { .. } => None,
            Outcome::Down { error } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_result_has_status_and_no_error() {
        let result = ProbeResult::up(&Target::new("https://ok.example"), 503, 12);
        assert!(result.is_up());
        assert_eq!(result.status_code(), Some(503));
        assert_eq!(result.error_kind(), None);
        assert_eq!(result.target, "https://ok.example");
    }

    #[test]
    fn down_result_has_error_and_no_status() {
        let result = ProbeResult::down(&Target::new("https://bad.example"), ErrorKind::DnsError, 3);
        assert!(!result.is_up());
        assert_eq!(result.status_code(), None);
        assert_eq!(result.error_kind(), Some(&ErrorKind::DnsError));
    }

    #[test]
    fn error_kind_labels() {
        assert_eq!(ErrorKind::Timeout.to_string(), "Timeout");
        assert_eq!(ErrorKind::DnsError.to_string(), "DNSError");
        assert_eq!(ErrorKind::ConnectionRefused.to_string(), "ConnectionRefused");
        assert_eq!(
            ErrorKind::Other("connection reset".to_string()).to_string(),
            "Other: connection reset"
        );
    }
}
