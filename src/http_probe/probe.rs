use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::Instant;

use super::error_chain;
use super::resolver::{DnsLookupError, DnsResolver};
use super::result::{ErrorKind, ProbeResult, Target};
use crate::config::app_config::ProbeSettings;
use crate::error::RunError;

/// One availability check of a single target.
///
/// Implementations must never fail: every transport problem is folded into
/// a `Down` result, and each call is independent of every other call.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target, timeout: Duration) -> ProbeResult;
}

pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(settings: &ProbeSettings) -> Result<Self, RunError> {
        let resolver = DnsResolver::new(&settings.dns_hosts)?;

        let mut builder = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .dns_resolver(Arc::new(resolver));
        if !settings.system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target, timeout: Duration) -> ProbeResult {
        let start = Instant::now();
        let response = self.client.get(&target.url).timeout(timeout).send().await;
        let elapsed = elapsed_ms(start);

        // Any response counts as up; status codes are not interpreted here.
        match response {
            Ok(resp) => ProbeResult::up(target, resp.status().as_u16(), elapsed),
            Err(err) => {
                let kind = classify(&err);
                log::debug!("Probe of {} failed: {}", target, error_chain(&err));
                ProbeResult::down(target, kind, elapsed)
            }
        }
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Maps a transport failure onto the error taxonomy. The first recognised
/// cause in the source chain wins.
pub(crate) fn classify(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        return ErrorKind::Timeout;
    }

    let mut cause: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(current) = cause {
        if current.downcast_ref::<DnsLookupError>().is_some() {
            return ErrorKind::DnsError;
        }
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return ErrorKind::ConnectionRefused,
                io::ErrorKind::TimedOut => return ErrorKind::Timeout,
                _ => {}
            }
        }
        cause = current.source();
    }

    ErrorKind::Other(error_chain(err))
}
