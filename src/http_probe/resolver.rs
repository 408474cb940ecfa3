use std::error::Error as StdError;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use thiserror::Error;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts},
    error::ResolveError,
};

/// Raised by [`DnsResolver`] so that name resolution failures can be told
/// apart from connect failures further down the error chain.
#[derive(Debug, Error)]
#[error("failed to resolve {host}: {reason}")]
pub struct DnsLookupError {
    pub host: String,
    reason: String,
}

/// reqwest resolver backed by trust-dns.
#[derive(Clone)]
pub struct DnsResolver {
    inner: TokioAsyncResolver,
}

impl DnsResolver {
    /// Use the given name servers, or the system configuration when none are given.
    pub fn new(dns_hosts: &[IpAddr]) -> Result<Self, ResolveError> {
        if dns_hosts.is_empty() {
            let inner = TokioAsyncResolver::tokio_from_system_conf()?;
            log::debug!("Using system DNS configuration");
            Ok(Self { inner })
        } else {
            Ok(Self::with_name_servers(dns_hosts))
        }
    }

    /// Queries the name servers over TCP with 2 attempts and a small cache.
    pub fn with_name_servers(dns_hosts: &[IpAddr]) -> Self {
        let mut opts = ResolverOpts::default();
        opts.attempts = 2;
        opts.timeout = Duration::from_secs(2);
        opts.cache_size = 1024;

        let mut name_servers = NameServerConfigGroup::new();
        for ip in dns_hosts {
            name_servers.push(NameServerConfig {
                socket_addr: SocketAddr::new(*ip, 53),
                protocol: Protocol::Tcp,
                tls_dns_name: None,
                trust_negative_responses: false,
                bind_addr: None,
            });
        }

        log::debug!("Using DNS hosts: {:?}", dns_hosts);
        let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
        Self {
            inner: TokioAsyncResolver::tokio(resolver_config, opts),
        }
    }
}

impl Resolve for DnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.inner.clone();
        let host = name.as_str().to_string();

        Box::pin(async move {
            let lookup = resolver
                .lookup_ip(host.as_str())
                .await
                .map_err(|e| lookup_error(&host, e.to_string()))?;

            // reqwest fills in the port of the request URL
            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();
            if addrs.is_empty() {
                return Err(lookup_error(&host, "no addresses returned".to_string()));
            }

            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}

fn lookup_error(host: &str, reason: String) -> Box<dyn StdError + Send + Sync> {
    Box::new(DnsLookupError {
        host: host.to_string(),
        reason,
    })
}
