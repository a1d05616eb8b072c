// # HTTP IP Source
//
// This crate discovers the host's public addresses by asking plain-text
// "what is my IP" echo services (e.g. api.ipify.org, icanhazip.com).
//
// ## Architecture
//
// - One ordered URL list per family; the first URL that answers with an
//   address of the requested family wins
// - Each family has its own HTTP client bound to that family's unspecified
//   local address, so an IPv4 lookup can never leave over IPv6
// - A statically configured address short-circuits discovery entirely
//
// No caching: every call performs a fresh lookup. The engine calls at most
// once per family per cycle.

use async_trait::async_trait;
use ddns_core::config::IpConfig;
use ddns_core::traits::IpSource;
use ddns_core::types::IpFamily;
use ddns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

const SOURCE_NAME: &str = "http";

/// Discovery settings for one address family
struct FamilyLookup {
    urls: Vec<String>,
    client: reqwest::Client,
    /// Fixed answer; no request is made when set
    fixed: Option<IpAddr>,
}

/// HTTP echo-service IP source
pub struct HttpIpSource {
    v4: FamilyLookup,
    v6: FamilyLookup,
}

impl std::fmt::Debug for HttpIpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIpSource")
            .field("ipv4_urls", &self.v4.urls)
            .field("ipv6_urls", &self.v6.urls)
            .field("ipv4", &self.v4.fixed)
            .field("ipv6", &self.v6.fixed)
            .finish()
    }
}

impl HttpIpSource {
    /// Create a source querying the given URLs in order
    ///
    /// # Errors
    ///
    /// Fails if an HTTP client cannot be built.
    pub fn new(ipv4_urls: Vec<String>, ipv6_urls: Vec<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            v4: FamilyLookup {
                urls: ipv4_urls,
                client: family_client(IpAddr::V4(Ipv4Addr::UNSPECIFIED), timeout)?,
                fixed: None,
            },
            v6: FamilyLookup {
                urls: ipv6_urls,
                client: family_client(IpAddr::V6(Ipv6Addr::UNSPECIFIED), timeout)?,
                fixed: None,
            },
        })
    }

    /// Create a source from the `ip` configuration section
    pub fn from_config(config: &IpConfig) -> Result<Self> {
        let source = Self::new(
            config.ipv4_urls.clone(),
            config.ipv6_urls.clone(),
            config.timeout(),
        )?;
        Ok(source
            .with_static_ipv4(config.ipv4)
            .with_static_ipv6(config.ipv6))
    }

    /// Always answer IPv4 lookups with `addr`
    pub fn with_static_ipv4(mut self, addr: Option<Ipv4Addr>) -> Self {
        self.v4.fixed = addr.map(IpAddr::V4);
        self
    }

    /// Always answer IPv6 lookups with `addr`
    pub fn with_static_ipv6(mut self, addr: Option<Ipv6Addr>) -> Self {
        self.v6.fixed = addr.map(IpAddr::V6);
        self
    }

    fn lookup(&self, family: IpFamily) -> &FamilyLookup {
        match family {
            IpFamily::V4 => &self.v4,
            IpFamily::V6 => &self.v6,
        }
    }

    /// Ask one echo service for the address
    async fn query(client: &reqwest::Client, url: &str) -> Result<IpAddr> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::observation(format!(
                "{} answered HTTP {}",
                url,
                response.status()
            )));
        }

        let ip_text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response from {}: {}", url, e)))?;
        let ip_text = ip_text.trim();

        ip_text.parse().map_err(|_| {
            Error::observation(format!("Invalid IP address from {}: {}", url, ip_text))
        })
    }
}

fn family_client(local: IpAddr, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .local_address(local)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self, family: IpFamily) -> Result<IpAddr> {
        let lookup = self.lookup(family);

        if let Some(ip) = lookup.fixed {
            tracing::debug!("Using static {} address {}", family, ip);
            return Ok(ip);
        }

        let mut last_error = None;
        for url in &lookup.urls {
            match Self::query(&lookup.client, url).await {
                Ok(ip) if family.matches(&ip) => return Ok(ip),
                Ok(ip) => {
                    tracing::warn!("{} returned {} for an {} lookup", url, ip, family);
                    last_error = Some(Error::observation(format!(
                        "Expected {}, got: {}",
                        family, ip
                    )));
                }
                Err(e) => {
                    tracing::warn!("{} lookup via {} failed: {}", family, url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::observation(format!("No {} discovery URL configured", family))
        }))
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }
}
