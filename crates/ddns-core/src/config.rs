//! Configuration types for the DDNS client
//!
//! The configuration is a JSON document loaded once at startup and treated
//! as read-only input to every reconciliation cycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;
use std::time::Duration;

use crate::types::RecordType;

/// Smallest TTL accepted by Gandi LiveDNS
pub const MIN_TTL: u32 = 300;

/// Largest TTL accepted by Gandi LiveDNS (30 days)
pub const MAX_TTL: u32 = 2_592_000;

/// Default Gandi LiveDNS API base URL
pub const DEFAULT_API_BASE: &str = "https://api.gandi.net/v5/livedns";

/// Default IPv4 discovery endpoints, tried in order
pub const DEFAULT_IPV4_URLS: &[&str] = &["https://api.ipify.org", "https://ipv4.icanhazip.com"];

/// Default IPv6 discovery endpoints, tried in order
pub const DEFAULT_IPV6_URLS: &[&str] = &["https://api6.ipify.org", "https://ipv6.icanhazip.com"];

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Which record to manage and how to authenticate
    pub domain: DomainConfig,

    /// Reconciliation settings
    pub settings: SettingsConfig,

    /// Address discovery settings
    #[serde(default)]
    pub ip: IpConfig,

    /// Provider API settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with default settings for one record
    pub fn new(
        name: impl Into<String>,
        zone: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            domain: DomainConfig {
                name: name.into(),
                zone: zone.into(),
                api_key: api_key.into(),
            },
            settings: SettingsConfig::default(),
            ip: IpConfig::default(),
            provider: ProviderConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Parse a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.domain.validate()?;
        self.settings.validate()?;
        self.ip.validate()?;
        self.provider.validate()?;

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }

    /// Record types to manage, in processing order
    pub fn record_types(&self) -> &[RecordType] {
        &self.settings.record_types
    }

    /// Interval between reconciliation cycles
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.settings.update_interval_secs)
    }
}

/// The managed record: `<name>.<zone>`, or the zone apex when name is `@`
#[derive(Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Record name relative to the zone ("home", or "@" for the apex)
    pub name: String,

    /// Parent zone (e.g. "example.com")
    pub zone: String,

    /// Provider API key
    /// ⚠️ NEVER log or serialize this value
    #[serde(skip_serializing)]
    pub api_key: String,
}

// Custom Debug implementation that hides the API key
impl fmt::Debug for DomainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainConfig")
            .field("name", &self.name)
            .field("zone", &self.zone)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl DomainConfig {
    /// Fully qualified host name of the managed record
    pub fn fqdn(&self) -> String {
        if self.name == "@" {
            self.zone.clone()
        } else {
            format!("{}.{}", self.name, self.zone)
        }
    }

    /// Validate the domain configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::config("API key cannot be empty"));
        }
        if self.zone.is_empty() {
            return Err(crate::Error::config("Zone cannot be empty"));
        }
        validate_domain_name(&self.zone)?;
        if self.name != "@" {
            validate_domain_name(&self.name)?;
        }
        Ok(())
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Record types to manage; order is processing order
    #[serde(default = "default_record_types")]
    pub record_types: Vec<RecordType>,

    /// TTL written with every record
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Seconds between reconciliation cycles
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            record_types: default_record_types(),
            ttl: default_ttl(),
            update_interval_secs: default_update_interval_secs(),
        }
    }
}

impl SettingsConfig {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.record_types.is_empty() {
            return Err(crate::Error::config("No record types configured"));
        }

        for (i, record_type) in self.record_types.iter().enumerate() {
            if self.record_types[..i].contains(record_type) {
                return Err(crate::Error::config(format!(
                    "Record type {} configured more than once",
                    record_type
                )));
            }
        }

        if !(MIN_TTL..=MAX_TTL).contains(&self.ttl) {
            return Err(crate::Error::config(format!(
                "TTL must be between {} and {} seconds. Got: {}",
                MIN_TTL, MAX_TTL, self.ttl
            )));
        }

        if self.update_interval_secs == 0 {
            return Err(crate::Error::config("Update interval must be > 0"));
        }

        Ok(())
    }
}

/// Address discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpConfig {
    /// IPv4 discovery endpoints, tried in order
    #[serde(default = "default_ipv4_urls")]
    pub ipv4_urls: Vec<String>,

    /// IPv6 discovery endpoints, tried in order
    #[serde(default = "default_ipv6_urls")]
    pub ipv6_urls: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_ip_timeout_secs")]
    pub timeout_secs: u64,

    /// Static IPv4 address used instead of discovery
    #[serde(default)]
    pub ipv4: Option<Ipv4Addr>,

    /// Static IPv6 address used instead of discovery
    #[serde(default)]
    pub ipv6: Option<Ipv6Addr>,
}

impl Default for IpConfig {
    fn default() -> Self {
        Self {
            ipv4_urls: default_ipv4_urls(),
            ipv6_urls: default_ipv6_urls(),
            timeout_secs: default_ip_timeout_secs(),
            ipv4: None,
            ipv6: None,
        }
    }
}

impl IpConfig {
    /// Validate the address discovery configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP discovery timeout must be > 0"));
        }
        for url in self.ipv4_urls.iter().chain(&self.ipv6_urls) {
            validate_url(url)?;
        }
        Ok(())
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How the API key is presented to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: Apikey <key>`
    #[default]
    Apikey,
    /// `Authorization: Bearer <key>` (personal access tokens)
    Bearer,
}

impl AuthScheme {
    /// Authorization header value for a key
    pub fn header_value(&self, key: &str) -> String {
        match self {
            AuthScheme::Apikey => format!("Apikey {}", key),
            AuthScheme::Bearer => format!("Bearer {}", key),
        }
    }
}

/// Provider API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Authorization scheme
    #[serde(default)]
    pub auth_scheme: AuthScheme,

    /// Perform lookups but only log intended writes
    #[serde(default)]
    pub dry_run: bool,

    /// HTTP timeout in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            auth_scheme: AuthScheme::default(),
            dry_run: false,
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url(&self.api_base)?;
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Provider timeout must be > 0"));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn validate_url(url: &str) -> Result<(), crate::Error> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "URL must use HTTP or HTTPS scheme. Got: {}",
            url
        )));
    }
    Ok(())
}

/// Basic RFC 1035 label checks
fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }
        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn default_record_types() -> Vec<RecordType> {
    vec![RecordType::A, RecordType::Aaaa]
}

fn default_ttl() -> u32 {
    MIN_TTL
}

fn default_update_interval_secs() -> u64 {
    300
}

fn default_ipv4_urls() -> Vec<String> {
    DEFAULT_IPV4_URLS.iter().map(|s| s.to_string()).collect()
}

fn default_ipv6_urls() -> Vec<String> {
    DEFAULT_IPV6_URLS.iter().map(|s| s.to_string()).collect()
}

fn default_ip_timeout_secs() -> u64 {
    10
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    1000
}
