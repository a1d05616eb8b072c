// # Gandi LiveDNS Provider
//
// This crate provides the Gandi LiveDNS v5 provider for the DDNS client.
//
// The provider is isolated, stateless and single-shot: every trait call is
// exactly one HTTP request. Deciding *what* to write belongs to the
// reconciler, and retrying belongs to the next scheduled cycle.
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - Provider MUST fail fast if the key is empty
//
// ## API Reference
//
// - List rrsets:    GET  `/domains/:zone/records/:name`
// - Create rrset:   POST `/domains/:zone/records/:name/:type`  -> 201
// - Replace rrset:  PUT  `/domains/:zone/records/:name/:type`  -> 200/201
//
// Write bodies are `{"rrset_values": [<ip>], "rrset_ttl": <ttl>}`.

use async_trait::async_trait;
use ddns_core::config::{AuthScheme, DdnsConfig, DomainConfig, ProviderConfig};
use ddns_core::traits::DnsProvider;
use ddns_core::types::{Operation, RecordType, Rrset, WriteJob, WriteOutcome};
use ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER_NAME: &str = "gandi";

/// Body returned by LiveDNS on writes, e.g. `{"message": "DNS Record Created"}`
#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: Option<String>,
}

/// Gandi LiveDNS provider for one record name
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform the record listing (GET)
/// - Log the intended POST/PUT payload
/// - **NOT** actually modify DNS records
pub struct GandiProvider {
    /// API key or personal access token
    /// ⚠️ NEVER log this value
    api_key: String,

    /// How the key is sent
    auth_scheme: AuthScheme,

    /// API base URL without trailing slash
    api_base: String,

    /// Parent zone
    zone: String,

    /// Record name relative to the zone ("@" for the apex)
    name: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GandiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiProvider")
            .field("api_key", &"<REDACTED>")
            .field("auth_scheme", &self.auth_scheme)
            .field("api_base", &self.api_base)
            .field("zone", &self.zone)
            .field("name", &self.name)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl GandiProvider {
    /// Create a provider for the record described by `domain`
    ///
    /// # Errors
    ///
    /// Fails if the API key is empty or the HTTP client cannot be built.
    pub fn new(domain: &DomainConfig, provider: &ProviderConfig) -> Result<Self> {
        if domain.api_key.trim().is_empty() {
            return Err(Error::config("Gandi API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider.timeout_secs))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        if provider.dry_run {
            tracing::warn!("Gandi provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            api_key: domain.api_key.clone(),
            auth_scheme: provider.auth_scheme,
            api_base: provider.api_base.trim_end_matches('/').to_string(),
            zone: domain.zone.clone(),
            name: domain.name.clone(),
            client,
            dry_run: provider.dry_run,
        })
    }

    /// Create a provider from the full client configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(&config.domain, &config.provider)
    }

    /// Whether writes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// URL listing every rrset of the managed name
    fn records_url(&self) -> String {
        format!(
            "{}/domains/{}/records/{}",
            self.api_base, self.zone, self.name
        )
    }

    /// URL of one rrset of the managed name
    fn rrset_url(&self, record_type: RecordType) -> String {
        format!("{}/{}", self.records_url(), record_type)
    }

    fn authorization(&self) -> String {
        self.auth_scheme.header_value(&self.api_key)
    }

    async fn error_body(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string())
    }
}

#[async_trait]
impl DnsProvider for GandiProvider {
    /// List the rrsets of the managed name
    ///
    /// ```http
    /// GET /domains/example.com/records/home
    /// Authorization: Apikey <key>
    /// ```
    ///
    /// A 404 means the name has no rrsets yet and yields an empty list.
    async fn list_records(&self) -> Result<Vec<Rrset>> {
        let url = self.records_url();
        tracing::debug!("Listing rrsets: {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("No rrsets exist for {}", self.name);
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = Self::error_body(response).await;
            return Err(Error::from_status(
                PROVIDER_NAME,
                "Record lookup",
                status.as_u16(),
                &body,
            ));
        }

        response
            .json::<Vec<Rrset>>()
            .await
            .map_err(|e| Error::fetch(format!("Failed to parse response: {}", e)))
    }

    /// Create (POST) or replace (PUT) one rrset
    ///
    /// ```http
    /// POST /domains/example.com/records/home/A
    /// {"rrset_values": ["192.0.2.1"], "rrset_ttl": 300}
    /// ```
    async fn write_record(&self, job: &WriteJob) -> Result<WriteOutcome> {
        let url = self.rrset_url(job.record_type);
        let payload = serde_json::json!({
            "rrset_values": [job.value.to_string()],
            "rrset_ttl": job.ttl,
        });

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send {} request to {} with payload: {}",
                method_name(job.operation),
                url,
                payload
            );
            return Ok(WriteOutcome {
                status: 0,
                message: Some("dry-run".to_string()),
            });
        }

        let request = match job.operation {
            Operation::Create => self.client.post(&url),
            Operation::Update => self.client.put(&url),
        };

        let response = request
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::write(job.record_type, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::CREATED && status != StatusCode::OK {
            let body = Self::error_body(response).await;
            let context = match job.operation {
                Operation::Create => "Record create",
                Operation::Update => "Record update",
            };
            let cause = Error::from_status(PROVIDER_NAME, context, status.as_u16(), &body);
            return Err(Error::write(job.record_type, cause.to_string()));
        }

        // A success without a readable message is still a success
        let message = response
            .json::<ApiMessage>()
            .await
            .ok()
            .and_then(|body| body.message);

        Ok(WriteOutcome {
            status: status.as_u16(),
            message,
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn method_name(operation: Operation) -> &'static str {
    match operation {
        Operation::Create => "POST",
        Operation::Update => "PUT",
    }
}
