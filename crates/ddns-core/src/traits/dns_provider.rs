// # DNS Provider Trait
//
// Defines the interface for reading and writing the managed record's
// rrsets through a provider API.
//
// ## Implementations
//
// - Gandi LiveDNS: `ddns-provider-gandi` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DnsProvider, types::WriteJob, types::RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let rrsets = provider.list_records().await?;
//     let job = WriteJob::create(RecordType::A, "192.0.2.1".parse()?, 300);
//     provider.write_record(&job).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::types::{Rrset, WriteJob, WriteOutcome};

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Single-shot
///
/// Each call performs exactly one API request and reports its result.
/// Providers never retry, never cache and never decide whether a write is
/// needed; that is the reconciler's job. A failed write is retried naturally
/// on the next scheduled cycle.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every rrset of the managed record name
    ///
    /// Returns all types the provider knows about; filtering to the
    /// configured types happens in the fetcher.
    async fn list_records(&self) -> Result<Vec<Rrset>, crate::Error>;

    /// Execute one write job
    ///
    /// `Operation::Create` maps to the provider's create call and
    /// `Operation::Update` to its replace call. Only the provider's
    /// "created"/"ok" statuses count as success.
    async fn write_record(&self, job: &WriteJob) -> Result<WriteOutcome, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
