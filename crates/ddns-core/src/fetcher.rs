//! Record fetcher
//!
//! Reads the provider's current rrsets for the managed name and keeps only
//! the configured record types.

use tracing::{debug, info};

use crate::error::Result;
use crate::traits::DnsProvider;
use crate::types::{RecordType, RemoteRecordSet};

/// Fetch the provider records for `record_types`
///
/// Errors are propagated. The engine decides how to degrade; it treats a
/// failed fetch as an empty set.
pub async fn fetch(
    provider: &dyn DnsProvider,
    record_types: &[RecordType],
) -> Result<RemoteRecordSet> {
    info!("Obtaining current DNS record.");
    let rrsets = provider.list_records().await?;
    debug!(
        "{} returned {} rrset(s)",
        provider.provider_name(),
        rrsets.len()
    );

    let records = RemoteRecordSet::from_rrsets(rrsets, record_types);
    for record in records.iter() {
        debug!(
            "Remote {} record: {:?} (ttl {})",
            record.record_type, record.values, record.ttl
        );
    }
    Ok(records)
}
