//! Reconciler
//!
//! Pure decision function comparing observed addresses with provider
//! records. For each configured record type, in configured order:
//!
//! ```text
//! observation failed          -> skip (never write an unknown address)
//! no remote record            -> Create(observed)
//! observed in remote values   -> nothing, already converged
//! otherwise                   -> Update(observed)
//! ```
//!
//! An unknown address is never treated as an absent one, so a failed
//! discovery can never overwrite a valid record.

use tracing::{debug, info};

use crate::types::{AddressSet, RecordType, RemoteRecordSet, WriteJob};

/// Compute the ordered list of writes that brings `remote` in line with
/// `addresses`
///
/// Jobs follow the order of `record_types`. Each type yields at most one
/// job; a type listed twice is only considered at its first position.
pub fn reconcile(
    addresses: &AddressSet,
    remote: &RemoteRecordSet,
    record_types: &[RecordType],
    ttl: u32,
) -> Vec<WriteJob> {
    let mut jobs: Vec<WriteJob> = Vec::with_capacity(record_types.len());

    for (i, &record_type) in record_types.iter().enumerate() {
        if record_types[..i].contains(&record_type) {
            continue;
        }

        let observed = match addresses.address_for(record_type) {
            Ok(ip) => ip,
            Err(reason) => {
                debug!("Skipping {} record: {}", record_type, reason);
                continue;
            }
        };

        match remote.get(record_type) {
            None => {
                info!("Record {} not found, add to new record queue.", record_type);
                jobs.push(WriteJob::create(record_type, observed, ttl));
            }
            Some(record) if record.contains(&observed) => {
                debug!("Record {} already contains {}", record_type, observed);
            }
            Some(record) => {
                info!(
                    "Record {} add to update queue ({:?} -> {}).",
                    record_type, record.values, observed
                );
                jobs.push(WriteJob::update(record_type, observed, ttl));
            }
        }
    }

    jobs
}
