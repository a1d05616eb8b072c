//! Record writer
//!
//! Executes write jobs one at a time in reconciler order. A failed job is
//! logged and abandoned for this cycle; it never stops the jobs after it.

use tracing::{error, info};

use crate::error::Error;
use crate::traits::DnsProvider;
use crate::types::{WriteJob, WriteOutcome};

/// Result of executing one job
#[derive(Debug)]
pub struct JobResult {
    pub job: WriteJob,
    pub result: Result<WriteOutcome, Error>,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Execute `jobs` sequentially, awaiting each response before the next
pub async fn write_all(provider: &dyn DnsProvider, jobs: &[WriteJob]) -> Vec<JobResult> {
    let mut results = Vec::with_capacity(jobs.len());

    for job in jobs {
        let result = provider.write_record(job).await;
        match &result {
            Ok(outcome) => info!(
                "{}: {} (status {})",
                job,
                outcome.message.as_deref().unwrap_or("ok"),
                outcome.status
            ),
            Err(e) => error!("{} failed: {}", job, e),
        }
        results.push(JobResult {
            job: job.clone(),
            result,
        });
    }

    results
}
