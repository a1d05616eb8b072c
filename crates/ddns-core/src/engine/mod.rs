//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Observing the public addresses via IpSource
//! - Fetching the provider's current records
//! - Reconciling both into an ordered list of write jobs
//! - Executing the jobs sequentially via DnsProvider
//! - Re-running the whole pipeline on a fixed interval
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      ┌──────────────┐
//! │  IpSource   │      │ DnsProvider  │
//! │  (observe)  │      │  (fetch)     │
//! └─────────────┘      └──────────────┘
//!        │ AddressSet         │ RemoteRecordSet
//!        └─────────┬──────────┘
//!                  ▼
//!           ┌─────────────┐
//!           │  reconcile  │ (pure)
//!           └─────────────┘
//!                  │ Vec<WriteJob>
//!                  ▼
//!           ┌──────────────┐           ┌─────────────┐
//!           │ DnsProvider  │──────────▶│   Events    │
//!           │  (write)     │           │  (notify)   │
//!           └──────────────┘           └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Observe IPv4/IPv6; if both are unknown, end the cycle
//! 2. Fetch provider records; on failure continue with an empty set
//! 3. Reconcile into write jobs
//! 4. Execute jobs one by one; failures are logged and do not stop the batch
//! 5. Emit events for monitoring/logging

use crate::config::DdnsConfig;
use crate::error::Result;
use crate::traits::{DnsProvider, IpSource};
use crate::types::{IpFamily, ObservationError, RecordType, RemoteRecordSet, WriteJob};
use crate::{fetcher, observer, reconcile, writer};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        record_types: Vec<RecordType>,
    },

    /// A reconciliation cycle began
    CycleStarted,

    /// One address family could not be observed
    ObservationFailed {
        family: IpFamily,
        reason: ObservationError,
    },

    /// The cycle ended before any provider call
    CycleSkipped {
        reason: String,
    },

    /// Provider records could not be fetched; the cycle continues as if
    /// no records exist
    FetchFailed {
        error: String,
    },

    /// Write jobs computed by the reconciler, in execution order
    JobsPlanned {
        jobs: Vec<WriteJob>,
    },

    /// Every managed record already matches the observed addresses
    NoJobs,

    /// A write job succeeded
    WriteSucceeded {
        job: WriteJob,
        status: u16,
    },

    /// A write job failed
    WriteFailed {
        job: WriteJob,
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Result of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was still in flight; nothing was done
    Busy,

    /// Neither address family could be observed; no provider call was made
    AddressesUnavailable,

    /// No write was needed
    Converged,

    /// Write jobs were executed
    Applied {
        succeeded: Vec<WriteJob>,
        failed: Vec<(WriteJob, String)>,
    },
}

/// Core DDNS engine
///
/// The engine owns one configured record (`<name>.<zone>`) and keeps its
/// A/AAAA rrsets in line with the host's public addresses.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`]
/// 3. Engine runs until shutdown signal received
///
/// ## Single-flight
///
/// At most one cycle runs at a time. The scheduler skips missed ticks
/// instead of bursting, and a cycle requested while another is in flight
/// returns [`CycleOutcome::Busy`] immediately.
pub struct DdnsEngine {
    /// IP source for address discovery
    ip_source: Box<dyn IpSource>,

    /// DNS provider for reading and writing records
    provider: Box<dyn DnsProvider>,

    /// Record types to manage, in processing order
    record_types: Vec<RecordType>,

    /// TTL written with every record
    ttl: u32,

    /// Interval between cycles
    update_interval: Duration,

    /// Held while a cycle is running
    cycle_lock: Mutex<()>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            provider,
            update_interval: config.update_interval(),
            record_types: config.settings.record_types,
            ttl: config.settings.ttl,
            cycle_lock: Mutex::new(()),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until SIGINT
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// With `None` the engine waits for ctrl-c instead.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            record_types: self.record_types.clone(),
        });
        info!(
            "Engine started: managing {:?} every {:?}",
            self.record_types, self.update_interval
        );

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for ctrl-c: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        // First tick completes immediately
        let mut interval = tokio::time::interval(self.update_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = IntervalStream::new(interval);

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    let outcome = self.run_cycle().await;
                    info!("Cycle finished: {}", summarize(&outcome));
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        info!("Engine stopped");
        Ok(())
    }

    /// Run one reconciliation cycle
    ///
    /// Never fails: every error is degraded, logged and reflected in the
    /// returned outcome and the emitted events.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            warn!("Previous cycle still running, skipping this one");
            self.emit_event(EngineEvent::CycleSkipped {
                reason: "Previous cycle still running".to_string(),
            });
            return CycleOutcome::Busy;
        };

        self.emit_event(EngineEvent::CycleStarted);

        // Observe before fetching so a cycle without addresses makes no
        // provider call at all.
        let addresses = observer::observe(self.ip_source.as_ref(), &self.record_types).await;
        for (family, result) in [
            (IpFamily::V4, addresses.ipv4.as_ref().err()),
            (IpFamily::V6, addresses.ipv6.as_ref().err()),
        ] {
            if let Some(reason) = result
                && *reason != ObservationError::NotRequested
            {
                self.emit_event(EngineEvent::ObservationFailed {
                    family,
                    reason: reason.clone(),
                });
            }
        }

        if addresses.all_failed() {
            warn!("No public address available, skipping this cycle");
            self.emit_event(EngineEvent::CycleSkipped {
                reason: "No public address available".to_string(),
            });
            return CycleOutcome::AddressesUnavailable;
        }

        let remote = match fetcher::fetch(self.provider.as_ref(), &self.record_types).await {
            Ok(remote) => remote,
            Err(e) => {
                error!(
                    "Failed to fetch records from {}: {}; assuming none exist",
                    self.provider.provider_name(),
                    e
                );
                self.emit_event(EngineEvent::FetchFailed {
                    error: e.to_string(),
                });
                RemoteRecordSet::new()
            }
        };

        info!("Creating job list.");
        let jobs = reconcile::reconcile(&addresses, &remote, &self.record_types, self.ttl);
        if jobs.is_empty() {
            info!("No updating jobs!");
            self.emit_event(EngineEvent::NoJobs);
            return CycleOutcome::Converged;
        }

        self.emit_event(EngineEvent::JobsPlanned { jobs: jobs.clone() });
        info!("Updating DNS record.");

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let results = writer::write_all(self.provider.as_ref(), &jobs).await;
        for writer::JobResult { job, result } in results {
            match result {
                Ok(outcome) => {
                    self.emit_event(EngineEvent::WriteSucceeded {
                        job: job.clone(),
                        status: outcome.status,
                    });
                    succeeded.push(job);
                }
                Err(e) => {
                    self.emit_event(EngineEvent::WriteFailed {
                        job: job.clone(),
                        error: e.to_string(),
                    });
                    failed.push((job, e.to_string()));
                }
            }
        }

        CycleOutcome::Applied { succeeded, failed }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Dropped (with a warning) when nobody keeps up with the channel
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event.");
        }
    }
}

fn summarize(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Busy => "skipped (busy)".to_string(),
        CycleOutcome::AddressesUnavailable => "skipped (no address)".to_string(),
        CycleOutcome::Converged => "up to date".to_string(),
        CycleOutcome::Applied { succeeded, failed } => {
            format!("{} written, {} failed", succeeded.len(), failed.len())
        }
    }
}
