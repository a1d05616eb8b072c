//! Test doubles and common utilities for pipeline contract tests
//!
//! The doubles share their counters through `Arc`s so a test can keep a
//! clone while the engine owns the boxed original.

#![allow(dead_code)]

use ddns_core::config::DdnsConfig;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, IpSource};
use ddns_core::types::{IpFamily, RecordType, Rrset, WriteJob, WriteOutcome};
use ddns_core::EngineEvent;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};

/// An IpSource returning fixed answers per family
#[derive(Clone)]
pub struct StaticIpSource {
    ipv4: Option<IpAddr>,
    ipv6: Option<IpAddr>,
    calls: Arc<AtomicUsize>,
}

impl StaticIpSource {
    /// `None` makes the family fail
    pub fn new(ipv4: Option<&str>, ipv6: Option<&str>) -> Self {
        Self {
            ipv4: ipv4.map(|s| s.parse().expect("valid test address")),
            ipv6: ipv6.map(|s| s.parse().expect("valid test address")),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self, family: IpFamily) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = match family {
            IpFamily::V4 => self.ipv4,
            IpFamily::V6 => self.ipv6,
        };
        answer.ok_or_else(|| Error::observation(format!("{} discovery unavailable", family)))
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// A mock DnsProvider that serves a fixed listing and records writes
#[derive(Clone)]
pub struct MockDnsProvider {
    /// Listing to serve; `None` makes list_records() fail
    rrsets: Option<Vec<Rrset>>,
    /// Record types whose writes fail
    failing_writes: Vec<RecordType>,
    list_calls: Arc<AtomicUsize>,
    writes: Arc<std::sync::Mutex<Vec<WriteJob>>>,
    /// When set, list_records() signals `entered` and waits for `release`
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl MockDnsProvider {
    pub fn new(rrsets: Vec<Rrset>) -> Self {
        Self {
            rrsets: Some(rrsets),
            failing_writes: Vec::new(),
            list_calls: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(std::sync::Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// A provider whose record listing always fails
    pub fn unreachable() -> Self {
        Self {
            rrsets: None,
            ..Self::new(Vec::new())
        }
    }

    pub fn failing_writes_for(mut self, record_types: &[RecordType]) -> Self {
        self.failing_writes = record_types.to_vec();
        self
    }

    /// Block list_records() until `release` is notified; `entered` is
    /// notified once the call has started
    pub fn gated(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some((entered, release));
        self
    }

    /// Get the number of times list_records() was called
    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Jobs received by write_record(), in call order
    pub fn writes(&self) -> Vec<WriteJob> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self) -> Result<Vec<Rrset>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        self.rrsets
            .clone()
            .ok_or_else(|| Error::fetch("connection refused"))
    }

    async fn write_record(&self, job: &WriteJob) -> Result<WriteOutcome> {
        self.writes.lock().unwrap().push(job.clone());
        if self.failing_writes.contains(&job.record_type) {
            return Err(Error::conflict("DNS Record already exists"));
        }
        Ok(WriteOutcome {
            status: 201,
            message: Some("DNS Record Created".to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to build a provider rrset
pub fn rrset(record_type: &str, values: &[&str]) -> Rrset {
    Rrset {
        rrset_type: record_type.to_string(),
        rrset_values: values.iter().map(|v| v.to_string()).collect(),
        rrset_ttl: 300,
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(record_types: &[RecordType]) -> DdnsConfig {
    let mut config = DdnsConfig::new("home", "example.com", "test-key");
    config.settings.record_types = record_types.to_vec();
    config.settings.ttl = 300;
    config.settings.update_interval_secs = 1;
    config.engine.event_channel_capacity = 100;
    config
}

/// Drain every event currently queued
pub fn drain(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait until an event matching `pred` arrives
pub async fn wait_for(
    rx: &mut mpsc::Receiver<EngineEvent>,
    pred: impl Fn(&EngineEvent) -> bool,
) -> Option<EngineEvent> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            if pred(&event) {
                return Some(event);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}
