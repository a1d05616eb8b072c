//! Contract Test: Scheduling & Single-Flight
//!
//! Constraints verified:
//! - The first cycle runs as soon as the engine starts
//! - Cycles repeat on the configured interval
//! - A cycle requested while another is in flight is skipped, not queued
//! - The engine terminates promptly on its shutdown signal
//!
//! If this test fails, overlapping cycles or a hanging shutdown path have
//! been introduced.

mod common;

use common::*;
use ddns_core::types::RecordType;
use ddns_core::{CycleOutcome, DdnsEngine, EngineEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, oneshot};
use tokio_test::assert_ok;

#[tokio::test]
async fn first_cycle_runs_immediately_and_shutdown_terminates() {
    let source = StaticIpSource::new(Some("1.2.3.4"), None);
    let provider = MockDnsProvider::new(vec![rrset("A", &["1.2.3.4"])]);

    let (engine, mut events) = assert_ok!(DdnsEngine::new(
        Box::new(source),
        Box::new(provider.clone()),
        minimal_config(&[RecordType::A]),
    ));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    assert!(
        wait_for(&mut events, |e| *e == EngineEvent::NoJobs).await.is_some(),
        "first cycle should complete without waiting for the interval"
    );

    shutdown_tx.send(()).expect("engine is running");

    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "Engine should terminate within 5 seconds");
    assert_ok!(result.unwrap().unwrap());

    assert!(
        wait_for(&mut events, |e| matches!(e, EngineEvent::Stopped { .. })).await.is_some(),
        "Stopped event should be emitted"
    );
}

#[tokio::test]
async fn cycles_repeat_on_interval() {
    let source = StaticIpSource::new(Some("1.2.3.4"), None);
    let provider = MockDnsProvider::new(vec![rrset("A", &["1.2.3.4"])]);

    let (engine, mut events) = assert_ok!(DdnsEngine::new(
        Box::new(source),
        Box::new(provider.clone()),
        minimal_config(&[RecordType::A]),
    ));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    // Interval is one second; two cycles need a little over one interval
    for _ in 0..2 {
        assert!(wait_for(&mut events, |e| *e == EngineEvent::CycleStarted).await.is_some());
    }
    assert!(provider.list_call_count() >= 1);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn overlapping_cycle_is_skipped() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let source = StaticIpSource::new(Some("1.2.3.4"), None);
    let provider = MockDnsProvider::new(vec![rrset("A", &["1.2.3.4"])])
        .gated(entered.clone(), release.clone());

    let (engine, mut events) = assert_ok!(DdnsEngine::new(
        Box::new(source),
        Box::new(provider.clone()),
        minimal_config(&[RecordType::A]),
    ));
    let engine = Arc::new(engine);

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.run_cycle().await }
    });

    // The first cycle is now blocked inside the record fetch
    entered.notified().await;

    assert_eq!(engine.run_cycle().await, CycleOutcome::Busy);
    assert_eq!(provider.list_call_count(), 1);

    release.notify_one();
    let outcome = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .expect("first cycle finishes once released")
        .unwrap();
    assert_eq!(outcome, CycleOutcome::Converged);

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(e, EngineEvent::CycleSkipped { .. })));
}

#[tokio::test]
async fn run_is_pending_until_shutdown() {
    let source = StaticIpSource::new(None, None);
    let provider = MockDnsProvider::new(Vec::new());

    let (engine, _events) = assert_ok!(DdnsEngine::new(
        Box::new(source),
        Box::new(provider),
        minimal_config(&[RecordType::A, RecordType::Aaaa]),
    ));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished(), "engine keeps running between cycles");

    drop(shutdown_tx);
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "dropping the sender also stops the engine");
}
