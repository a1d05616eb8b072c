// # ddns-core
//
// Core library for the Gandi dynamic DNS reconciliation client.
//
// ## Architecture Overview
//
// Each cycle compares the host's public addresses with the provider's
// records and writes only what differs:
// - **IpSource**: Trait for discovering the current public addresses
// - **DnsProvider**: Trait for reading and writing rrsets via a provider API
// - **observer / fetcher / writer**: The pipeline stages around those traits
// - **reconcile**: Pure decision function producing ordered write jobs
// - **DdnsEngine**: Runs the pipeline on a fixed interval, one cycle at a time
//
// ## Design Principles
//
// 1. **Fail-safe**: An address that could not be observed is never written
// 2. **Idempotent**: A record that already holds the observed address is left alone
// 3. **Library-First**: All core functionality can be used as a library
// 4. **No hidden retries**: A failed write waits for the next scheduled cycle

pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod observer;
pub mod reconcile;
pub mod traits;
pub mod types;
pub mod writer;

// Re-export core types for convenience
pub use config::DdnsConfig;
pub use engine::{CycleOutcome, DdnsEngine, EngineEvent};
pub use error::{Error, Result};
pub use reconcile::reconcile;
pub use traits::{DnsProvider, IpSource};
pub use types::{AddressSet, RecordType, RemoteRecord, RemoteRecordSet, WriteJob};
