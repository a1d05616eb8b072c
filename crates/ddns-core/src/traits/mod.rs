//! Core traits for the DDNS client
//!
//! This module defines the seams between the reconciliation core and the
//! network-facing implementations.
//!
//! - [`IpSource`]: Discover the host's public addresses
//! - [`DnsProvider`]: Read and write rrsets via a provider API

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::DnsProvider;
pub use ip_source::IpSource;
