// # IP Source Trait
//
// Defines the interface for discovering the host's public addresses.
//
// ## Implementations
//
// - HTTP discovery services: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{IpSource, types::IpFamily};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let ipv4 = source.current(IpFamily::V4).await?;
//     println!("Current IPv4: {}", ipv4);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::types::IpFamily;

/// Trait for IP source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// An IP source is an **observer**: it reports what it sees and never
/// decides whether DNS needs to change. Failures are returned to the
/// caller, which degrades the family to "unknown" for the current cycle.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public address of the given family
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current address. Callers verify the family.
    /// - `Err(Error)`: If the address could not be determined
    async fn current(&self, family: IpFamily) -> Result<IpAddr, crate::Error>;

    /// Short name for logging
    fn source_name(&self) -> &'static str {
        "unknown"
    }
}
