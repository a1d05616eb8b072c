//! Address observer
//!
//! Builds the [`AddressSet`] for one cycle. Observation never fails as a
//! whole: each family either yields an address or records why it could not.

use std::net::IpAddr;
use tracing::{error, info};

use crate::traits::IpSource;
use crate::types::{AddressSet, IpFamily, ObservationError, RecordType};

/// Observe the public addresses needed by `record_types`
///
/// Families that no configured type needs are marked
/// [`ObservationError::NotRequested`] without touching the network. The
/// requested families are queried concurrently.
pub async fn observe(source: &dyn IpSource, record_types: &[RecordType]) -> AddressSet {
    let wants = |family: IpFamily| record_types.iter().any(|t| t.family() == family);

    let (ipv4, ipv6) = tokio::join!(
        observe_family(source, IpFamily::V4, wants(IpFamily::V4)),
        observe_family(source, IpFamily::V6, wants(IpFamily::V6)),
    );

    let ipv4 = ipv4.and_then(|ip| match ip {
        IpAddr::V4(v4) => Ok(v4),
        other => Err(ObservationError::WrongFamily {
            expected: IpFamily::V4,
            got: other,
        }),
    });
    let ipv6 = ipv6.and_then(|ip| match ip {
        IpAddr::V6(v6) => Ok(v6),
        other => Err(ObservationError::WrongFamily {
            expected: IpFamily::V6,
            got: other,
        }),
    });

    AddressSet::new(ipv4, ipv6)
}

async fn observe_family(
    source: &dyn IpSource,
    family: IpFamily,
    requested: bool,
) -> Result<IpAddr, ObservationError> {
    if !requested {
        return Err(ObservationError::NotRequested);
    }

    info!("Obtaining {}.", family);
    match source.current(family).await {
        Ok(ip) if family.matches(&ip) => {
            info!("Current {}: {}", family, ip);
            Ok(ip)
        }
        Ok(ip) => {
            error!(
                "Cannot obtain the public {}: {} returned {}",
                family,
                source.source_name(),
                ip
            );
            Err(ObservationError::WrongFamily {
                expected: family,
                got: ip,
            })
        }
        Err(e) => {
            error!("Cannot obtain the public {}: {}", family, e);
            Err(ObservationError::Unavailable(e.to_string()))
        }
    }
}
