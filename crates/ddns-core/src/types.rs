//! Data model shared by the observer, fetcher, reconciler and writer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

/// IP address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Whether `ip` belongs to this family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        matches!(
            (self, ip),
            (IpFamily::V4, IpAddr::V4(_)) | (IpFamily::V6, IpAddr::V6(_))
        )
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("IPv4"),
            IpFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// DNS record types managed by the client
///
/// Only address records are supported. Other provider types (TXT, MX, ...)
/// cannot be configured and are ignored when fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// The address family this record type carries
    pub fn family(&self) -> IpFamily {
        match self {
            RecordType::A => IpFamily::V4,
            RecordType::Aaaa => IpFamily::V6,
        }
    }

    /// Provider spelling of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::invalid_input(format!(
                "Unsupported record type: {}",
                other
            ))),
        }
    }
}

/// Why an address family could not be observed this cycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObservationError {
    /// Every discovery endpoint failed
    #[error("address unavailable: {0}")]
    Unavailable(String),

    /// A discovery endpoint answered with an address of the other family
    #[error("expected {expected} address, got {got}")]
    WrongFamily { expected: IpFamily, got: IpAddr },

    /// No configured record type needs this family
    #[error("family not requested")]
    NotRequested,
}

/// Addresses observed during one cycle
///
/// A failed observation is kept as an error so it can never be mistaken for
/// "no address".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSet {
    pub ipv4: Result<Ipv4Addr, ObservationError>,
    pub ipv6: Result<Ipv6Addr, ObservationError>,
}

impl AddressSet {
    pub fn new(
        ipv4: Result<Ipv4Addr, ObservationError>,
        ipv6: Result<Ipv6Addr, ObservationError>,
    ) -> Self {
        Self { ipv4, ipv6 }
    }

    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4.as_ref().ok().copied()
    }

    pub fn ipv6(&self) -> Option<Ipv6Addr> {
        self.ipv6.as_ref().ok().copied()
    }

    pub fn ipv4_failed(&self) -> bool {
        self.ipv4.is_err()
    }

    pub fn ipv6_failed(&self) -> bool {
        self.ipv6.is_err()
    }

    /// True when neither family yielded an address
    pub fn all_failed(&self) -> bool {
        self.ipv4_failed() && self.ipv6_failed()
    }

    /// Observed address for a family, or the reason it is unknown
    pub fn address(&self, family: IpFamily) -> Result<IpAddr, &ObservationError> {
        match family {
            IpFamily::V4 => self.ipv4.as_ref().map(|ip| IpAddr::V4(*ip)),
            IpFamily::V6 => self.ipv6.as_ref().map(|ip| IpAddr::V6(*ip)),
        }
    }

    /// Observed address for the family of a record type
    pub fn address_for(&self, record_type: RecordType) -> Result<IpAddr, &ObservationError> {
        self.address(record_type.family())
    }
}

/// One rrset as returned by the provider's record listing
///
/// Fields other than type, values and TTL are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rrset {
    pub rrset_type: String,
    #[serde(default)]
    pub rrset_values: Vec<String>,
    #[serde(default)]
    pub rrset_ttl: u32,
}

/// Provider-side state of one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    pub record_type: RecordType,
    /// Existing values in provider order, without duplicates
    pub values: Vec<String>,
    pub ttl: u32,
}

impl RemoteRecord {
    pub fn new(record_type: RecordType, values: Vec<String>, ttl: u32) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self {
            record_type,
            values: unique,
            ttl,
        }
    }

    /// Whether `ip` is already one of the record's values
    ///
    /// Values are compared as addresses so that equivalent spellings of an
    /// IPv6 address match.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.values.iter().any(|value| match value.parse::<IpAddr>() {
            Ok(parsed) => parsed == *ip,
            Err(_) => *value == ip.to_string(),
        })
    }
}

/// Provider records keyed by type, at most one entry per type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteRecordSet {
    records: BTreeMap<RecordType, RemoteRecord>,
}

impl RemoteRecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record set from a provider listing, keeping only `handled` types
    ///
    /// Unrecognized types are dropped. When a type appears more than once the
    /// first rrset wins.
    pub fn from_rrsets(rrsets: Vec<Rrset>, handled: &[RecordType]) -> Self {
        let mut set = Self::new();
        for rrset in rrsets {
            let Ok(record_type) = rrset.rrset_type.parse::<RecordType>() else {
                tracing::trace!("Ignoring rrset of type {}", rrset.rrset_type);
                continue;
            };
            if !handled.contains(&record_type) || set.contains(record_type) {
                continue;
            }
            set.insert(RemoteRecord::new(
                record_type,
                rrset.rrset_values,
                rrset.rrset_ttl,
            ));
        }
        set
    }

    /// Insert a record, replacing any existing entry of the same type
    pub fn insert(&mut self, record: RemoteRecord) -> Option<RemoteRecord> {
        self.records.insert(record.record_type, record)
    }

    pub fn get(&self, record_type: RecordType) -> Option<&RemoteRecord> {
        self.records.get(&record_type)
    }

    pub fn contains(&self, record_type: RecordType) -> bool {
        self.records.contains_key(&record_type)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteRecord> {
        self.records.values()
    }
}

impl FromIterator<RemoteRecord> for RemoteRecordSet {
    fn from_iter<I: IntoIterator<Item = RemoteRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Kind of write issued to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// The record does not exist yet (HTTP create)
    Create,
    /// The record exists with other values (HTTP replace)
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Update => f.write_str("update"),
        }
    }
}

/// One write planned by the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteJob {
    pub record_type: RecordType,
    pub operation: Operation,
    pub value: IpAddr,
    pub ttl: u32,
}

impl WriteJob {
    pub fn create(record_type: RecordType, value: IpAddr, ttl: u32) -> Self {
        Self {
            record_type,
            operation: Operation::Create,
            value,
            ttl,
        }
    }

    pub fn update(record_type: RecordType, value: IpAddr, ttl: u32) -> Self {
        Self {
            record_type,
            operation: Operation::Update,
            value,
            ttl,
        }
    }
}

impl fmt::Display for WriteJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} (ttl {})",
            self.operation, self.record_type, self.value, self.ttl
        )
    }
}

/// Provider acknowledgement of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// HTTP status returned by the provider (0 in dry-run mode)
    pub status: u16,
    /// Provider message, e.g. "DNS Record Created"
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rrset(ty: &str, values: &[&str], ttl: u32) -> Rrset {
        Rrset {
            rrset_type: ty.to_string(),
            rrset_values: values.iter().map(|v| v.to_string()).collect(),
            rrset_ttl: ttl,
        }
    }

    #[test]
    fn record_type_parsing() {
        assert_eq!("A".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert!("TXT".parse::<RecordType>().is_err());
        assert!("aaaa".parse::<RecordType>().is_err());
    }

    #[test]
    fn record_type_serde_uses_provider_spelling() {
        let types: Vec<RecordType> = serde_json::from_str(r#"["AAAA", "A"]"#).unwrap();
        assert_eq!(types, vec![RecordType::Aaaa, RecordType::A]);
        assert!(serde_json::from_str::<Vec<RecordType>>(r#"["CNAME"]"#).is_err());
    }

    #[test]
    fn from_rrsets_filters_unhandled_and_unknown_types() {
        let rrsets = vec![
            rrset("MX", &["10 mail.example.com."], 300),
            rrset("A", &["1.1.1.1"], 300),
            rrset("TXT", &["\"v=spf1 -all\""], 300),
            rrset("AAAA", &["::1"], 600),
        ];

        let only_a = RemoteRecordSet::from_rrsets(rrsets.clone(), &[RecordType::A]);
        assert_eq!(only_a.len(), 1);
        assert!(only_a.contains(RecordType::A));

        let both = RemoteRecordSet::from_rrsets(rrsets, &[RecordType::A, RecordType::Aaaa]);
        assert_eq!(both.len(), 2);
        assert_eq!(both.get(RecordType::Aaaa).unwrap().ttl, 600);
    }

    #[test]
    fn from_rrsets_keeps_first_duplicate() {
        let rrsets = vec![rrset("A", &["1.1.1.1"], 300), rrset("A", &["2.2.2.2"], 900)];
        let set = RemoteRecordSet::from_rrsets(rrsets, &[RecordType::A]);
        let record = set.get(RecordType::A).unwrap();
        assert_eq!(record.values, vec!["1.1.1.1".to_string()]);
        assert_eq!(record.ttl, 300);
    }

    #[test]
    fn remote_record_contains_compares_addresses() {
        let record = RemoteRecord::new(
            RecordType::Aaaa,
            vec!["2001:db8:0:0:0:0:0:1".to_string(), "2001:db8::1".to_string()],
            300,
        );
        assert_eq!(record.values.len(), 2);
        assert!(record.contains(&"2001:db8::1".parse().unwrap()));
        assert!(!record.contains(&"2001:db8::2".parse().unwrap()));
    }

    #[test]
    fn remote_record_dedups_values() {
        let record = RemoteRecord::new(
            RecordType::A,
            vec!["1.1.1.1".into(), "1.1.1.1".into(), "2.2.2.2".into()],
            300,
        );
        assert_eq!(record.values, vec!["1.1.1.1".to_string(), "2.2.2.2".to_string()]);
    }

    #[test]
    fn address_set_accessors() {
        let set = AddressSet::new(
            Ok(Ipv4Addr::new(9, 9, 9, 9)),
            Err(ObservationError::Unavailable("timeout".into())),
        );
        assert_eq!(set.ipv4(), Some(Ipv4Addr::new(9, 9, 9, 9)));
        assert_eq!(set.ipv6(), None);
        assert!(!set.ipv4_failed());
        assert!(set.ipv6_failed());
        assert!(!set.all_failed());
        assert_eq!(
            set.address_for(RecordType::A),
            Ok(IpAddr::from([9, 9, 9, 9]))
        );
        assert!(set.address_for(RecordType::Aaaa).is_err());
    }

    #[test]
    fn family_matches() {
        assert!(IpFamily::V4.matches(&"1.2.3.4".parse().unwrap()));
        assert!(!IpFamily::V4.matches(&"::1".parse().unwrap()));
        assert!(IpFamily::V6.matches(&"::1".parse().unwrap()));
    }
}
