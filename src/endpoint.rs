// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Logical DNS endpoints and change batches as exchanged with external-dns.
//!
//! The JSON shape of [`Endpoint`] and [`Changes`] follows the external-dns webhook
//! protocol, so both types are serialized as-is on the wire.
//!
//! # Example
//!
//! ```rust
//! use designate_webhook::endpoint::{Endpoint, RecordType};
//!
//! let ep = Endpoint::with_ttl("www.example.com.", "A", Some(300), vec!["10.1.1.1".into()]);
//! assert_eq!(ep.dns_name, "www.example.com");
//! assert_eq!(ep.supported_type(), Some(RecordType::A));
//! ```

use crate::constants::{RECORD_TYPE_A, RECORD_TYPE_CNAME, RECORD_TYPE_TXT};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Record types this webhook reads and writes. Everything else is invisible to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordType {
    A,
    Txt,
    Cname,
}

impl RecordType {
    /// Parse a wire record type, returning `None` for unsupported types.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            RECORD_TYPE_A => Some(Self::A),
            RECORD_TYPE_TXT => Some(Self::Txt),
            RECORD_TYPE_CNAME => Some(Self::Cname),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => RECORD_TYPE_A,
            Self::Txt => RECORD_TYPE_TXT,
            Self::Cname => RECORD_TYPE_CNAME,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider specific key/value attached to an endpoint by external-dns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// One logical DNS fact: a hostname, its record type, targets, TTL and labels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Hostname, not necessarily canonical
    pub dns_name: String,

    /// Target values, order preserved
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<String>,

    /// Wire record type (e.g. "A")
    pub record_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,

    /// TTL in seconds; absent or zero means "use the zone default"
    #[serde(rename = "recordTTL", default, skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<i64>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: BTreeMap<String, String>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

impl Endpoint {
    /// Create an endpoint without a TTL.
    #[must_use]
    pub fn new(dns_name: &str, record_type: &str, targets: Vec<String>) -> Self {
        Self::with_ttl(dns_name, record_type, None, targets)
    }

    /// Create an endpoint, stripping one trailing dot from the name and from every target.
    #[must_use]
    pub fn with_ttl(
        dns_name: &str,
        record_type: &str,
        ttl: Option<u32>,
        targets: Vec<String>,
    ) -> Self {
        Self {
            dns_name: strip_trailing_dot(dns_name).to_string(),
            targets: targets
                .iter()
                .map(|t| strip_trailing_dot(t).to_string())
                .collect(),
            record_type: record_type.to_string(),
            record_ttl: ttl.map(i64::from),
            ..Self::default()
        }
    }

    /// Add a label, builder style.
    #[must_use]
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    /// The record type, if it is one this webhook manages.
    #[must_use]
    pub fn supported_type(&self) -> Option<RecordType> {
        RecordType::parse(&self.record_type)
    }

    /// The configured TTL, treating zero and out-of-range values as unset.
    #[must_use]
    pub fn ttl(&self) -> Option<u32> {
        self.record_ttl
            .filter(|ttl| *ttl > 0)
            .and_then(|ttl| u32::try_from(ttl).ok())
    }

    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// A batch of endpoint changes computed by the external-dns planner.
///
/// Update batches are expected to be paired: every `update_old` endpoint has a matching
/// `update_new` endpoint for the same hostname and record type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Changes {
    #[serde(rename = "Create", default, deserialize_with = "null_as_default")]
    pub create: Vec<Endpoint>,
    #[serde(rename = "UpdateOld", default, deserialize_with = "null_as_default")]
    pub update_old: Vec<Endpoint>,
    #[serde(rename = "UpdateNew", default, deserialize_with = "null_as_default")]
    pub update_new: Vec<Endpoint>,
    #[serde(rename = "Delete", default, deserialize_with = "null_as_default")]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }
}

fn strip_trailing_dot(value: &str) -> &str {
    value.strip_suffix('.').unwrap_or(value)
}

/// Go encodes nil slices and maps as `null`; treat those as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
