// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Designate v2 API wire types.

use serde::{Deserialize, Serialize};

/// A DNS zone as returned by `GET /v2/zones`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    /// Administrative type (`PRIMARY` or `SECONDARY`)
    #[serde(rename = "type", default)]
    pub zone_type: String,
    /// Provisioning status (`ACTIVE`, `PENDING`, `ERROR`, ...)
    #[serde(default)]
    pub status: String,
}

/// A record set as returned by `GET /v2/zones/{zone}/recordsets`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordSet {
    pub id: String,
    #[serde(default)]
    pub zone_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub records: Vec<String>,
    /// `None` when the record set inherits the zone TTL
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `POST /v2/zones/{zone}/recordsets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOpts {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub records: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

/// Body of `PUT /v2/zones/{zone}/recordsets/{id}`.
///
/// `ttl` is always sent; `null` resets the record set to the zone TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOpts {
    pub records: Vec<String>,
    pub ttl: Option<u32>,
}

/// Pagination links of a list response.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of `GET /v2/zones`.
#[derive(Debug, Deserialize)]
pub(crate) struct ZonePage {
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub links: Links,
}

/// One page of `GET /v2/zones/{zone}/recordsets`.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordSetPage {
    #[serde(default)]
    pub recordsets: Vec<RecordSet>,
    #[serde(default)]
    pub links: Links,
}
