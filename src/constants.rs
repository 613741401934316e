// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Designate webhook.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// DNS Record Types
// ============================================================================

/// Record type for IPv4 address records
pub const RECORD_TYPE_A: &str = "A";

/// Record type for text records
pub const RECORD_TYPE_TXT: &str = "TXT";

/// Record type for canonical name records
pub const RECORD_TYPE_CNAME: &str = "CNAME";

/// Separator used when joining record values into a single label value.
///
/// The NUL byte never occurs in a record value returned by Designate.
pub const ORIGINAL_RECORDS_SEPARATOR: char = '\0';

// ============================================================================
// Designate Zone Attributes
// ============================================================================

/// Administrative zone type for zones hosted (and writable) by Designate
pub const ZONE_TYPE_PRIMARY: &str = "PRIMARY";

/// Status of a zone that is fully provisioned
pub const ZONE_STATUS_ACTIVE: &str = "ACTIVE";

/// Catalog service type of the Designate endpoint
pub const DNS_SERVICE_TYPE: &str = "dns";

/// Default catalog interface used to reach Designate
pub const DEFAULT_ENDPOINT_INTERFACE: &str = "public";

/// Re-authenticate when the Keystone token expires within this many seconds
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

// ============================================================================
// Webhook API Constants
// ============================================================================

/// Media type spoken by the external-dns webhook protocol
pub const WEBHOOK_MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

/// Default listen address of the webhook API (localhost only, sidecar deployment)
pub const DEFAULT_WEBHOOK_ADDRESS: &str = "127.0.0.1:8888";

/// Default listen address of the health and metrics server
pub const DEFAULT_STATUS_ADDRESS: &str = "0.0.0.0:8080";

// ============================================================================
// HTTP Client Constants
// ============================================================================

/// TCP connect timeout for OpenStack API calls
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 30;

/// TCP keepalive interval for OpenStack API connections
pub const HTTP_TCP_KEEPALIVE_SECS: u64 = 30;

/// Idle pooled connections are closed after this many seconds
pub const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Header carrying the Keystone token on requests
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Header carrying the issued token on a Keystone token response
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
