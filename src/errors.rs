// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the Designate webhook.
//!
//! This module provides specialized error types for:
//! - OpenStack transport failures (Keystone authentication, Designate HTTP API)
//! - Reconciliation failures, classified by the phase that failed
//!
//! Listing failures abort a reconciliation immediately. Mutation failures are
//! collected per record set so that the remaining record sets still get applied.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by a [`DesignateClient`](crate::designate::DesignateClient).
///
/// Every transport error is fatal for the call that raised it; the client never retries.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("HTTP request {method} {url} failed: {source}")]
    Request {
        /// HTTP method of the failed request
        method: String,
        /// Full request URL
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status code
    #[error("HTTP {status} from {method} {url}: {body}")]
    Status {
        /// HTTP method of the failed request
        method: String,
        /// Full request URL
        url: String,
        /// Status code returned by the API
        status: StatusCode,
        /// Response body, usually a JSON error document
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        /// Full request URL
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Keystone rejected the credentials or returned an unusable token
    #[error("Keystone authentication failed: {0}")]
    Auth(String),

    /// Credentials or service catalog are incomplete
    #[error("Invalid OpenStack configuration: {0}")]
    Config(String),

    /// A zone or record set referenced by ID does not exist
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Kind of the missing object ("zone" or "record set")
        kind: &'static str,
        /// ID that was looked up
        id: String,
    },

    /// A listing callback aborted the iteration
    #[error("Listing aborted: {0}")]
    Aborted(String),
}

impl ClientError {
    /// HTTP status code carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced by a reconciliation call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Enumerating zones failed; nothing was read or written
    #[error("Failed to list zones: {source}")]
    ZoneListing {
        #[source]
        source: ClientError,
    },

    /// Enumerating the record sets of a zone failed; the whole read is discarded
    #[error("Failed to list record sets of zone {zone_id}: {source}")]
    RecordListing {
        /// Zone whose record sets could not be listed
        zone_id: String,
        #[source]
        source: ClientError,
    },

    /// Creating, updating or deleting one record set failed
    #[error("Failed to {operation} record set {dns_name}/{record_type}: {source}")]
    RecordMutation {
        /// The mutation that failed
        operation: MutationKind,
        /// Canonical hostname of the record set
        dns_name: String,
        /// Record type of the record set
        record_type: String,
        #[source]
        source: ClientError,
    },
}

/// Remote mutation applied to a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
