// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! OpenStack Designate transport.
//!
//! [`DesignateClient`] is the seam between the reconciliation engine and the remote
//! DNS service. [`HttpDesignateClient`] implements it over the Designate v2 HTTP API,
//! authenticating against Keystone v3.
//!
//! # Module Structure
//!
//! - [`types`] - Designate wire types (zones, record sets, request bodies)
//! - [`auth`] - Keystone settings, `clouds.yaml` loading and token issuance
//! - [`client`] - reqwest based client with pagination and call metrics

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{AuthSettings, Session};
pub use client::HttpDesignateClient;
pub use types::{CreateOpts, RecordSet, UpdateOpts, Zone};

use crate::errors::ClientError;
use async_trait::async_trait;

/// Operations the reconciler needs from Designate.
///
/// Listing calls invoke the handler once per item; an error returned by the handler
/// stops the listing and is returned unchanged. No method retries on failure.
#[async_trait]
pub trait DesignateClient: Send + Sync {
    /// Call `handler` for each zone visible to the credentials
    async fn for_each_zone(
        &self,
        handler: &mut (dyn for<'z> FnMut(&'z Zone) -> Result<(), ClientError> + Send),
    ) -> Result<(), ClientError>;

    /// Call `handler` for each record set in the given zone
    async fn for_each_record_set(
        &self,
        zone_id: &str,
        handler: &mut (dyn for<'r> FnMut(&'r RecordSet) -> Result<(), ClientError> + Send),
    ) -> Result<(), ClientError>;

    /// Create a record set in the given zone, returning its ID
    async fn create_record_set(&self, zone_id: &str, opts: &CreateOpts)
        -> Result<String, ClientError>;

    /// Replace the records and TTL of a record set
    async fn update_record_set(
        &self,
        zone_id: &str,
        record_set_id: &str,
        opts: &UpdateOpts,
    ) -> Result<(), ClientError>;

    /// Delete a record set
    async fn delete_record_set(&self, zone_id: &str, record_set_id: &str)
        -> Result<(), ClientError>;
}

#[cfg(test)]
pub(crate) mod fake;
