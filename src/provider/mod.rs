// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of external-dns endpoints against OpenStack Designate.
//!
//! # Module Structure
//!
//! - [`zones`] - managed zone index and hostname to zone matching
//! - [`records`] - reading record sets back as endpoints
//! - [`aggregate`] - folding a change batch into per record set desired state
//! - [`reconcile`] - applying the desired state with create, update and delete calls
//!
//! # Flow of one `apply_changes` call
//!
//! ```text
//! managed_zones ─► list_endpoints ─► fold_changes ─► apply_record_sets
//!       │                                                  ▲
//!       └──────────────────── zone matching ───────────────┘
//! ```
//!
//! Nothing is cached between calls. Callers must not run two `apply_changes` calls
//! concurrently; the webhook server serializes them.

pub mod aggregate;
pub mod reconcile;
pub mod records;
pub mod zones;

use crate::designate::DesignateClient;
use crate::domain_filter::DomainFilter;
use crate::endpoint::{Changes, Endpoint};
use crate::errors::ProviderError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// A DNS provider as seen by the external-dns webhook protocol.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Domains this provider is responsible for
    fn domain_filter(&self) -> &DomainFilter;

    /// Current A, TXT and CNAME records of all managed zones
    async fn records(&self) -> Result<Vec<Endpoint>, ProviderError>;

    /// Apply one change batch computed by the external-dns planner
    async fn apply_changes(&self, changes: &Changes) -> Result<(), ProviderError>;

    /// Adjust desired endpoints before planning; the default keeps them unchanged
    async fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Result<Vec<Endpoint>, ProviderError> {
        Ok(endpoints)
    }
}

/// [`Provider`] backed by a [`DesignateClient`].
#[derive(Clone)]
pub struct DesignateProvider {
    client: Arc<dyn DesignateClient>,
    domain_filter: DomainFilter,
    dry_run: bool,
}

impl DesignateProvider {
    #[must_use]
    pub fn new(client: Arc<dyn DesignateClient>, domain_filter: DomainFilter, dry_run: bool) -> Self {
        Self {
            client,
            domain_filter,
            dry_run,
        }
    }

    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}

impl std::fmt::Debug for DesignateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignateProvider")
            .field("domain_filter", &self.domain_filter)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for DesignateProvider {
    fn domain_filter(&self) -> &DomainFilter {
        &self.domain_filter
    }

    async fn records(&self) -> Result<Vec<Endpoint>, ProviderError> {
        let zones = zones::managed_zones(self.client.as_ref(), &self.domain_filter).await?;
        records::list_endpoints(self.client.as_ref(), &zones).await
    }

    async fn apply_changes(&self, changes: &Changes) -> Result<(), ProviderError> {
        if changes.is_empty() {
            debug!("No changes to apply");
            return Ok(());
        }

        let zones = zones::managed_zones(self.client.as_ref(), &self.domain_filter).await?;
        let current = records::list_endpoints(self.client.as_ref(), &zones).await?;
        let entries = aggregate::fold_changes(changes, &current);

        info!(
            creates = changes.create.len(),
            updates = changes.update_new.len(),
            deletes = changes.delete.len(),
            record_sets = entries.len(),
            dry_run = self.dry_run,
            "Applying changes"
        );

        reconcile::apply_record_sets(self.client.as_ref(), &entries, &zones, self.dry_run).await
    }
}

// Declare test modules
#[cfg(test)]
mod mod_tests;
