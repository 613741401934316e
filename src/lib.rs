// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # designate-webhook - external-dns provider for OpenStack Designate
//!
//! An [external-dns](https://github.com/kubernetes-sigs/external-dns) webhook provider
//! that keeps A, TXT and CNAME record sets in OpenStack Designate in line with the
//! endpoints external-dns wants.
//!
//! ## Overview
//!
//! external-dns asks the webhook for the current records, diffs them against the
//! desired state and posts back a change batch. Each batch is reconciled in four steps:
//!
//! 1. list the managed zones (primary, active, accepted by the domain filter)
//! 2. read all A, TXT and CNAME record sets of those zones as endpoints
//! 3. fold the batch into one desired target set per hostname and record type
//! 4. create, update or delete each record set so it matches
//!
//! Record sets are only ever modified as a whole; targets of a record set that a batch
//! does not mention are preserved.
//!
//! ## Modules
//!
//! - [`provider`] - zone index, endpoint reader, aggregation and reconciliation
//! - [`designate`] - Designate transport and Keystone authentication
//! - [`webhook`] - external-dns webhook API and status server
//! - [`endpoint`] - endpoints and change batches as exchanged with external-dns
//! - [`domain_filter`] - include and exclude lists for managed zones
//! - [`config`] - command line configuration
//! - [`metrics`] - Prometheus metrics
//! - [`errors`] - error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use designate_webhook::designate::{AuthSettings, DesignateClient, HttpDesignateClient};
//! use designate_webhook::domain_filter::DomainFilter;
//! use designate_webhook::metrics::PrometheusMetrics;
//! use designate_webhook::provider::{DesignateProvider, Provider};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = AuthSettings::from_env()?;
//! let client: Arc<dyn DesignateClient> =
//!     Arc::new(HttpDesignateClient::connect(settings, Arc::new(PrometheusMetrics)).await?);
//! let provider = DesignateProvider::new(client, DomainFilter::accept_all(), true);
//!
//! for endpoint in provider.records().await? {
//!     println!("{} {} {:?}", endpoint.dns_name, endpoint.record_type, endpoint.targets);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod designate;
pub mod domain_filter;
pub mod endpoint;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod provider;
pub mod webhook;
