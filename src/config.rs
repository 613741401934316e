// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line and environment configuration of the webhook binary.
//!
//! OpenStack credentials are not part of [`Args`]; they are read from the `OS_*`
//! environment by [`AuthSettings::from_env`](crate::designate::AuthSettings::from_env).

use crate::constants::{DEFAULT_STATUS_ADDRESS, DEFAULT_WEBHOOK_ADDRESS};
use crate::domain_filter::DomainFilter;
use clap::Parser;
use std::net::SocketAddr;

/// external-dns webhook provider for OpenStack Designate
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Limit managed zones to these domains (repeatable or comma separated)
    #[arg(long = "domain-filter", env = "DOMAIN_FILTER", value_delimiter = ',')]
    pub domain_filter: Vec<String>,

    /// Exclude these domains from the managed zones
    #[arg(long = "exclude-domains", env = "EXCLUDE_DOMAINS", value_delimiter = ',')]
    pub exclude_domains: Vec<String>,

    /// Log changes without calling Designate
    #[arg(long, env = "DRY_RUN", default_value_t = false)]
    pub dry_run: bool,

    /// Listen address of the external-dns webhook API
    #[arg(long, env = "WEBHOOK_ADDRESS", default_value = DEFAULT_WEBHOOK_ADDRESS)]
    pub webhook_address: SocketAddr,

    /// Listen address of the health and metrics endpoints
    #[arg(long, env = "STATUS_ADDRESS", default_value = DEFAULT_STATUS_ADDRESS)]
    pub status_address: SocketAddr,
}

impl Args {
    /// Domain filter built from the include and exclude lists.
    #[must_use]
    pub fn domain_filter(&self) -> DomainFilter {
        DomainFilter::new(&self.domain_filter, &self.exclude_domains)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
