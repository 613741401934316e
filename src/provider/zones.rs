// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Managed zone index and hostname to zone matching.

use crate::constants::{ZONE_STATUS_ACTIVE, ZONE_TYPE_PRIMARY};
use crate::designate::{DesignateClient, Zone};
use crate::domain_filter::DomainFilter;
use crate::errors::ProviderError;
use std::collections::BTreeMap;
use tracing::debug;

/// Zone ID to canonical zone name, for zones this webhook may manage.
pub type ManagedZones = BTreeMap<String, String>;

/// Convert a domain name to lower-case FQDN form with a trailing dot.
///
/// # Example
///
/// ```rust
/// use designate_webhook::provider::zones::canonicalize_domain_name;
///
/// assert_eq!(canonicalize_domain_name("WWW.Example.com"), "www.example.com.");
/// assert_eq!(canonicalize_domain_name("www.example.com."), "www.example.com.");
/// ```
#[must_use]
pub fn canonicalize_domain_name(name: &str) -> String {
    let mut canonical = name.to_lowercase();
    if !canonical.ends_with('.') {
        canonical.push('.');
    }
    canonical
}

/// Whether a zone is hosted by Designate, fully provisioned and visible through the filter.
#[must_use]
pub fn is_managed(zone: &Zone, domain_filter: &DomainFilter) -> bool {
    let primary = zone.zone_type.is_empty() || zone.zone_type.eq_ignore_ascii_case(ZONE_TYPE_PRIMARY);
    primary
        && zone.status == ZONE_STATUS_ACTIVE
        && domain_filter.matches(&canonicalize_domain_name(&zone.name))
}

/// List the zones this webhook manages.
///
/// # Errors
///
/// Returns [`ProviderError::ZoneListing`] if the zone listing fails.
pub async fn managed_zones(
    client: &dyn DesignateClient,
    domain_filter: &DomainFilter,
) -> Result<ManagedZones, ProviderError> {
    let mut zones = ManagedZones::new();
    let mut skipped = 0usize;

    client
        .for_each_zone(&mut |zone| {
            if is_managed(zone, domain_filter) {
                zones.insert(zone.id.clone(), canonicalize_domain_name(&zone.name));
            } else {
                skipped += 1;
            }
            Ok(())
        })
        .await
        .map_err(|source| ProviderError::ZoneListing { source })?;

    debug!(managed = zones.len(), skipped = skipped, "Listed Designate zones");
    Ok(zones)
}

/// Find the zone owning a canonical hostname: the longest zone name that is a suffix of it
/// on a label boundary.
///
/// Returns `None` when no managed zone matches.
#[must_use]
pub fn match_zone<'a>(hostname: &str, zones: &'a ManagedZones) -> Option<&'a str> {
    zones
        .iter()
        .filter(|(_, zone_name)| is_in_zone(hostname, zone_name))
        .max_by_key(|(_, zone_name)| zone_name.len())
        .map(|(zone_id, _)| zone_id.as_str())
}

/// `first-test.example.com.` is in `example.com.` but not in `test.example.com.`.
fn is_in_zone(hostname: &str, zone_name: &str) -> bool {
    if zone_name == "." {
        return true;
    }
    match hostname.strip_suffix(zone_name) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
#[path = "zones_tests.rs"]
mod zones_tests;
