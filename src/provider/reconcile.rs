// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Applying folded record set entries to Designate.
//!
//! Each entry maps to exactly one [`Action`], decided only by whether the record set
//! already has an ID and whether any target is still wanted:
//!
//! | record set ID | wanted targets | action |
//! |---|---|---|
//! | empty | none | [`Action::Noop`] |
//! | empty | some | [`Action::Create`] |
//! | set | none | [`Action::Delete`] |
//! | set | some | [`Action::Update`] |
//!
//! Entries whose hostname has no managed zone are skipped.

use super::aggregate::{AggregatedEntries, RecordSetEntry};
use super::zones::{match_zone, ManagedZones};
use crate::designate::{CreateOpts, DesignateClient, UpdateOpts};
use crate::errors::{ClientError, MutationKind, ProviderError};
use tracing::{debug, error, info};

/// The remote call needed to bring one record set to its desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No managed zone owns the hostname
    Skip,
    /// Nothing exists and nothing is wanted
    Noop,
    Create {
        zone_id: String,
        records: Vec<String>,
    },
    Update {
        zone_id: String,
        record_set_id: String,
        records: Vec<String>,
    },
    Delete {
        zone_id: String,
        record_set_id: String,
    },
}

/// Decide the action for one entry.
#[must_use]
pub fn plan_action(entry: &RecordSetEntry, zones: &ManagedZones) -> Action {
    let zone_id = if entry.zone_id.is_empty() {
        match match_zone(&entry.dns_name, zones) {
            Some(zone_id) => zone_id.to_string(),
            None => return Action::Skip,
        }
    } else {
        entry.zone_id.clone()
    };

    let records = entry.records();
    match (entry.record_set_id.is_empty(), records.is_empty()) {
        (true, true) => Action::Noop,
        (true, false) => Action::Create { zone_id, records },
        (false, true) => Action::Delete {
            zone_id,
            record_set_id: entry.record_set_id.clone(),
        },
        (false, false) => Action::Update {
            zone_id,
            record_set_id: entry.record_set_id.clone(),
            records,
        },
    }
}

/// Apply every entry, in key order.
///
/// A failed mutation does not stop the remaining entries; changes that already
/// succeeded are kept. With `dry_run` set every mutation is logged and reported as
/// successful without calling Designate.
///
/// # Errors
///
/// Returns the first [`ProviderError::RecordMutation`] encountered, after all entries
/// were attempted.
pub async fn apply_record_sets(
    client: &dyn DesignateClient,
    entries: &AggregatedEntries,
    zones: &ManagedZones,
    dry_run: bool,
) -> Result<(), ProviderError> {
    let mut first_error = None;

    for entry in entries.values() {
        if let Err(e) = apply_entry(client, entry, zones, dry_run).await {
            error!(
                dns_name = %entry.dns_name,
                record_type = %entry.record_type,
                error = %e,
                "Failed to apply record set"
            );
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn apply_entry(
    client: &dyn DesignateClient,
    entry: &RecordSetEntry,
    zones: &ManagedZones,
    dry_run: bool,
) -> Result<(), ProviderError> {
    let mutation_error = |operation: MutationKind| {
        move |source: ClientError| ProviderError::RecordMutation {
            operation,
            dns_name: entry.dns_name.clone(),
            record_type: entry.record_type.to_string(),
            source,
        }
    };

    match plan_action(entry, zones) {
        Action::Skip => {
            debug!(
                dns_name = %entry.dns_name,
                "Skipping record set: no managed zone matches its name"
            );
            Ok(())
        }
        Action::Noop => Ok(()),
        Action::Create { zone_id, records } => {
            info!(
                dns_name = %entry.dns_name,
                record_type = %entry.record_type,
                zone_id = %zone_id,
                records = %records.join(","),
                dry_run = dry_run,
                "Creating record set"
            );
            if dry_run {
                return Ok(());
            }
            let opts = CreateOpts {
                name: entry.dns_name.clone(),
                record_type: entry.record_type.to_string(),
                records,
                ttl: entry.ttl,
            };
            let id = client
                .create_record_set(&zone_id, &opts)
                .await
                .map_err(mutation_error(MutationKind::Create))?;
            debug!(dns_name = %entry.dns_name, record_set_id = %id, "Created record set");
            Ok(())
        }
        Action::Update {
            zone_id,
            record_set_id,
            records,
        } => {
            info!(
                dns_name = %entry.dns_name,
                record_type = %entry.record_type,
                record_set_id = %record_set_id,
                records = %records.join(","),
                dry_run = dry_run,
                "Updating record set"
            );
            if dry_run {
                return Ok(());
            }
            let opts = UpdateOpts {
                records,
                ttl: entry.ttl,
            };
            client
                .update_record_set(&zone_id, &record_set_id, &opts)
                .await
                .map_err(mutation_error(MutationKind::Update))
        }
        Action::Delete {
            zone_id,
            record_set_id,
        } => {
            info!(
                dns_name = %entry.dns_name,
                record_type = %entry.record_type,
                record_set_id = %record_set_id,
                dry_run = dry_run,
                "Deleting record set"
            );
            if dry_run {
                return Ok(());
            }
            client
                .delete_record_set(&zone_id, &record_set_id)
                .await
                .map_err(mutation_error(MutationKind::Delete))
        }
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod reconcile_tests;
