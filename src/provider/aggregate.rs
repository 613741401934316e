// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Folding a change batch into one desired state per record set.
//!
//! external-dns sends endpoints, Designate stores record sets. Several endpoints of a
//! batch can address the same hostname and record type (a create and a delete arriving
//! together, or the old and new halves of an update), so the batch is grouped by
//! [`RecordSetKey`] and each group is replayed into a [`RecordSetEntry`]:
//!
//! 1. the `original-records` labels seed every observed target as wanted
//! 2. each endpoint then marks its targets wanted (create, update-new) or unwanted
//!    (update-old, delete), in [`ChangeKind::ORDER`], a later mark winning
//!
//! The wanted targets of an entry are therefore "what was observed, plus additions,
//! minus removals", and targets the batch never mentions are kept.

use super::zones::canonicalize_domain_name;
use crate::constants::ORIGINAL_RECORDS_SEPARATOR;
use crate::endpoint::{Changes, Endpoint, RecordType};
use crate::labels::{LABEL_ORIGINAL_RECORDS, LABEL_RECORD_SET_ID, LABEL_ZONE_ID};
use std::collections::BTreeMap;
use tracing::debug;

/// Phase of a change batch an endpoint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    UpdateOld,
    UpdateNew,
    Delete,
}

impl ChangeKind {
    /// Order in which the phases of a batch are replayed.
    ///
    /// Update batches must be paired: an update-old endpoint without its update-new
    /// counterpart (or the reverse) leaves the outcome to this order alone.
    pub const ORDER: [ChangeKind; 4] = [
        ChangeKind::Create,
        ChangeKind::UpdateOld,
        ChangeKind::UpdateNew,
        ChangeKind::Delete,
    ];

    /// Whether targets of this phase are added (`true`) or removed (`false`).
    #[must_use]
    pub fn wanted(self) -> bool {
        matches!(self, Self::Create | Self::UpdateNew)
    }

    fn endpoints(self, changes: &Changes) -> &[Endpoint] {
        match self {
            Self::Create => &changes.create,
            Self::UpdateOld => &changes.update_old,
            Self::UpdateNew => &changes.update_new,
            Self::Delete => &changes.delete,
        }
    }
}

/// Canonical hostname and record type: the identity of a record set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordSetKey {
    pub dns_name: String,
    pub record_type: RecordType,
}

/// Desired state of one record set after folding a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetEntry {
    /// Canonical hostname (lower-case, trailing dot)
    pub dns_name: String,
    pub record_type: RecordType,
    /// Empty when no endpoint carried a zone ID
    pub zone_id: String,
    /// Empty when the record set does not exist yet
    pub record_set_id: String,
    pub ttl: Option<u32>,
    /// Target value to wanted flag
    pub targets: BTreeMap<String, bool>,
}

impl RecordSetEntry {
    fn new(key: &RecordSetKey) -> Self {
        Self {
            dns_name: key.dns_name.clone(),
            record_type: key.record_type,
            zone_id: String::new(),
            record_set_id: String::new(),
            ttl: None,
            targets: BTreeMap::new(),
        }
    }

    /// Wanted targets in lexicographic order.
    #[must_use]
    pub fn records(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter(|(_, wanted)| **wanted)
            .map(|(target, _)| target.clone())
            .collect()
    }
}

/// Folded batch, iterated in key order.
pub type AggregatedEntries = BTreeMap<RecordSetKey, RecordSetEntry>;

/// Copy missing zone and record set ID labels from the current endpoint with the same
/// record type and the same raw hostname.
///
/// Some owner-tracking layers regenerate endpoints without the identity labels
/// this webhook attached when listing; without them an update would turn into a
/// second record set.
#[must_use]
pub fn backfill_identity(endpoint: &Endpoint, current: &[Endpoint]) -> Endpoint {
    let mut repaired = endpoint.clone();
    let has_zone_id = endpoint.labels.contains_key(LABEL_ZONE_ID);
    let has_record_set_id = endpoint.labels.contains_key(LABEL_RECORD_SET_ID);
    if has_zone_id && has_record_set_id {
        return repaired;
    }

    let Some(existing) = current
        .iter()
        .find(|c| c.record_type == endpoint.record_type && c.dns_name == endpoint.dns_name)
    else {
        return repaired;
    };

    for (key, present) in [
        (LABEL_ZONE_ID, has_zone_id),
        (LABEL_RECORD_SET_ID, has_record_set_id),
    ] {
        if present {
            continue;
        }
        if let Some(value) = existing.label(key) {
            repaired.labels.insert(key.to_string(), value.to_string());
        }
    }
    repaired
}

/// Fold a change batch into the desired state of every record set it touches.
///
/// `current` is the listing taken before the batch is applied; it is only used to
/// repair missing identity labels (see [`backfill_identity`]). Endpoints of
/// unsupported record types are ignored.
#[must_use]
pub fn fold_changes(changes: &Changes, current: &[Endpoint]) -> AggregatedEntries {
    let mut grouped: BTreeMap<RecordSetKey, Vec<(ChangeKind, Endpoint)>> = BTreeMap::new();

    for kind in ChangeKind::ORDER {
        for endpoint in kind.endpoints(changes) {
            let Some(record_type) = endpoint.supported_type() else {
                debug!(
                    dns_name = %endpoint.dns_name,
                    record_type = %endpoint.record_type,
                    "Ignoring endpoint with unsupported record type"
                );
                continue;
            };
            let key = RecordSetKey {
                dns_name: canonicalize_domain_name(&endpoint.dns_name),
                record_type,
            };
            grouped
                .entry(key)
                .or_default()
                .push((kind, backfill_identity(endpoint, current)));
        }
    }

    grouped
        .into_iter()
        .map(|(key, endpoints)| {
            let entry = replay(&key, &endpoints);
            (key, entry)
        })
        .collect()
}

/// Replay the endpoints of one record set: identity, TTL, baseline, then marks.
fn replay(key: &RecordSetKey, endpoints: &[(ChangeKind, Endpoint)]) -> RecordSetEntry {
    let mut entry = RecordSetEntry::new(key);

    for (_, endpoint) in endpoints {
        if entry.zone_id.is_empty() {
            entry.zone_id = endpoint.label(LABEL_ZONE_ID).unwrap_or_default().to_string();
        }
        if entry.record_set_id.is_empty() {
            entry.record_set_id = endpoint
                .label(LABEL_RECORD_SET_ID)
                .unwrap_or_default()
                .to_string();
        }
    }

    // The endpoint that opens the entry fixes its TTL for the whole batch.
    entry.ttl = endpoints.first().and_then(|(_, endpoint)| endpoint.ttl());

    for (_, endpoint) in endpoints {
        let observed = endpoint.label(LABEL_ORIGINAL_RECORDS).unwrap_or_default();
        for record in observed
            .split(ORIGINAL_RECORDS_SEPARATOR)
            .filter(|record| !record.is_empty())
        {
            entry.targets.entry(record.to_string()).or_insert(true);
        }
    }

    for (kind, endpoint) in endpoints {
        for target in &endpoint.targets {
            let target = match key.record_type {
                RecordType::Cname => canonicalize_domain_name(target),
                RecordType::A | RecordType::Txt => target.clone(),
            };
            entry.targets.insert(target, kind.wanted());
        }
    }

    entry
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod aggregate_tests;
