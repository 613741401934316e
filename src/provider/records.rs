// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reading the current record state of all managed zones as endpoints.

use super::zones::ManagedZones;
use crate::constants::ORIGINAL_RECORDS_SEPARATOR;
use crate::designate::{DesignateClient, RecordSet};
use crate::endpoint::{Endpoint, RecordType};
use crate::errors::ProviderError;
use crate::labels::{LABEL_ORIGINAL_RECORDS, LABEL_RECORD_SET_ID, LABEL_ZONE_ID};
use tracing::debug;

/// Build the endpoint for a record set of `zone_id`, or `None` if its type is not managed.
///
/// The endpoint carries the record set ID, zone ID and the raw record values as labels.
#[must_use]
pub fn endpoint_from_record_set(zone_id: &str, record_set: &RecordSet) -> Option<Endpoint> {
    RecordType::parse(&record_set.record_type)?;

    let original_records = record_set
        .records
        .join(&ORIGINAL_RECORDS_SEPARATOR.to_string());
    let endpoint = Endpoint::with_ttl(
        &record_set.name,
        &record_set.record_type,
        record_set.ttl,
        record_set.records.clone(),
    )
    .with_label(LABEL_RECORD_SET_ID, &record_set.id)
    .with_label(LABEL_ZONE_ID, zone_id)
    .with_label(LABEL_ORIGINAL_RECORDS, &original_records);
    Some(endpoint)
}

/// List every A, TXT and CNAME record set of the managed zones.
///
/// # Errors
///
/// Returns [`ProviderError::RecordListing`] as soon as listing any zone fails;
/// nothing read so far is returned.
pub async fn list_endpoints(
    client: &dyn DesignateClient,
    zones: &ManagedZones,
) -> Result<Vec<Endpoint>, ProviderError> {
    let mut endpoints = Vec::new();

    for zone_id in zones.keys() {
        let before = endpoints.len();
        client
            .for_each_record_set(zone_id, &mut |record_set| {
                if let Some(endpoint) = endpoint_from_record_set(zone_id, record_set) {
                    endpoints.push(endpoint);
                }
                Ok(())
            })
            .await
            .map_err(|source| ProviderError::RecordListing {
                zone_id: zone_id.clone(),
                source,
            })?;
        debug!(
            zone_id = %zone_id,
            endpoints = endpoints.len() - before,
            "Listed record sets of zone"
        );
    }

    Ok(endpoints)
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
