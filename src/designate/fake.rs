// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`DesignateClient`] for unit tests.

use super::{CreateOpts, DesignateClient, RecordSet, UpdateOpts, Zone};
use crate::errors::ClientError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Default)]
struct FakeZone {
    zone: Zone,
    record_sets: BTreeMap<String, RecordSet>,
}

#[derive(Default)]
struct State {
    zones: BTreeMap<String, FakeZone>,
    last_id: u32,
    mutations: usize,
    fail_zone_listing: bool,
    fail_record_listing: BTreeSet<String>,
    fail_mutations_for: BTreeSet<String>,
}

#[derive(Default)]
pub(crate) struct FakeDesignateClient {
    state: Mutex<State>,
}

fn injected_failure(what: &str) -> ClientError {
    ClientError::Status {
        method: "TEST".to_string(),
        url: what.to_string(),
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "injected failure".to_string(),
    }
}

impl FakeDesignateClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a zone; its ID defaults to its name.
    pub(crate) fn add_zone(&self, mut zone: Zone) -> String {
        if zone.id.is_empty() {
            zone.id = zone.name.clone();
        }
        let id = zone.id.clone();
        self.state.lock().unwrap().zones.insert(
            id.clone(),
            FakeZone {
                zone,
                record_sets: BTreeMap::new(),
            },
        );
        id
    }

    pub(crate) fn add_active_zone(&self, id: &str, name: &str) -> String {
        self.add_zone(Zone {
            id: id.to_string(),
            name: name.to_string(),
            zone_type: "PRIMARY".to_string(),
            status: "ACTIVE".to_string(),
        })
    }

    /// Seed a record set without counting it as a mutation.
    pub(crate) fn seed_record_set(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
        records: &[&str],
        ttl: Option<u32>,
    ) -> String {
        let mut state = self.state.lock().unwrap();
        state.last_id += 1;
        let id = format!("id-{}", state.last_id);
        let zone = state.zones.get_mut(zone_id).expect("unknown zone");
        zone.record_sets.insert(
            id.clone(),
            RecordSet {
                id: id.clone(),
                zone_id: zone_id.to_string(),
                name: name.to_string(),
                record_type: record_type.to_string(),
                records: records.iter().map(|r| (*r).to_string()).collect(),
                ttl,
                description: None,
            },
        );
        id
    }

    /// All record sets across all zones, records sorted.
    pub(crate) fn record_sets(&self) -> Vec<RecordSet> {
        let state = self.state.lock().unwrap();
        state
            .zones
            .values()
            .flat_map(|zone| zone.record_sets.values().cloned())
            .map(|mut rs| {
                rs.records.sort();
                rs
            })
            .collect()
    }

    pub(crate) fn find(&self, name: &str, record_type: &str) -> Option<RecordSet> {
        self.record_sets()
            .into_iter()
            .find(|rs| rs.name == name && rs.record_type == record_type)
    }

    pub(crate) fn mutation_count(&self) -> usize {
        self.state.lock().unwrap().mutations
    }

    pub(crate) fn fail_zone_listing(&self) {
        self.state.lock().unwrap().fail_zone_listing = true;
    }

    pub(crate) fn fail_record_listing(&self, zone_id: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_record_listing
            .insert(zone_id.to_string());
    }

    /// Fail every mutation touching a record set with this (canonical) name.
    pub(crate) fn fail_mutations_for(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_mutations_for
            .insert(name.to_string());
    }
}

#[async_trait]
impl DesignateClient for FakeDesignateClient {
    async fn for_each_zone(
        &self,
        handler: &mut (dyn for<'z> FnMut(&'z Zone) -> Result<(), ClientError> + Send),
    ) -> Result<(), ClientError> {
        let zones: Vec<Zone> = {
            let state = self.state.lock().unwrap();
            if state.fail_zone_listing {
                return Err(injected_failure("zones"));
            }
            state.zones.values().map(|z| z.zone.clone()).collect()
        };
        for zone in &zones {
            handler(zone)?;
        }
        Ok(())
    }

    async fn for_each_record_set(
        &self,
        zone_id: &str,
        handler: &mut (dyn for<'r> FnMut(&'r RecordSet) -> Result<(), ClientError> + Send),
    ) -> Result<(), ClientError> {
        let record_sets: Vec<RecordSet> = {
            let state = self.state.lock().unwrap();
            if state.fail_record_listing.contains(zone_id) {
                return Err(injected_failure(zone_id));
            }
            let zone = state.zones.get(zone_id).ok_or_else(|| ClientError::NotFound {
                kind: "zone",
                id: zone_id.to_string(),
            })?;
            zone.record_sets.values().cloned().collect()
        };
        for record_set in &record_sets {
            handler(record_set)?;
        }
        Ok(())
    }

    async fn create_record_set(
        &self,
        zone_id: &str,
        opts: &CreateOpts,
    ) -> Result<String, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        if state.fail_mutations_for.contains(&opts.name) {
            return Err(injected_failure(&opts.name));
        }
        state.last_id += 1;
        let id = format!("id-{}", state.last_id);
        let zone = state.zones.get_mut(zone_id).ok_or_else(|| ClientError::NotFound {
            kind: "zone",
            id: zone_id.to_string(),
        })?;
        zone.record_sets.insert(
            id.clone(),
            RecordSet {
                id: id.clone(),
                zone_id: zone_id.to_string(),
                name: opts.name.clone(),
                record_type: opts.record_type.clone(),
                records: opts.records.clone(),
                ttl: opts.ttl,
                description: None,
            },
        );
        Ok(id)
    }

    async fn update_record_set(
        &self,
        zone_id: &str,
        record_set_id: &str,
        opts: &UpdateOpts,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        let failing = state.fail_mutations_for.clone();
        let zone = state.zones.get_mut(zone_id).ok_or_else(|| ClientError::NotFound {
            kind: "zone",
            id: zone_id.to_string(),
        })?;
        let record_set =
            zone.record_sets
                .get_mut(record_set_id)
                .ok_or_else(|| ClientError::NotFound {
                    kind: "record set",
                    id: record_set_id.to_string(),
                })?;
        if failing.contains(&record_set.name) {
            return Err(injected_failure(&record_set.name));
        }
        record_set.records = opts.records.clone();
        record_set.ttl = opts.ttl;
        Ok(())
    }

    async fn delete_record_set(
        &self,
        zone_id: &str,
        record_set_id: &str,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        let failing = state.fail_mutations_for.clone();
        let zone = state.zones.get_mut(zone_id).ok_or_else(|| ClientError::NotFound {
            kind: "zone",
            id: zone_id.to_string(),
        })?;
        if let Some(record_set) = zone.record_sets.get(record_set_id) {
            if failing.contains(&record_set.name) {
                return Err(injected_failure(&record_set.name));
            }
        }
        zone.record_sets.remove(record_set_id);
        Ok(())
    }
}
