// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Stateful Keystone and Designate stand-in for integration tests.
//!
//! Serves just enough of the Keystone v3 token API and the Designate v2 zone and
//! record set API for `HttpDesignateClient`. Record set listings are paged two at a
//! time so pagination is exercised on every read.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const TEST_TOKEN: &str = "integration-token";
const PAGE_SIZE: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecordSet {
    pub id: String,
    pub zone_id: String,
    pub name: String,
    pub record_type: String,
    pub records: Vec<String>,
    pub ttl: Option<u64>,
}

impl StoredRecordSet {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "zone_id": self.zone_id,
            "name": self.name,
            "type": self.record_type,
            "records": self.records,
            "ttl": self.ttl,
        })
    }
}

#[derive(Default)]
struct MockState {
    base_url: String,
    zones: Vec<Value>,
    record_sets: BTreeMap<String, StoredRecordSet>,
    next_id: u32,
    mutations: usize,
    token_requests: usize,
}

type SharedState = Arc<Mutex<MockState>>;

/// Handle to a running mock OpenStack API.
#[derive(Clone)]
pub struct MockOpenStack {
    state: SharedState,
    pub base_url: String,
}

impl MockOpenStack {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(Mutex::new(MockState {
            base_url: base_url.clone(),
            ..MockState::default()
        }));

        let router = Router::new()
            .route("/v3/auth/tokens", post(issue_token))
            .route("/dns/v2/zones", get(list_zones))
            .route(
                "/dns/v2/zones/{zone_id}/recordsets",
                get(list_record_sets).post(create_record_set),
            )
            .route(
                "/dns/v2/zones/{zone_id}/recordsets/{record_set_id}",
                put(update_record_set).delete(delete_record_set),
            )
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { state, base_url }
    }

    /// Keystone URL to use as `OS_AUTH_URL`
    pub fn auth_url(&self) -> String {
        format!("{}/v3", self.base_url)
    }

    pub fn add_zone(&self, id: &str, name: &str, zone_type: &str, status: &str) {
        self.state.lock().unwrap().zones.push(json!({
            "id": id,
            "name": name,
            "type": zone_type,
            "status": status,
        }));
    }

    pub fn seed(&self, zone_id: &str, name: &str, record_type: &str, records: &[&str]) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("rs-{:04}", state.next_id);
        state.record_sets.insert(
            id.clone(),
            StoredRecordSet {
                id: id.clone(),
                zone_id: zone_id.to_string(),
                name: name.to_string(),
                record_type: record_type.to_string(),
                records: records.iter().map(|r| (*r).to_string()).collect(),
                ttl: None,
            },
        );
        id
    }

    /// Record set by name and type, records sorted
    pub fn find(&self, name: &str, record_type: &str) -> Option<StoredRecordSet> {
        self.state
            .lock()
            .unwrap()
            .record_sets
            .values()
            .find(|rs| rs.name == name && rs.record_type == record_type)
            .cloned()
            .map(|mut rs| {
                rs.records.sort();
                rs
            })
    }

    pub fn record_set_count(&self) -> usize {
        self.state.lock().unwrap().record_sets.len()
    }

    pub fn mutations(&self) -> usize {
        self.state.lock().unwrap().mutations
    }

    pub fn token_requests(&self) -> usize {
        self.state.lock().unwrap().token_requests
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-auth-token")
        .and_then(|value| value.to_str().ok())
        == Some(TEST_TOKEN)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"code": 401, "type": "unauthorized"}))).into_response()
}

async fn issue_token(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let methods = &body["auth"]["identity"]["methods"];
    if !methods.is_array() {
        return (StatusCode::BAD_REQUEST, "missing auth methods").into_response();
    }

    let mut state = state.lock().unwrap();
    state.token_requests += 1;
    let catalog = json!({
        "token": {
            "expires_at": "2099-12-31T23:59:59.000000Z",
            "catalog": [{
                "type": "dns",
                "name": "designate",
                "endpoints": [
                    {"interface": "public", "region": "RegionOne", "url": format!("{}/dns/", state.base_url)}
                ]
            }]
        }
    });
    (
        StatusCode::CREATED,
        [("X-Subject-Token", TEST_TOKEN)],
        Json(catalog),
    )
        .into_response()
}

async fn list_zones(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    Json(json!({"zones": state.zones, "links": {}})).into_response()
}

async fn list_record_sets(
    State(state): State<SharedState>,
    Path(zone_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    let marker = query.get("marker");
    let remaining: Vec<&StoredRecordSet> = state
        .record_sets
        .values()
        .filter(|rs| rs.zone_id == zone_id)
        .filter(|rs| marker.map_or(true, |m| rs.id.as_str() > m.as_str()))
        .collect();

    let page: Vec<Value> = remaining.iter().take(PAGE_SIZE).map(|rs| rs.to_json()).collect();
    let links = if remaining.len() > PAGE_SIZE {
        let last = &remaining[PAGE_SIZE - 1].id;
        json!({"next": format!("{}/dns/v2/zones/{zone_id}/recordsets?marker={last}", state.base_url)})
    } else {
        json!({})
    };
    Json(json!({"recordsets": page, "links": links})).into_response()
}

async fn create_record_set(
    State(state): State<SharedState>,
    Path(zone_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.mutations += 1;
    state.next_id += 1;
    let record_set = StoredRecordSet {
        id: format!("rs-{:04}", state.next_id),
        zone_id,
        name: body["name"].as_str().unwrap_or_default().to_string(),
        record_type: body["type"].as_str().unwrap_or_default().to_string(),
        records: string_list(&body["records"]),
        ttl: body["ttl"].as_u64(),
    };
    let response = record_set.to_json();
    state.record_sets.insert(record_set.id.clone(), record_set);
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn update_record_set(
    State(state): State<SharedState>,
    Path((_zone_id, record_set_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.mutations += 1;
    match state.record_sets.get_mut(&record_set_id) {
        Some(record_set) => {
            record_set.records = string_list(&body["records"]);
            record_set.ttl = body["ttl"].as_u64();
            (StatusCode::ACCEPTED, Json(record_set.to_json())).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_record_set(
    State(state): State<SharedState>,
    Path((_zone_id, record_set_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.mutations += 1;
    match state.record_sets.remove(&record_set_id) {
        Some(_) => StatusCode::ACCEPTED.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
