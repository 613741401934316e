// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Keystone v3 authentication.
//!
//! Credentials are read from the standard `OS_*` environment variables, optionally
//! layered on top of a named cloud from `clouds.yaml` (selected with `OS_CLOUD`).
//! Both password and application credential authentication are supported.
//!
//! # Example
//!
//! ```rust,no_run
//! use designate_webhook::designate::{auth::authenticate, AuthSettings};
//!
//! # async fn example() -> Result<(), designate_webhook::errors::ClientError> {
//! let settings = AuthSettings::from_env()?;
//! let http = reqwest::Client::new();
//! let session = authenticate(&http, &settings).await?;
//! println!("Designate at {}", session.dns_endpoint);
//! # Ok(())
//! # }
//! ```

use crate::constants::{
    DEFAULT_ENDPOINT_INTERFACE, DNS_SERVICE_TYPE, SUBJECT_TOKEN_HEADER, TOKEN_REFRESH_MARGIN_SECS,
};
use crate::errors::ClientError;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Legacy variable names filled from their modern counterparts when unset.
const ENV_REMAP: &[(&str, &str)] = &[
    ("OS_TENANT_NAME", "OS_PROJECT_NAME"),
    ("OS_TENANT_ID", "OS_PROJECT_ID"),
    ("OS_DOMAIN_NAME", "OS_USER_DOMAIN_NAME"),
    ("OS_DOMAIN_ID", "OS_USER_DOMAIN_ID"),
];

/// Keystone credentials and Designate endpoint selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSettings {
    /// Keystone v3 URL, e.g. `https://keystone.example.net:5000/v3`
    pub auth_url: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_domain_id: Option<String>,
    pub user_domain_name: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub project_domain_id: Option<String>,
    pub project_domain_name: Option<String>,
    pub application_credential_id: Option<String>,
    pub application_credential_name: Option<String>,
    pub application_credential_secret: Option<String>,
    /// Catalog region; any region when unset
    pub region: Option<String>,
    /// Catalog interface (`public`, `internal`, `admin`)
    pub interface: String,
    /// Extra PEM root certificate for TLS verification
    pub ca_cert: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct CloudsFile {
    #[serde(default)]
    clouds: HashMap<String, CloudConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct CloudConfig {
    #[serde(default)]
    auth: CloudAuth,
    region_name: Option<String>,
    interface: Option<String>,
    cacert: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CloudAuth {
    auth_url: Option<String>,
    user_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
    user_domain_id: Option<String>,
    user_domain_name: Option<String>,
    project_id: Option<String>,
    project_name: Option<String>,
    project_domain_id: Option<String>,
    project_domain_name: Option<String>,
    application_credential_id: Option<String>,
    application_credential_name: Option<String>,
    application_credential_secret: Option<String>,
}

impl AuthSettings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `clouds.yaml` cannot be read or the
    /// credentials are incomplete.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Read settings from a captured environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `clouds.yaml` cannot be read or the
    /// credentials are incomplete.
    pub fn from_vars(mut vars: HashMap<String, String>) -> Result<Self, ClientError> {
        remap_env(&mut vars);

        let mut settings = match non_empty(&vars, "OS_CLOUD") {
            Some(cloud) => Self::from_cloud(&vars, &cloud)?,
            None => Self::default(),
        };

        let first_of = |keys: &[&str]| keys.iter().find_map(|key| non_empty(&vars, key));
        let overlay = |slot: &mut Option<String>, keys: &[&str]| {
            if let Some(value) = first_of(keys) {
                *slot = Some(value);
            }
        };

        if let Some(auth_url) = first_of(&["OS_AUTH_URL"]) {
            settings.auth_url = auth_url;
        }
        overlay(&mut settings.user_id, &["OS_USER_ID"]);
        overlay(&mut settings.username, &["OS_USERNAME"]);
        overlay(&mut settings.password, &["OS_PASSWORD"]);
        overlay(
            &mut settings.user_domain_id,
            &["OS_USER_DOMAIN_ID", "OS_DOMAIN_ID"],
        );
        overlay(
            &mut settings.user_domain_name,
            &["OS_USER_DOMAIN_NAME", "OS_DOMAIN_NAME"],
        );
        overlay(&mut settings.project_id, &["OS_PROJECT_ID", "OS_TENANT_ID"]);
        overlay(
            &mut settings.project_name,
            &["OS_PROJECT_NAME", "OS_TENANT_NAME"],
        );
        overlay(&mut settings.project_domain_id, &["OS_PROJECT_DOMAIN_ID"]);
        overlay(&mut settings.project_domain_name, &["OS_PROJECT_DOMAIN_NAME"]);
        overlay(
            &mut settings.application_credential_id,
            &["OS_APPLICATION_CREDENTIAL_ID"],
        );
        overlay(
            &mut settings.application_credential_name,
            &["OS_APPLICATION_CREDENTIAL_NAME"],
        );
        overlay(
            &mut settings.application_credential_secret,
            &["OS_APPLICATION_CREDENTIAL_SECRET"],
        );
        overlay(&mut settings.region, &["OS_REGION_NAME"]);
        if let Some(interface) = first_of(&["OS_INTERFACE", "OS_ENDPOINT_TYPE"]) {
            settings.interface = interface;
        }
        if let Some(ca_cert) = first_of(&["OS_CACERT"]) {
            settings.ca_cert = Some(PathBuf::from(ca_cert));
        }

        if settings.interface.is_empty() {
            settings.interface = DEFAULT_ENDPOINT_INTERFACE.to_string();
        }
        settings.validate()?;
        Ok(settings)
    }

    fn from_cloud(vars: &HashMap<String, String>, cloud: &str) -> Result<Self, ClientError> {
        let path = clouds_file_path(vars).ok_or_else(|| {
            ClientError::Config(format!("OS_CLOUD={cloud} is set but no clouds.yaml was found"))
        })?;
        debug!(path = %path.display(), cloud = %cloud, "Loading cloud configuration");

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            ClientError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut file: CloudsFile = serde_yaml::from_str(&contents).map_err(|e| {
            ClientError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        let config = file.clouds.remove(cloud).ok_or_else(|| {
            ClientError::Config(format!("Cloud '{cloud}' not found in {}", path.display()))
        })?;

        let auth = config.auth;
        Ok(Self {
            auth_url: auth.auth_url.unwrap_or_default(),
            user_id: auth.user_id,
            username: auth.username,
            password: auth.password,
            user_domain_id: auth.user_domain_id,
            user_domain_name: auth.user_domain_name,
            project_id: auth.project_id,
            project_name: auth.project_name,
            project_domain_id: auth.project_domain_id,
            project_domain_name: auth.project_domain_name,
            application_credential_id: auth.application_credential_id,
            application_credential_name: auth.application_credential_name,
            application_credential_secret: auth.application_credential_secret,
            region: config.region_name,
            interface: config.interface.unwrap_or_default(),
            ca_cert: config.cacert.map(PathBuf::from),
        })
    }

    /// Whether application credential authentication is configured.
    #[must_use]
    pub fn uses_application_credential(&self) -> bool {
        self.application_credential_secret.is_some()
            && (self.application_credential_id.is_some()
                || self.application_credential_name.is_some())
    }

    fn validate(&self) -> Result<(), ClientError> {
        if self.auth_url.is_empty() {
            return Err(ClientError::Config("OS_AUTH_URL is not set".to_string()));
        }
        url::Url::parse(&self.auth_url).map_err(|e| {
            ClientError::Config(format!("OS_AUTH_URL '{}' is not a valid URL: {e}", self.auth_url))
        })?;
        if self.uses_application_credential() {
            if self.application_credential_id.is_none() && !self.has_user() {
                return Err(ClientError::Config(
                    "application credential name requires a user".to_string(),
                ));
            }
            return Ok(());
        }
        if !self.has_user() {
            return Err(ClientError::Config(
                "neither OS_USER_ID nor OS_USERNAME is set".to_string(),
            ));
        }
        if self.password.is_none() {
            return Err(ClientError::Config("OS_PASSWORD is not set".to_string()));
        }
        Ok(())
    }

    fn has_user(&self) -> bool {
        self.user_id.is_some() || self.username.is_some()
    }

    fn user_domain(&self) -> Option<Value> {
        domain_ref(
            self.user_domain_id.as_deref(),
            self.user_domain_name.as_deref(),
        )
    }

    fn user_ref(&self) -> Value {
        let mut user = Map::new();
        if let Some(id) = &self.user_id {
            user.insert("id".into(), json!(id));
        } else if let Some(name) = &self.username {
            user.insert("name".into(), json!(name));
            if let Some(domain) = self.user_domain() {
                user.insert("domain".into(), domain);
            }
        }
        Value::Object(user)
    }

    fn scope(&self) -> Option<Value> {
        if let Some(id) = &self.project_id {
            return Some(json!({ "project": { "id": id } }));
        }
        let name = self.project_name.as_ref()?;
        let domain = domain_ref(
            self.project_domain_id.as_deref(),
            self.project_domain_name.as_deref(),
        )
        .or_else(|| self.user_domain())?;
        Some(json!({ "project": { "name": name, "domain": domain } }))
    }

    /// Keystone `POST /auth/tokens` request body.
    #[must_use]
    pub fn token_request(&self) -> Value {
        if self.uses_application_credential() {
            let secret = self.application_credential_secret.clone().unwrap_or_default();
            let credential = match &self.application_credential_id {
                Some(id) => json!({ "id": id, "secret": secret }),
                None => json!({
                    "name": self.application_credential_name,
                    "secret": secret,
                    "user": self.user_ref(),
                }),
            };
            return json!({
                "auth": {
                    "identity": {
                        "methods": ["application_credential"],
                        "application_credential": credential,
                    }
                }
            });
        }

        let mut user = self.user_ref();
        if let Value::Object(map) = &mut user {
            map.insert(
                "password".into(),
                json!(self.password.clone().unwrap_or_default()),
            );
        }
        let mut auth = json!({
            "identity": {
                "methods": ["password"],
                "password": { "user": user },
            }
        });
        if let (Some(scope), Value::Object(map)) = (self.scope(), &mut auth) {
            map.insert("scope".into(), scope);
        }
        json!({ "auth": auth })
    }
}

/// An issued Keystone token and the Designate endpoint found in its catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// Designate v2 base URL without trailing slash, e.g. `https://dns.example.net/v2`
    pub dns_endpoint: String,
}

impl Session {
    /// Whether the token expires within the refresh margin at `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires| expires - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) <= now)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    expires_at: Option<String>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogEndpoint {
    interface: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    region_id: Option<String>,
    url: String,
}

/// Issue a Keystone token and locate the Designate endpoint.
///
/// # Errors
///
/// Returns [`ClientError::Request`] if Keystone cannot be reached,
/// [`ClientError::Auth`] if it rejects the credentials or omits the token, and
/// [`ClientError::Config`] if the catalog has no matching DNS endpoint.
pub async fn authenticate(
    http: &reqwest::Client,
    settings: &AuthSettings,
) -> Result<Session, ClientError> {
    let url = format!("{}/auth/tokens", settings.auth_url.trim_end_matches('/'));
    info!(url = %url, "Authenticating against OpenStack Keystone");

    let response = http
        .post(&url)
        .json(&settings.token_request())
        .send()
        .await
        .map_err(|source| ClientError::Request {
            method: "POST".to_string(),
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    let token = response
        .headers()
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .text()
        .await
        .map_err(|source| ClientError::Request {
            method: "POST".to_string(),
            url: url.clone(),
            source,
        })?;

    if !status.is_success() {
        return Err(ClientError::Auth(format!("HTTP {status}: {body}")));
    }
    let token = token.ok_or_else(|| {
        ClientError::Auth(format!("response carries no {SUBJECT_TOKEN_HEADER} header"))
    })?;
    let parsed: TokenResponse =
        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            url: url.clone(),
            source,
        })?;

    let expires_at = parsed
        .token
        .expires_at
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.with_timezone(&Utc));
    let dns_endpoint = find_dns_endpoint(&parsed.token.catalog, settings)?;
    info!(endpoint = %dns_endpoint, "Found OpenStack Designate service");

    Ok(Session {
        token,
        expires_at,
        dns_endpoint,
    })
}

fn find_dns_endpoint(
    catalog: &[CatalogEntry],
    settings: &AuthSettings,
) -> Result<String, ClientError> {
    let region_matches = |endpoint: &CatalogEndpoint| match &settings.region {
        None => true,
        Some(region) => {
            endpoint.region.as_deref() == Some(region.as_str())
                || endpoint.region_id.as_deref() == Some(region.as_str())
        }
    };

    catalog
        .iter()
        .filter(|entry| entry.service_type == DNS_SERVICE_TYPE)
        .flat_map(|entry| entry.endpoints.iter())
        .find(|endpoint| endpoint.interface == settings.interface && region_matches(endpoint))
        .map(|endpoint| designate_base_url(&endpoint.url))
        .ok_or_else(|| {
            ClientError::Config(format!(
                "no {} endpoint for the dns service in region {}",
                settings.interface,
                settings.region.as_deref().unwrap_or("<any>")
            ))
        })
}

/// Normalize a catalog URL to the v2 API root, accepting both `https://dns/` and `https://dns/v2`.
pub(crate) fn designate_base_url(catalog_url: &str) -> String {
    let trimmed = catalog_url.trim_end_matches('/');
    let root = trimmed.strip_suffix("/v2").unwrap_or(trimmed);
    format!("{root}/v2")
}

fn remap_env(vars: &mut HashMap<String, String>) {
    for (legacy, modern) in ENV_REMAP {
        let legacy_set = vars.get(*legacy).is_some_and(|v| !v.is_empty());
        if legacy_set {
            continue;
        }
        if let Some(value) = vars.get(*modern).filter(|v| !v.is_empty()).cloned() {
            vars.insert((*legacy).to_string(), value);
        }
    }
}

fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).filter(|v| !v.is_empty()).cloned()
}

fn domain_ref(id: Option<&str>, name: Option<&str>) -> Option<Value> {
    match (id, name) {
        (Some(id), _) => Some(json!({ "id": id })),
        (None, Some(name)) => Some(json!({ "name": name })),
        (None, None) => None,
    }
}

fn clouds_file_path(vars: &HashMap<String, String>) -> Option<PathBuf> {
    if let Some(path) = non_empty(vars, "OS_CLIENT_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }
    let mut candidates = vec![PathBuf::from("clouds.yaml")];
    if let Some(home) = non_empty(vars, "HOME") {
        candidates.push(Path::new(&home).join(".config/openstack/clouds.yaml"));
    }
    candidates.push(PathBuf::from("/etc/openstack/clouds.yaml"));
    candidates.into_iter().find(|path| path.is_file())
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;
