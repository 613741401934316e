// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Designate v2 HTTP client.
//!
//! All requests carry the Keystone token in `X-Auth-Token`. List calls follow the
//! `links.next` URL of each page until the last page. Every request is reported to the
//! injected [`ApiMetrics`]; failures are returned to the caller without retrying.

use super::auth::{authenticate, AuthSettings, Session};
use super::types::{CreateOpts, RecordSet, RecordSetPage, UpdateOpts, Zone, ZonePage};
use super::DesignateClient;
use crate::constants::{
    AUTH_TOKEN_HEADER, HTTP_CONNECT_TIMEOUT_SECS, HTTP_POOL_IDLE_TIMEOUT_SECS,
    HTTP_TCP_KEEPALIVE_SECS,
};
use crate::errors::ClientError;
use crate::metrics::ApiMetrics;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// [`DesignateClient`] over the Designate v2 HTTP API.
pub struct HttpDesignateClient {
    http: HttpClient,
    settings: AuthSettings,
    session: Mutex<Session>,
    metrics: Arc<dyn ApiMetrics>,
}

impl std::fmt::Debug for HttpDesignateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDesignateClient")
            .field("auth_url", &self.settings.auth_url)
            .finish_non_exhaustive()
    }
}

impl HttpDesignateClient {
    /// Authenticate against Keystone and build a client for the Designate endpoint
    /// found in the service catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or authentication fails.
    pub async fn connect(
        settings: AuthSettings,
        metrics: Arc<dyn ApiMetrics>,
    ) -> Result<Self, ClientError> {
        let http = build_http_client(&settings)?;
        let session = timed(metrics.as_ref(), "authenticate", authenticate(&http, &settings)).await?;
        Ok(Self::with_session(http, settings, session, metrics))
    }

    /// Build a client around an already issued session.
    #[must_use]
    pub fn with_session(
        http: HttpClient,
        settings: AuthSettings,
        session: Session,
        metrics: Arc<dyn ApiMetrics>,
    ) -> Self {
        Self {
            http,
            settings,
            session: Mutex::new(session),
            metrics,
        }
    }

    /// Current token and endpoint, re-authenticating first when the token is about to expire.
    async fn session(&self) -> Result<Session, ClientError> {
        let mut session = self.session.lock().await;
        if session.needs_refresh(Utc::now()) {
            debug!("Keystone token is about to expire, re-authenticating");
            *session = timed(
                self.metrics.as_ref(),
                "authenticate",
                authenticate(&self.http, &self.settings),
            )
            .await?;
        }
        Ok(session.clone())
    }

    async fn request<B: Serialize + Sync>(
        &self,
        operation: &str,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<String, ClientError> {
        let session = self.session().await?;
        timed(self.metrics.as_ref(), operation, async {
            debug!(method = %method, url = %url, "Designate API request");

            let mut request = self
                .http
                .request(method.clone(), url)
                .header(AUTH_TOKEN_HEADER, &session.token);
            if let Some(body) = body {
                request = request.json(body);
            }

            let request_error = |source| ClientError::Request {
                method: method.to_string(),
                url: url.to_string(),
                source,
            };
            let response = request.send().await.map_err(request_error)?;
            let status = response.status();
            let text = response.text().await.map_err(request_error)?;

            if !status.is_success() {
                warn!(method = %method, url = %url, status = %status, "Designate API request failed");
                return Err(ClientError::Status {
                    method: method.to_string(),
                    url: url.to_string(),
                    status,
                    body: text,
                });
            }
            Ok(text)
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, url: &str) -> Result<T, ClientError> {
        let text = self.request::<()>(operation, Method::GET, url, None).await?;
        serde_json::from_str(&text).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn endpoint(&self) -> Result<String, ClientError> {
        Ok(self.session().await?.dns_endpoint)
    }
}

#[async_trait]
impl DesignateClient for HttpDesignateClient {
    async fn for_each_zone(
        &self,
        handler: &mut (dyn for<'z> FnMut(&'z Zone) -> Result<(), ClientError> + Send),
    ) -> Result<(), ClientError> {
        let mut next = Some(format!("{}/zones", self.endpoint().await?));
        while let Some(url) = next {
            let page: ZonePage = self.get_json("list_zones", &url).await?;
            for zone in &page.zones {
                handler(zone)?;
            }
            next = page.links.next;
        }
        Ok(())
    }

    async fn for_each_record_set(
        &self,
        zone_id: &str,
        handler: &mut (dyn for<'r> FnMut(&'r RecordSet) -> Result<(), ClientError> + Send),
    ) -> Result<(), ClientError> {
        let mut next = Some(format!(
            "{}/zones/{zone_id}/recordsets",
            self.endpoint().await?
        ));
        while let Some(url) = next {
            let page: RecordSetPage = self.get_json("list_record_sets", &url).await?;
            for record_set in &page.recordsets {
                handler(record_set)?;
            }
            next = page.links.next;
        }
        Ok(())
    }

    async fn create_record_set(
        &self,
        zone_id: &str,
        opts: &CreateOpts,
    ) -> Result<String, ClientError> {
        let url = format!("{}/zones/{zone_id}/recordsets", self.endpoint().await?);
        let text = self
            .request("create_record_set", Method::POST, &url, Some(opts))
            .await?;
        let created: RecordSet =
            serde_json::from_str(&text).map_err(|source| ClientError::Decode { url, source })?;
        Ok(created.id)
    }

    async fn update_record_set(
        &self,
        zone_id: &str,
        record_set_id: &str,
        opts: &UpdateOpts,
    ) -> Result<(), ClientError> {
        let url = format!(
            "{}/zones/{zone_id}/recordsets/{record_set_id}",
            self.endpoint().await?
        );
        self.request("update_record_set", Method::PUT, &url, Some(opts))
            .await
            .map(|_| ())
    }

    async fn delete_record_set(
        &self,
        zone_id: &str,
        record_set_id: &str,
    ) -> Result<(), ClientError> {
        let url = format!(
            "{}/zones/{zone_id}/recordsets/{record_set_id}",
            self.endpoint().await?
        );
        self.request::<()>("delete_record_set", Method::DELETE, &url, None)
            .await
            .map(|_| ())
    }
}

/// Build the reqwest client used for Keystone and Designate.
///
/// # Errors
///
/// Returns [`ClientError::Config`] if the configured CA certificate cannot be loaded.
pub fn build_http_client(settings: &AuthSettings) -> Result<HttpClient, ClientError> {
    let mut builder = HttpClient::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .tcp_keepalive(Duration::from_secs(HTTP_TCP_KEEPALIVE_SECS))
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS));

    if let Some(path) = &settings.ca_cert {
        let pem = std::fs::read(path).map_err(|e| {
            ClientError::Config(format!("Failed to read CA certificate {}: {e}", path.display()))
        })?;
        let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
            ClientError::Config(format!("Invalid CA certificate {}: {e}", path.display()))
        })?;
        builder = builder.add_root_certificate(certificate);
    }

    builder
        .build()
        .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Run one API call, reporting it, its latency and any failure to `metrics`.
async fn timed<T, F>(metrics: &dyn ApiMetrics, operation: &str, call: F) -> Result<T, ClientError>
where
    F: std::future::Future<Output = Result<T, ClientError>>,
{
    let start = Instant::now();
    metrics.record_call(operation);
    let result = call.await;
    metrics.record_latency(operation, start.elapsed());
    if result.is_err() {
        metrics.record_failure(operation);
    }
    result
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
