// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain filter restricting which Designate zones the webhook may see.
//!
//! A filter is configured once at startup from `--domain-filter` and
//! `--exclude-domains`. A zone is accepted when it matches one of the include entries
//! (or no include entries are configured) and none of the exclude entries.
//!
//! Matching follows external-dns semantics:
//! - `example.com` accepts `example.com` and any subdomain such as `a.example.com`
//! - `.example.com` accepts only subdomains of `example.com`
//! - comparison ignores case and a trailing dot
//!
//! # Example
//!
//! ```rust
//! use designate_webhook::domain_filter::DomainFilter;
//!
//! let filter = DomainFilter::new(&["example.com".to_string()], &["internal.example.com".to_string()]);
//! assert!(filter.matches("www.example.com."));
//! assert!(!filter.matches("db.internal.example.com."));
//! assert!(!filter.matches("example.org."));
//! ```

use serde::{Deserialize, Serialize};

/// Include/exclude domain predicate. Serializes as the external-dns negotiation payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFilter {
    #[serde(rename = "include", default, skip_serializing_if = "Vec::is_empty")]
    filters: Vec<String>,
    #[serde(rename = "exclude", default, skip_serializing_if = "Vec::is_empty")]
    exclude: Vec<String>,
}

impl DomainFilter {
    /// Build a filter, dropping blank entries.
    #[must_use]
    pub fn new(filters: &[String], exclude: &[String]) -> Self {
        Self {
            filters: prepare(filters),
            exclude: prepare(exclude),
        }
    }

    /// A filter accepting every domain.
    #[must_use]
    pub fn accept_all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    #[must_use]
    pub fn exclusions(&self) -> &[String] {
        &self.exclude
    }

    /// Whether `domain` is visible through this filter.
    #[must_use]
    pub fn matches(&self, domain: &str) -> bool {
        match_filter(&self.filters, domain, true) && !match_filter(&self.exclude, domain, false)
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_lowercase()
}

fn prepare(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| normalize(entry))
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn match_filter(filters: &[String], domain: &str, empty_value: bool) -> bool {
    if filters.is_empty() {
        return empty_value;
    }

    let domain = normalize(domain);
    filters.iter().any(|filter| {
        if filter.starts_with('.') {
            domain.ends_with(filter.as_str())
        } else if domain.matches('.').count() == filter.matches('.').count() {
            domain == *filter
        } else {
            domain.ends_with(&format!(".{filter}"))
        }
    })
}

#[cfg(test)]
#[path = "domain_filter_tests.rs"]
mod domain_filter_tests;
