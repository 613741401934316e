// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `DesignateProvider`.

#[cfg(test)]
mod tests {
    use crate::designate::fake::FakeDesignateClient;
    use crate::designate::{DesignateClient, RecordSet};
    use crate::domain_filter::DomainFilter;
    use crate::endpoint::{Changes, Endpoint};
    use crate::errors::ProviderError;
    use crate::labels::{LABEL_ORIGINAL_RECORDS, LABEL_RECORD_SET_ID, LABEL_ZONE_ID};
    use crate::provider::{DesignateProvider, Provider};
    use std::sync::Arc;

    fn setup(dry_run: bool) -> (Arc<FakeDesignateClient>, DesignateProvider) {
        let client = Arc::new(FakeDesignateClient::new());
        client.add_active_zone("zone-1", "example.com.");
        client.add_active_zone("zone-2", "test.net.");
        let provider = DesignateProvider::new(
            client.clone() as Arc<dyn DesignateClient>,
            DomainFilter::accept_all(),
            dry_run,
        );
        (client, provider)
    }

    fn ep(name: &str, record_type: &str, ttl: Option<u32>, targets: &[&str]) -> Endpoint {
        Endpoint::with_ttl(
            name,
            record_type,
            ttl,
            targets.iter().map(|t| (*t).to_string()).collect(),
        )
    }

    fn identified(endpoint: Endpoint, zone_id: &str, record_set: &RecordSet) -> Endpoint {
        let original = record_set.records.join("\u{0}");
        endpoint
            .with_label(LABEL_ZONE_ID, zone_id)
            .with_label(LABEL_RECORD_SET_ID, &record_set.id)
            .with_label(LABEL_ORIGINAL_RECORDS, &original)
    }

    fn records_of(client: &FakeDesignateClient, name: &str, record_type: &str) -> Vec<String> {
        client
            .find(name, record_type)
            .map(|rs| rs.records)
            .unwrap_or_default()
    }

    /// Pre-fills a TXT record and creates a batch that touches both zones.
    async fn create_records(client: &FakeDesignateClient, provider: &DesignateProvider) {
        client.seed_record_set("zone-1", "www.example.com.", "TXT", &["foo"], Some(60));

        let changes = Changes {
            create: vec![
                ep("www.example.com", "A", None, &["10.1.1.1"]),
                ep("www.example.com", "TXT", None, &["text1"]),
                ep("ftp.example.com", "A", Some(120), &["10.1.1.2"]),
                ep("srv.test.net", "A", None, &["10.2.1.1"]),
                ep("srv.test.net", "A", None, &["10.2.1.2"]),
                ep("db.test.net", "CNAME", None, &["sql.test.net"]),
            ],
            ..Changes::default()
        };
        provider.apply_changes(&changes).await.unwrap();
    }

    async fn update_records(client: &FakeDesignateClient, provider: &DesignateProvider) {
        let ftp = client.find("ftp.example.com.", "A").unwrap();
        let srv = client.find("srv.test.net.", "A").unwrap();

        let changes = Changes {
            update_old: vec![
                identified(ep("ftp.example.com", "A", Some(120), &["10.1.1.2"]), "zone-1", &ftp),
                identified(ep("srv.test.net.", "A", None, &["10.2.1.2"]), "zone-2", &srv),
            ],
            update_new: vec![
                identified(ep("ftp.example.com", "A", Some(60), &["10.3.3.1"]), "zone-1", &ftp),
                identified(ep("srv.test.net.", "A", None, &["10.3.3.2"]), "zone-2", &srv),
            ],
            ..Changes::default()
        };
        provider.apply_changes(&changes).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_records() {
        let (client, provider) = setup(false);

        create_records(&client, &provider).await;

        assert_eq!(client.record_sets().len(), 5);
        assert_eq!(records_of(&client, "www.example.com.", "A"), vec!["10.1.1.1"]);
        assert_eq!(records_of(&client, "srv.test.net.", "A"), vec!["10.2.1.1", "10.2.1.2"]);
        assert_eq!(records_of(&client, "db.test.net.", "CNAME"), vec!["sql.test.net."]);

        // The pre-filled TXT record set is taken over, not duplicated
        let txt = client.find("www.example.com.", "TXT").unwrap();
        assert_eq!(txt.records, vec!["text1"]);
        assert_eq!(txt.ttl, None);

        let ftp = client.find("ftp.example.com.", "A").unwrap();
        assert_eq!(ftp.ttl, Some(120));
        assert_eq!(ftp.zone_id, "zone-1");
        assert_eq!(client.find("srv.test.net.", "A").unwrap().zone_id, "zone-2");
    }

    #[tokio::test]
    async fn test_update_records_preserves_siblings() {
        let (client, provider) = setup(false);
        create_records(&client, &provider).await;

        update_records(&client, &provider).await;

        let ftp = client.find("ftp.example.com.", "A").unwrap();
        assert_eq!(ftp.records, vec!["10.3.3.1"]);
        // update-old opens the entry, so its TTL is the one sent
        assert_eq!(ftp.ttl, Some(120));
        assert_eq!(records_of(&client, "srv.test.net.", "A"), vec!["10.2.1.1", "10.3.3.2"]);
        assert_eq!(client.record_sets().len(), 5);
    }

    #[tokio::test]
    async fn test_delete_records() {
        let (client, provider) = setup(false);
        create_records(&client, &provider).await;
        update_records(&client, &provider).await;

        let www = client.find("www.example.com.", "A").unwrap();
        let srv = client.find("srv.test.net.", "A").unwrap();
        let changes = Changes {
            delete: vec![
                identified(ep("www.example.com.", "A", None, &["10.1.1.1"]), "zone-1", &www),
                identified(ep("srv.test.net.", "A", None, &["10.2.1.1"]), "zone-2", &srv),
            ],
            ..Changes::default()
        };
        provider.apply_changes(&changes).await.unwrap();

        assert!(client.find("www.example.com.", "A").is_none());
        assert_eq!(records_of(&client, "srv.test.net.", "A"), vec!["10.3.3.2"]);
        assert_eq!(client.record_sets().len(), 4);
    }

    #[tokio::test]
    async fn test_create_then_list_round_trip() {
        let (_client, provider) = setup(false);

        let changes = Changes {
            create: vec![ep("www.example.com", "A", None, &["10.1.1.1"])],
            ..Changes::default()
        };
        provider.apply_changes(&changes).await.unwrap();

        let endpoints = provider.records().await.unwrap();
        assert_eq!(endpoints.len(), 1);
        let endpoint = &endpoints[0];
        assert_eq!(endpoint.dns_name, "www.example.com");
        assert_eq!(endpoint.record_type, "A");
        assert_eq!(endpoint.targets, vec!["10.1.1.1"]);
        assert!(!endpoint.label(LABEL_ZONE_ID).unwrap_or_default().is_empty());
        assert!(!endpoint.label(LABEL_RECORD_SET_ID).unwrap_or_default().is_empty());
        assert_eq!(endpoint.label(LABEL_ORIGINAL_RECORDS), Some("10.1.1.1"));
    }

    #[tokio::test]
    async fn test_repeated_create_is_not_duplicated() {
        let (client, provider) = setup(false);
        let changes = Changes {
            create: vec![ep("www.example.com", "A", None, &["10.1.1.1"])],
            ..Changes::default()
        };
        provider.apply_changes(&changes).await.unwrap();

        // Second pass with labels taken from the listing
        let labelled = Changes {
            create: provider.records().await.unwrap(),
            ..Changes::default()
        };
        provider.apply_changes(&labelled).await.unwrap();
        // Third pass without labels, relying on the backfill
        provider.apply_changes(&changes).await.unwrap();

        assert_eq!(client.record_sets().len(), 1);
        assert_eq!(records_of(&client, "www.example.com.", "A"), vec!["10.1.1.1"]);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_designate_untouched() {
        let (client, provider) = setup(true);
        let rs = client.seed_record_set("zone-1", "www.example.com.", "A", &["10.1.1.1"], None);
        let before = provider.records().await.unwrap();

        let www = client.find("www.example.com.", "A").unwrap();
        let changes = Changes {
            create: vec![ep("new.example.com", "A", None, &["10.9.9.9"])],
            update_old: vec![identified(ep("www.example.com", "A", None, &["10.1.1.1"]), "zone-1", &www)],
            update_new: vec![identified(ep("www.example.com", "A", None, &["10.1.1.2"]), "zone-1", &www)],
            delete: vec![identified(ep("www.example.com", "A", None, &["10.1.1.1"]), "zone-1", &www)],
        };
        provider.apply_changes(&changes).await.unwrap();

        assert_eq!(client.mutation_count(), 0);
        assert_eq!(provider.records().await.unwrap(), before);
        assert_eq!(client.find("www.example.com.", "A").unwrap().id, rs);
    }

    #[tokio::test]
    async fn test_records_honours_domain_filter() {
        let client = Arc::new(FakeDesignateClient::new());
        client.add_active_zone("zone-1", "example.com.");
        client.add_active_zone("zone-2", "test.net.");
        client.seed_record_set("zone-1", "www.example.com.", "A", &["10.1.1.1"], None);
        client.seed_record_set("zone-2", "srv.test.net.", "A", &["10.2.1.1"], None);
        let provider = DesignateProvider::new(
            client.clone() as Arc<dyn DesignateClient>,
            DomainFilter::new(&["test.net".to_string()], &[]),
            false,
        );

        let endpoints = provider.records().await.unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].dns_name, "srv.test.net");

        // Hostnames outside the filtered zones are skipped, not errors
        let changes = Changes {
            create: vec![ep("api.example.com", "A", None, &["10.0.0.1"])],
            ..Changes::default()
        };
        provider.apply_changes(&changes).await.unwrap();
        assert_eq!(client.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_before_any_mutation() {
        let (client, provider) = setup(false);
        client.fail_record_listing("zone-2");

        let changes = Changes {
            create: vec![ep("www.example.com", "A", None, &["10.1.1.1"])],
            ..Changes::default()
        };
        let err = provider.apply_changes(&changes).await.unwrap_err();

        assert!(matches!(err, ProviderError::RecordListing { .. }));
        assert_eq!(client.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_zone_listing_failure_is_reported() {
        let (client, provider) = setup(false);
        client.fail_zone_listing();

        let err = provider.records().await.unwrap_err();
        assert!(matches!(err, ProviderError::ZoneListing { .. }));
    }

    #[tokio::test]
    async fn test_mutation_failure_does_not_stop_other_record_sets() {
        let (client, provider) = setup(false);
        client.fail_mutations_for("bad.example.com.");

        let changes = Changes {
            create: vec![
                ep("bad.example.com", "A", None, &["10.0.0.1"]),
                ep("good.test.net", "A", None, &["10.0.0.2"]),
            ],
            ..Changes::default()
        };
        let err = provider.apply_changes(&changes).await.unwrap_err();

        assert!(err.to_string().contains("bad.example.com."));
        assert_eq!(records_of(&client, "good.test.net.", "A"), vec!["10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_listing() {
        let (client, provider) = setup(false);
        client.fail_zone_listing();

        provider.apply_changes(&Changes::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_adjust_endpoints_is_identity() {
        let (_client, provider) = setup(false);
        let endpoints = vec![ep("www.example.com", "A", Some(30), &["10.1.1.1"])];

        let adjusted = provider.adjust_endpoints(endpoints.clone()).await.unwrap();
        assert_eq!(adjusted, endpoints);
    }

    #[test]
    fn test_debug_hides_client() {
        let (_client, provider) = setup(true);
        let debug_output = format!("{provider:?}");
        assert!(debug_output.starts_with("DesignateProvider"));
        assert!(debug_output.contains("dry_run: true"));
        assert!(provider.dry_run());
    }
}
