// ═══════════════════════════════════════════════════════════════════
// Provider Tests — MemoryDocumentStore, Firestore value encoding,
// price endpoint parsing
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::time::Duration;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::investment::{Investment, InvestmentType};
use portfolio_tracker_core::models::price::{PriceQuote, PriceResponse};
use portfolio_tracker_core::models::settings::CloudConfig;
use portfolio_tracker_core::providers::firestore::{
    decode_fields, decode_value, encode_fields, encode_value, FirestoreDocumentStore,
};
use portfolio_tracker_core::providers::memory::MemoryDocumentStore;
use portfolio_tracker_core::providers::price_api::{
    estimate_current_value, parse_price_response, PriceApiClient,
};
use portfolio_tracker_core::providers::traits::{DocumentStore, PriceProvider};

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn quote(price: f64) -> PriceQuote {
    PriceQuote {
        price,
        currency: "TRY".into(),
        source: "TCMB".into(),
        last_updated: "2025-11-01T10:00:00Z".into(),
    }
}

// ═══════════════════════════════════════════════════════════════════
// MemoryDocumentStore
// ═══════════════════════════════════════════════════════════════════

mod memory_store {
    use super::*;

    #[tokio::test]
    async fn get_missing_document() {
        let store = MemoryDocumentStore::new();
        assert_eq!(store.get("investments", "shared-user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn merge_upserts_fields() {
        let store = MemoryDocumentStore::new();
        store
            .merge("investments", "u", fields(json!({ "a": 1, "b": [1, 2] })))
            .await
            .unwrap();
        store
            .merge("investments", "u", fields(json!({ "b": [], "c": "x" })))
            .await
            .unwrap();

        let doc = store.get("investments", "u").await.unwrap().unwrap();
        assert_eq!(Value::Object(doc), json!({ "a": 1, "b": [], "c": "x" }));
    }

    #[tokio::test]
    async fn documents_are_keyed_by_collection_and_id() {
        let store = MemoryDocumentStore::new();
        store.merge("investments", "u", fields(json!({ "a": 1 }))).await.unwrap();
        assert!(store.get("investments", "other").await.unwrap().is_none());
        assert!(store.get("fund-current-values", "u").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn not_ready_refuses_everything() {
        let store = MemoryDocumentStore::new();
        store.set_ready(false);
        assert!(!store.is_ready());
        assert!(matches!(
            store.get("investments", "u").await,
            Err(CoreError::CloudUnavailable)
        ));
        assert!(matches!(
            store.merge("investments", "u", Map::new()).await,
            Err(CoreError::CloudUnavailable)
        ));
        assert!(matches!(
            store.watch("investments", "u").await,
            Err(CoreError::CloudUnavailable)
        ));
    }

    #[tokio::test]
    async fn watch_sees_later_merges() {
        let store = MemoryDocumentStore::new();
        let mut rx = store.watch("investments", "u").await.unwrap();
        assert!(rx.borrow_and_update().is_none());

        store.merge("investments", "u", fields(json!({ "a": 1 }))).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        let doc = (*rx.borrow_and_update()).clone().unwrap();
        assert_eq!(doc["a"], 1);
    }

    #[tokio::test]
    async fn watch_starts_with_existing_document() {
        let store = MemoryDocumentStore::new();
        store.merge("investments", "u", fields(json!({ "a": 1 }))).await.unwrap();
        let rx = store.watch("investments", "u").await.unwrap();
        assert!(rx.borrow().is_some());
    }

    #[test]
    fn snapshot_without_runtime() {
        let store = MemoryDocumentStore::default();
        assert!(store.snapshot("investments", "u").is_none());
        assert_eq!(store.name(), "Memory");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Firestore
// ═══════════════════════════════════════════════════════════════════

mod firestore {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local HTTP server answering request N with `responses[N]`; the last
    /// response repeats once the script runs out.
    async fn scripted_server(
        responses: Vec<(u16, String)>,
    ) -> (String, Arc<AtomicUsize>, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[index.min(responses.len() - 1)].clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(read) => request.extend_from_slice(&chunk[..read]),
                        }
                    }
                    let reason = if status == 200 { "OK" } else { "Service Unavailable" };
                    let response = format!(
                        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.flush().await;
                });
            }
        });

        (format!("http://{addr}"), hits, handle)
    }

    fn store_at(base_url: &str, poll: Duration) -> FirestoreDocumentStore {
        FirestoreDocumentStore::new(
            CloudConfig::new("k", "d", "p")
                .with_base_url(base_url)
                .with_poll_interval(poll),
        )
    }

    #[tokio::test]
    async fn watch_recovers_from_failed_first_read() {
        let document = json!({
            "name": "projects/p/databases/(default)/documents/investments/shared-user",
            "fields": { "investments": { "arrayValue": { "values": [
                { "mapValue": { "fields": {
                    "id": { "stringValue": "a" },
                    "amount": { "integerValue": "100" }
                } } }
            ] } } }
        });
        let (base_url, hits, server) = scripted_server(vec![
            (503, r#"{"error":{"status":"UNAVAILABLE","message":"try again"}}"#.to_string()),
            (200, document.to_string()),
        ])
        .await;
        let store = store_at(&base_url, Duration::from_millis(50));

        let mut rx = store
            .watch("investments", "shared-user")
            .await
            .expect("watch attaches even though the first read failed");
        assert!(rx.borrow_and_update().is_none());

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("document arrives once the server recovers")
            .expect("watch still running");
        let doc = (*rx.borrow_and_update()).clone().unwrap();
        assert_eq!(doc["investments"][0]["id"], "a");
        assert_eq!(doc["investments"][0]["amount"], 100);
        assert!(hits.load(Ordering::SeqCst) >= 2);

        drop(rx);
        server.abort();
    }

    #[tokio::test]
    async fn watch_starts_empty_when_server_is_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = store_at(&format!("http://{addr}"), Duration::from_secs(60));
        let rx = store.watch("investments", "shared-user").await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn get_still_reports_failures() {
        let (base_url, _, server) = scripted_server(vec![(503, "busy".to_string())]).await;
        let store = store_at(&base_url, Duration::from_secs(60));
        assert!(matches!(
            store.get("investments", "shared-user").await,
            Err(CoreError::Api { .. })
        ));
        server.abort();
    }

    #[test]
    fn ready_with_complete_config() {
        let store = FirestoreDocumentStore::new(CloudConfig::new("k", "d", "p"));
        assert!(store.is_ready());
        assert_eq!(store.name(), "Firestore");
    }

    #[test]
    fn not_ready_with_blank_credentials() {
        let store = FirestoreDocumentStore::new(CloudConfig::new("k", "d", ""));
        assert!(!store.is_ready());
    }

    #[test]
    fn scalar_encodings() {
        assert_eq!(encode_value(&json!(null)), json!({ "nullValue": null }));
        assert_eq!(encode_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode_value(&json!(7)), json!({ "integerValue": "7" }));
        assert_eq!(encode_value(&json!(2.5)), json!({ "doubleValue": 2.5 }));
        assert_eq!(encode_value(&json!("Dolar")), json!({ "stringValue": "Dolar" }));
    }

    #[test]
    fn decodes_integer_strings() {
        assert_eq!(decode_value(json!({ "integerValue": "42" })), json!(42));
    }

    #[test]
    fn decodes_timestamps_as_strings() {
        assert_eq!(
            decode_value(json!({ "timestampValue": "2025-01-01T00:00:00Z" })),
            json!("2025-01-01T00:00:00Z")
        );
    }

    #[test]
    fn nested_record_survives() {
        let record = serde_json::to_value(
            Investment::with_id(
                "9",
                NaiveDate::from_ymd_opt(2025, 5, 9).unwrap(),
                InvestmentType::Fund,
                "Altın Fon",
                40_000.0,
            )
            .with_notes("aylık"),
        )
        .unwrap();
        let doc = fields(json!({ "investments": [record.clone()] }));

        let decoded = decode_fields(encode_fields(&doc));
        assert_eq!(decoded["investments"][0], record);
        let back: Investment = serde_json::from_value(decoded["investments"][0].clone()).unwrap();
        assert_eq!(back.amount, 40_000.0);
        assert_eq!(back.notes.as_deref(), Some("aylık"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Price endpoint
// ═══════════════════════════════════════════════════════════════════

mod price_api {
    use super::*;

    #[test]
    fn successful_response_yields_quote() {
        let resp = PriceResponse {
            success: true,
            data: Some(quote(41.2)),
            error: None,
        };
        assert_eq!(parse_price_response(resp).unwrap().price, 41.2);
    }

    #[test]
    fn failure_carries_endpoint_message() {
        let resp = PriceResponse {
            success: false,
            data: None,
            error: Some("Fiyat bulunamadı".into()),
        };
        match parse_price_response(resp) {
            Err(CoreError::Api { provider, message }) => {
                assert_eq!(provider, "PriceApi");
                assert_eq!(message, "Fiyat bulunamadı");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn success_without_data_is_an_error() {
        let resp = PriceResponse {
            success: true,
            data: None,
            error: None,
        };
        assert!(matches!(parse_price_response(resp), Err(CoreError::Api { .. })));
    }

    #[test]
    fn non_positive_price_is_an_error() {
        for price in [0.0, -1.0, f64::NAN] {
            let resp = PriceResponse {
                success: true,
                data: Some(quote(price)),
                error: None,
            };
            assert!(parse_price_response(resp).is_err());
        }
    }

    #[test]
    fn estimate_revalues_units() {
        let inv = Investment::new(
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            InvestmentType::Currency,
            "Dolar",
            4_000.0,
        )
        .with_price(40.0);
        assert_eq!(estimate_current_value(&inv, &quote(42.0)), 4_200.0);
    }

    #[test]
    fn estimate_without_unit_price_scales_amount() {
        let inv = Investment::new(
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            InvestmentType::Stock,
            "THYAO",
            10.0,
        );
        assert_eq!(estimate_current_value(&inv, &quote(300.0)), 3_000.0);
    }

    #[test]
    fn client_name() {
        let client = PriceApiClient::new("http://localhost:3000/api/price");
        assert_eq!(client.name(), "PriceApi");
    }
}
