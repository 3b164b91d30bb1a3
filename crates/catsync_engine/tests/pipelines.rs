//! Integration tests for fetching and the named pipelines.

use catsync_core::{CellValue, Platform};
use catsync_engine::{
    convert_file, ApiToken, Credentials, FetchError, HttpMethod, Orchestrator, PaginatedFetcher,
    PipelineName, RetryPolicy, ScriptedClient, Stage, SyncConfig, SyncStatus, Transport,
    TransportFailure, TransportFailureKind,
};
use catsync_testkit::{empty_page, erp_items, erp_page, TempFiles, SHOPIFY_EXPORT_CSV};
use serde_json::{json, Value};
use std::fs;
use std::time::Duration;

const ERP_URL: &str = "http://erp.test/items";
const ZOEY_URL: &str = "http://zoey.test/products";

fn fast_retry() -> RetryPolicy {
    RetryPolicy::default().with_delay(Duration::ZERO)
}

fn token() -> ApiToken {
    ApiToken::new("erp-token").unwrap()
}

fn config(files: &TempFiles) -> SyncConfig {
    SyncConfig::new()
        .with_netsuite_url(ERP_URL)
        .with_zoey_url(ZOEY_URL)
        .with_page_size(2)
        .with_output_dir(files.join("out"))
        .with_retry(fast_retry())
}

fn all_credentials() -> Credentials {
    Credentials::none()
        .with_token(Platform::NetSuite, "erp-token")
        .with_token(Platform::Zoey, "zoey-key")
}

#[test]
fn pagination_concatenates_pages_until_empty() {
    let client = ScriptedClient::new();
    client
        .push_response(200, erp_page(erp_items(0, 3)))
        .push_response(200, erp_page(erp_items(3, 3)))
        .push_response(200, erp_page(erp_items(6, 1)))
        .push_response(200, empty_page());
    let transport = Transport::new(client.clone(), fast_retry());

    let records = PaginatedFetcher::new(&transport, Platform::NetSuite)
        .fetch_all(ERP_URL, Some(&token()), 3)
        .unwrap();

    assert_eq!(client.call_count(), 4);
    assert_eq!(records.len(), 7);
    for (i, record) in records.records().iter().enumerate() {
        assert_eq!(record.get("itemId"), Some(&CellValue::text(format!("SKU-{i}"))));
    }
    let offsets: Vec<String> = client
        .requests()
        .iter()
        .map(|r| r.query_value("offset").unwrap_or_default().to_string())
        .collect();
    assert_eq!(offsets, vec!["0", "3", "6", "9"]);
}

#[test]
fn short_page_does_not_end_pagination() {
    let client = ScriptedClient::new();
    client
        .push_response(200, erp_page(erp_items(0, 1)))
        .push_response(200, erp_page(erp_items(1, 1)))
        .push_response(200, empty_page());
    let transport = Transport::new(client.clone(), fast_retry());

    let records = PaginatedFetcher::new(&transport, Platform::NetSuite)
        .fetch_all(ERP_URL, Some(&token()), 100)
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(client.call_count(), 3);
}

#[test]
fn mid_stream_rejection_discards_partial_result() {
    let client = ScriptedClient::new();
    client
        .push_response(200, erp_page(erp_items(0, 2)))
        .push_response(500, "internal error");
    let transport = Transport::new(client.clone(), fast_retry());

    let err = PaginatedFetcher::new(&transport, Platform::NetSuite)
        .fetch_all(ERP_URL, Some(&token()), 2)
        .unwrap_err();

    assert!(matches!(err, FetchError::Rejected { status: 500, .. }), "{err}");
    // Error statuses are not retried.
    assert_eq!(client.call_count(), 2);
}

#[test]
fn missing_credential_makes_no_request() {
    let client = ScriptedClient::new();
    let transport = Transport::new(client.clone(), fast_retry());

    let err = PaginatedFetcher::new(&transport, Platform::NetSuite)
        .fetch_all(ERP_URL, None, 10)
        .unwrap_err();

    assert!(matches!(
        err,
        FetchError::MissingCredential {
            platform: Platform::NetSuite
        }
    ));
    assert_eq!(client.call_count(), 0);
}

#[test]
fn transient_failures_are_retried_within_a_page() {
    let client = ScriptedClient::new();
    client
        .push_failure(TransportFailure::connection("reset"))
        .push_response(200, erp_page(erp_items(0, 1)))
        .push_failure(TransportFailure::timeout("slow"))
        .push_response(200, empty_page());
    let transport = Transport::new(client.clone(), fast_retry());

    let records = PaginatedFetcher::new(&transport, Platform::NetSuite)
        .fetch_all(ERP_URL, Some(&token()), 1)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(client.call_count(), 4);
}

#[test]
fn exhausted_retries_surface_as_transport_failure() {
    let client = ScriptedClient::new();
    client.push_response(200, erp_page(erp_items(0, 1)));
    for _ in 0..3 {
        client.push_failure(TransportFailure::timeout("slow"));
    }
    let transport = Transport::new(client.clone(), fast_retry());

    let err = PaginatedFetcher::new(&transport, Platform::NetSuite)
        .fetch_all(ERP_URL, Some(&token()), 1)
        .unwrap_err();
    match err {
        FetchError::Transport(failure) => assert_eq!(failure.kind, TransportFailureKind::Timeout),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(client.call_count(), 4);
}

#[test]
fn erp_to_storefront_happy_path() {
    let files = TempFiles::new();
    let client = ScriptedClient::new();
    let page = json!({ "items": [
        { "title": "Widget", "price": "9.99", "sku": "W1" },
        { "title": "Widget/Pro", "price": null, "sku": "W2" },
    ]});
    client
        .push_response(200, page.to_string())
        .push_response(200, empty_page());
    let orchestrator = Orchestrator::new(config(&files), all_credentials(), client.clone());

    let report = orchestrator.run(PipelineName::NetsuiteToShopify);

    assert_eq!(report.status, SyncStatus::Completed, "{report}");
    assert_eq!(report.fetched, 2);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.dropped, 0);
    assert_eq!(client.call_count(), 2);
    assert!(client.requests().iter().all(|r| r.method == HttpMethod::Get));

    let csv = fs::read_to_string(files.join("out/shopify_import.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Handle,Title,Body (HTML)"));
    assert_eq!(
        lines[1],
        "widget,Widget,,Unknown,Product,,TRUE,Title,Default Title,W1,0,deny,manual,9.99,TRUE,TRUE,,,,FALSE,lb,active"
    );
    assert!(lines[2].starts_with("widget-pro,Widget/Pro,"));
    assert!(lines[2].contains(",W2,0,deny,manual,0,TRUE,"));
}

#[test]
fn empty_fetch_aborts_before_delivery() {
    let files = TempFiles::new();
    let client = ScriptedClient::new();
    client.push_response(200, empty_page());
    let orchestrator = Orchestrator::new(config(&files), all_credentials(), client.clone());

    let report = orchestrator.run(PipelineName::NetsuiteToZoey);

    assert_eq!(report.status, SyncStatus::Aborted);
    assert!(report.reason.as_deref().unwrap_or_default().contains("no records"));
    assert_eq!(report.stages.last().map(|s| s.stage), Some(Stage::Fetch));
    assert_eq!(client.call_count(), 1);
}

#[test]
fn missing_erp_credential_aborts_without_requests() {
    let files = TempFiles::new();
    let client = ScriptedClient::new();
    let credentials = Credentials::none().with_token(Platform::Zoey, "zoey-key");
    let orchestrator = Orchestrator::new(config(&files), credentials, client.clone());

    let report = orchestrator.run(PipelineName::NetsuiteToZoey);

    assert_eq!(report.status, SyncStatus::Aborted);
    assert!(report.reason.unwrap_or_default().contains("missing credential"));
    assert_eq!(client.call_count(), 0);
}

#[test]
fn all_rows_dropped_aborts_at_normalization() {
    let files = TempFiles::new();
    let client = ScriptedClient::new();
    client
        .push_response(200, json!({ "items": [{ "title": "No SKU" }] }).to_string())
        .push_response(200, empty_page());
    let orchestrator = Orchestrator::new(config(&files), all_credentials(), client);

    let report = orchestrator.run(PipelineName::NetsuiteToShopify);

    assert_eq!(report.status, SyncStatus::Aborted);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.stages.last().map(|s| s.stage), Some(Stage::Normalize));
    assert!(!files.join("out/shopify_import.csv").exists());
}

#[test]
fn erp_to_secondary_storefront_posts_each_product() {
    let files = TempFiles::new();
    let client = ScriptedClient::new();
    client
        .push_response(200, erp_page(erp_items(0, 2)))
        .push_response(200, empty_page())
        .push_response(201, "{}")
        .push_response(200, "{}");
    let orchestrator = Orchestrator::new(config(&files), all_credentials(), client.clone());

    let report = orchestrator.run(PipelineName::NetsuiteToZoey);
    assert!(report.is_success(), "{report}");
    assert_eq!(report.delivered, 2);

    let posts: Vec<_> = client
        .requests()
        .into_iter()
        .filter(|r| r.method == HttpMethod::Post)
        .collect();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].url, ZOEY_URL);
    assert_eq!(posts[0].header_value("Authorization"), Some("Bearer zoey-key"));
    let body: Value = serde_json::from_slice(posts[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body["handle"], "item-0");
    assert_eq!(body["description"], "Item 0");
    assert_eq!(body["vendor"], "Acme");
    assert_eq!(body["variants"][0]["sku"], "SKU-0");
    assert_eq!(body["variants"][0]["price"], 0.5);
    assert_eq!(body["variants"][0]["inventory_quantity"], 5);
}

#[test]
fn rejected_upload_reports_delivery_failure() {
    let files = TempFiles::new();
    let client = ScriptedClient::new();
    client
        .push_response(200, erp_page(erp_items(0, 3)))
        .push_response(200, empty_page())
        .push_response(201, "{}")
        .push_response(422, r#"{"error":"duplicate sku"}"#);
    let orchestrator = Orchestrator::new(config(&files), all_credentials(), client.clone());

    let report = orchestrator.run(PipelineName::NetsuiteToZoey);

    assert_eq!(report.status, SyncStatus::DeliveryFailed);
    assert_eq!(report.delivered, 1);
    assert!(report.reason.as_deref().unwrap_or_default().contains("422"));
    // The third product is never attempted.
    assert_eq!(client.call_count(), 4);
}

#[test]
fn upload_transport_failure_keeps_partial_count() {
    let files = TempFiles::new();
    let client = ScriptedClient::new();
    client
        .push_response(200, erp_page(erp_items(0, 3)))
        .push_response(200, empty_page())
        .push_response(201, "{}");
    for _ in 0..3 {
        client.push_failure(TransportFailure::timeout("upload timed out"));
    }
    let orchestrator = Orchestrator::new(config(&files), all_credentials(), client.clone());

    let report = orchestrator.run(PipelineName::NetsuiteToZoey);

    assert_eq!(report.status, SyncStatus::DeliveryFailed);
    assert_eq!(report.delivered, 1);
    assert!(report.reason.as_deref().unwrap_or_default().contains("timeout"));
    assert_eq!(report.stages.last().map(|s| s.stage), Some(Stage::Deliver));

    // One accepted upload, then three attempts at the second product.
    let posted_skus: Vec<String> = client
        .requests()
        .iter()
        .filter(|r| r.method == HttpMethod::Post)
        .map(|r| {
            let body: Value = serde_json::from_slice(r.body.as_deref().unwrap()).unwrap();
            body["variants"][0]["sku"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(posted_skus, vec!["SKU-0", "SKU-1", "SKU-1", "SKU-1"]);
    assert_eq!(client.remaining(), 0);
}

#[test]
fn storefront_file_to_secondary_storefront() {
    let files = TempFiles::new();
    let export = files.write("shopify.csv", SHOPIFY_EXPORT_CSV);
    let client = ScriptedClient::new();
    client.push_response(201, "{}").push_response(201, "{}");
    let orchestrator = Orchestrator::new(
        config(&files).with_shopify_export(export),
        all_credentials(),
        client.clone(),
    );

    let report = orchestrator.run(PipelineName::ShopifyToZoey);

    assert!(report.is_success(), "{report}");
    assert_eq!(report.fetched, 3);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.delivered, 2);

    let requests = client.requests();
    let first: Value = serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(first["handle"], "blue-mug");
    assert_eq!(first["description"], "A blue mug");
    assert_eq!(first["images"][0]["src"], "https://cdn.example/mug.png");
    let second: Value = serde_json::from_slice(requests[1].body.as_deref().unwrap()).unwrap();
    assert_eq!(second["vendor"], "Unknown");
    assert_eq!(second["published"], false);
    assert_eq!(second["variants"][0]["price"], 0.0);
}

#[test]
fn missing_destination_credential_is_a_delivery_failure() {
    let files = TempFiles::new();
    let export = files.write("shopify.csv", SHOPIFY_EXPORT_CSV);
    let client = ScriptedClient::new();
    let orchestrator = Orchestrator::new(
        config(&files).with_shopify_export(export),
        Credentials::none(),
        client.clone(),
    );

    let report = orchestrator.run(PipelineName::ShopifyToZoey);

    assert_eq!(report.status, SyncStatus::DeliveryFailed);
    assert_eq!(report.delivered, 0);
    assert_eq!(client.call_count(), 0);
}

#[test]
fn unknown_pipeline_name_is_an_error() {
    let files = TempFiles::new();
    let orchestrator = Orchestrator::new(config(&files), all_credentials(), ScriptedClient::new());
    assert!(orchestrator.run_named("netsuite-to-mars").is_err());
}

#[test]
fn runs_are_independent() {
    let files = TempFiles::new();
    let client = ScriptedClient::new();
    client
        .push_response(200, erp_page(erp_items(0, 2)))
        .push_response(200, empty_page())
        .push_response(200, erp_page(erp_items(0, 1)))
        .push_response(200, empty_page());
    let orchestrator = Orchestrator::new(config(&files), all_credentials(), client);

    let first = orchestrator.run(PipelineName::NetsuiteToShopify);
    let second = orchestrator.run(PipelineName::NetsuiteToShopify);

    assert_eq!(first.delivered, 2);
    assert_eq!(second.delivered, 1);
    assert_ne!(first.run_id, second.run_id);
    let csv = fs::read_to_string(files.join("out/shopify_import.csv")).unwrap();
    assert_eq!(csv.lines().count(), 2);
}

#[test]
fn offline_erp_export_to_storefront_file() {
    let files = TempFiles::new();
    let export = files.write(
        "erp.json",
        &json!([
            { "itemId": "A-1", "displayName": "Desk Lamp", "basePrice": "24.00" },
            { "itemId": "A-2", "displayName": "Floor Lamp", "basePrice": -3 },
        ])
        .to_string(),
    );
    let client = ScriptedClient::new();
    let orchestrator = Orchestrator::new(
        config(&files).with_netsuite_export(export),
        Credentials::none(),
        client.clone(),
    );

    let report = orchestrator.run(PipelineName::NetsuiteFileToShopify);

    assert!(report.is_success(), "{report}");
    assert_eq!(client.call_count(), 0);
    let csv = fs::read_to_string(files.join("out/shopify_import.csv")).unwrap();
    assert!(csv.contains("desk-lamp,Desk Lamp,"));
    assert!(csv.contains(",A-2,0,deny,manual,0,"));
}

#[test]
fn converts_storefront_export_to_json_lines() {
    let files = TempFiles::new();
    let input = files.write("shopify.csv", SHOPIFY_EXPORT_CSV);
    let output = files.join("zoey.json");

    let summary = convert_file(&input, Platform::Shopify, Platform::Zoey, &output).unwrap();

    assert_eq!(summary.read, 3);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.written, 2);
    let text = fs::read_to_string(output).unwrap();
    let rows: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows[0]["SKU"], "MUG-1");
    assert_eq!(rows[0]["Price"], 8.5);
    assert_eq!(rows[1]["Vendor"], "Unknown");
}

#[test]
fn storefront_workbook_to_secondary_storefront() {
    let files = TempFiles::new();
    let csv = files.write("shopify.csv", SHOPIFY_EXPORT_CSV);
    let workbook = files.join("Test Shopify Sheet.xlsx");
    let summary = convert_file(&csv, Platform::Shopify, Platform::Shopify, &workbook).unwrap();
    assert_eq!(summary.written, 2);

    let client = ScriptedClient::new();
    client.push_response(201, "{}").push_response(201, "{}");
    let orchestrator = Orchestrator::new(
        config(&files).with_shopify_export(&workbook),
        all_credentials(),
        client.clone(),
    );

    let report = orchestrator.run(PipelineName::ShopifyToZoey);

    assert!(report.is_success(), "{report}");
    assert_eq!(report.fetched, 2);
    assert_eq!(report.dropped, 0);
    assert_eq!(report.delivered, 2);
    let requests = client.requests();
    let first: Value = serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(first["handle"], "blue-mug");
    assert_eq!(first["variants"][0]["sku"], "MUG-1");
    assert_eq!(first["variants"][0]["price"], 8.5);
    assert_eq!(first["variants"][0]["inventory_quantity"], 12);
    let second: Value = serde_json::from_slice(requests[1].body.as_deref().unwrap()).unwrap();
    assert_eq!(second["published"], false);
}
