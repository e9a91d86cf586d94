// ==========================================================================
// REST backend end-to-end
//
// Run:
//   cargo test --test rest_lookup
// ==========================================================================

mod common;

use axum::http::StatusCode;
use futures::future::join_all;
use plu_lookup::{EntryStatus, LookupError, Phase, ValidationError};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn known_code_yields_priced_item() {
    let backend = common::spawn_backend().await;
    backend.catalog.set_ok("000111", common::sugar_rest());
    let client = common::rest_client(&backend);

    let entry = client.lookup("000111").unwrap().resolved().await;

    assert_eq!(entry.status, EntryStatus::Ready);
    let item = entry.item().unwrap();
    assert_eq!(item.code, "A1");
    assert_eq!(item.name, "Sugar");
    assert_eq!(item.discounted_price, 12000.0);
    assert_eq!(item.normal_price, 15000.0);
    assert!(item.discounted_price <= item.normal_price);
    assert!(item.bulk_tiers.is_empty());
    assert!(item.promotions.is_empty());
}

#[tokio::test]
async fn unknown_code_surfaces_backend_detail() {
    let backend = common::spawn_backend().await;
    let client = common::rest_client(&backend);

    let entry = client.get("NOOOOO").await.unwrap();

    assert_eq!(entry.status, EntryStatus::Error);
    assert!(entry.data.is_none());
    let err = entry.last_error.unwrap();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), "Item not found");
}

#[tokio::test]
async fn server_error_without_detail_uses_generic_message() {
    let backend = common::spawn_backend().await;
    backend
        .catalog
        .set("000111", StatusCode::INTERNAL_SERVER_ERROR, json!("boom"));
    let client = common::rest_client(&backend);

    let entry = client.get("000111").await.unwrap();
    let err = entry.last_error.unwrap();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), plu_lookup::error::GENERIC_LOOKUP_MESSAGE);
}

#[tokio::test]
async fn malformed_payload_is_invalid_response() {
    let backend = common::spawn_backend().await;
    backend
        .catalog
        .set_ok("000111", json!({ "IDItem": 7, "Kode": "A1", "Nama": "Sugar" }));
    let client = common::rest_client(&backend);

    let entry = client.get("000111").await.unwrap();
    assert_eq!(entry.status, EntryStatus::Error);
    assert!(matches!(entry.last_error, Some(LookupError::InvalidResponse(_))));
}

#[tokio::test]
async fn invalid_codes_never_hit_the_backend() {
    let backend = common::spawn_backend().await;
    let client = common::rest_client(&backend);

    assert!(matches!(
        client.lookup("123456789012345678901"),
        Err(ValidationError::TooLong { .. })
    ));
    assert!(matches!(client.get("  ").await, Err(ValidationError::Required)));
    assert_eq!(backend.catalog.hits(), 0);
}

#[tokio::test]
async fn concurrent_lookups_send_one_request() {
    let backend = common::spawn_backend().await;
    backend.catalog.set_ok("000111", common::sugar_rest());
    backend.catalog.set_delay(Duration::from_millis(100));
    let client = common::rest_client(&backend);

    let entries = join_all((0..5).map(|_| client.get("000111"))).await;

    for entry in entries {
        assert_eq!(entry.unwrap().status, EntryStatus::Ready);
    }
    assert_eq!(backend.catalog.hits(), 1);
}

#[tokio::test]
async fn repeat_lookup_serves_cache_then_network() {
    let backend = common::spawn_backend().await;
    backend.catalog.set_ok("000111", common::sugar_rest());
    let client = common::rest_client(&backend);

    client.get("000111").await.unwrap();

    let mut repriced = common::sugar_rest();
    repriced["HargaJual"] = json!(11000);
    backend.catalog.set_ok("000111", repriced);

    let mut stream = client.lookup("000111").unwrap();
    let Some(Phase::Stale(stale)) = stream.next_phase().await else {
        panic!("expected the cached entry first");
    };
    assert_eq!(stale.item().unwrap().discounted_price, 12000.0);

    let Some(Phase::Resolved(fresh)) = stream.next_phase().await else {
        panic!("expected the network result second");
    };
    assert_eq!(fresh.item().unwrap().discounted_price, 11000.0);
    assert_eq!(backend.catalog.hits(), 2);
}

#[tokio::test]
async fn outage_during_refresh_keeps_last_price() {
    let backend = common::spawn_backend().await;
    backend.catalog.set_ok("000111", common::sugar_rest());
    let client = common::rest_client(&backend);

    client.get("000111").await.unwrap();
    backend.catalog.set(
        "000111",
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "detail": "Database offline" }),
    );

    let entry = client.lookup("000111").unwrap().resolved().await;
    assert_eq!(entry.status, EntryStatus::Error);
    assert_eq!(entry.last_error.unwrap().user_message(), "Database offline");
    assert_eq!(entry.data.unwrap().discounted_price, 12000.0);
}

#[tokio::test]
async fn wrapped_payload_carries_bulk_and_promo_prices() {
    let backend = common::spawn_backend().await;
    backend.catalog.set_ok(
        "8991234567890",
        json!({
            "item": {
                "IDItem": 42, "Kode": "SGR1", "Nama": "Gula Pasir 1kg", "Barcode": "8991234567890",
                "JumlahDos": 24, "Satuan": "PCS", "HargaNormal": 15000, "HargaJual": 14500
            },
            "hargaGrosir": [
                { "IDItemHargaGrosir": 1, "IDItem": 42, "Jumlah": 6, "Harga": 14000, "IsDos": "Tidak" },
                { "IDItemHargaGrosir": 2, "IDItem": 42, "Jumlah": 24, "Harga": 13500, "IsDos": "Ya" }
            ],
            "hargaPromo": [{
                "IDItemHargaD": 9, "IDItemHargaH": 4, "IDItem": 42, "Kode": "PRM-03", "Nama": "Promo Maret",
                "TanggalAwal": "2024-03-01", "TanggalAkhir": "2024-03-31",
                "HargaJual": 13000, "DiskonPersen": 10, "Diskon": 1500
            }]
        }),
    );
    let client = common::rest_client(&backend);

    let entry = client.get("8991234567890").await.unwrap();
    let item = entry.item().unwrap();

    assert_eq!(item.bulk_tiers.len(), 2);
    assert_eq!(item.unit_price_for(10.0), 14000.0);
    assert_eq!(item.unit_price_for(24.0), 13500.0);
    assert_eq!(item.promotions[0].code, "PRM-03");
    assert_eq!(item.details.units_per_carton, 24.0);
}
