// ==========================================================================
// Mock pricing backend
//
// Serves both `GET /item?code=` and `POST /graphql` from one catalog on a
// random localhost port, counting every request it answers.
// ==========================================================================

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use plu_lookup::cache::ResultCache;
use plu_lookup::source::{http_client, GraphqlSource, PriceSource, RestSource};
use plu_lookup::LookupClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct Catalog {
    items: Arc<Mutex<HashMap<String, (StatusCode, Value)>>>,
    hits: Arc<AtomicUsize>,
    delay: Arc<Mutex<Duration>>,
}

impl Catalog {
    pub fn set(&self, code: &str, status: StatusCode, body: Value) {
        self.items
            .lock()
            .unwrap()
            .insert(code.to_string(), (status, body));
    }

    pub fn set_ok(&self, code: &str, body: Value) {
        self.set(code, StatusCode::OK, body);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    async fn answer(&self, code: &str) -> Option<(StatusCode, Value)> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.items.lock().unwrap().get(code).cloned()
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub catalog: Catalog,
}

async fn rest_item(
    State(catalog): State<Catalog>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let code = params.get("code").cloned().unwrap_or_default();
    match catalog.answer(&code).await {
        Some((status, body)) => (status, Json(body)),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Item not found" }))),
    }
}

async fn graphql(State(catalog): State<Catalog>, Json(request): Json<Value>) -> (StatusCode, Json<Value>) {
    let barcode = request["variables"]["barcode"].as_str().unwrap_or_default().to_string();
    match catalog.answer(&barcode).await {
        Some((status, item)) if status == StatusCode::OK => {
            (StatusCode::OK, Json(json!({ "data": { "plu": item } })))
        }
        Some((status, body)) => (status, Json(body)),
        None => (
            StatusCode::OK,
            Json(json!({
                "data": null,
                "errors": [{ "message": "Item not found", "path": ["plu"] }]
            })),
        ),
    }
}

pub async fn spawn_backend() -> MockBackend {
    let catalog = Catalog::default();
    let app = Router::new()
        .route("/item", get(rest_item))
        .route("/graphql", post(graphql))
        .with_state(catalog.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{addr}"),
        catalog,
    }
}

pub fn rest_client(backend: &MockBackend) -> LookupClient {
    let client = http_client(Duration::from_secs(5)).unwrap();
    let source: Arc<dyn PriceSource> = Arc::new(RestSource::new(client, &backend.base_url));
    LookupClient::new(source, ResultCache::new())
}

pub fn graphql_client(backend: &MockBackend) -> LookupClient {
    let client = http_client(Duration::from_secs(5)).unwrap();
    let source: Arc<dyn PriceSource> = Arc::new(GraphqlSource::new(client, &backend.base_url));
    LookupClient::new(source, ResultCache::new())
}

pub fn sugar_rest() -> Value {
    json!({
        "IDItem": 7, "Kode": "A1", "Barcode": "000111", "Nama": "Sugar",
        "HargaNormal": 15000, "HargaJual": 12000
    })
}

pub fn sugar_graphql() -> Value {
    json!({
        "id": "7", "code": "A1", "barcode": "000111", "name": "Sugar",
        "normalPrice": 15000, "discountedPrice": 12000,
        "bulkPrices": [], "promoPrices": []
    })
}
