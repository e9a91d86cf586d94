//! PLU Lookup
//! バーコード／商品コードから価格・まとめ買い価格・プロモを照会するクライアント

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod source;
pub mod validate;

pub use cache::{CacheEntry, EntryStatus, LookupStream, Phase, ResultCache};
pub use config::{AppConfig, BackendKind};
pub use error::{LookupError, NormalizationError, ValidationError};
pub use lookup::LookupClient;
pub use models::PricedItem;
pub use validate::{validate, ValidatedCode};

/// Process-wide state: one cache for the whole session.
pub struct AppState {
    pub config: AppConfig,
    pub client: LookupClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Arc<Self>> {
        let source = source::from_config(&config)?;
        let client = LookupClient::new(source, ResultCache::new());
        Ok(Arc::new(Self { config, client }))
    }
}

/// Router used by `main` and by the integration tests.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/lookup", get(handlers::lookup::get_lookup))
        .route("/api/lookup/stream", get(handlers::lookup::stream_lookup))
        .route("/api/cache", get(handlers::lookup::peek_entry))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
