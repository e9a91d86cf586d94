//! HTTP Handlers
//! /api エンドポイント

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use std::sync::Arc;

use crate::cache::CacheEntry;
use crate::config::BackendKind;
use crate::AppState;

pub mod lookup;

// ========================================
// Response Types
// ========================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub title: String,
    pub backend: BackendKind,
    pub cached_keys: usize,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<CacheEntry>,
}

// ========================================
// Handlers
// ========================================

/// GET /api/health - ヘルスチェック
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "plu-lookup".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        title: state.config.app_title.clone(),
        backend: state.client.backend(),
        cached_keys: state.client.cache().len(),
    })
}

// ========================================
// エラーレスポンスヘルパー
// ========================================

pub fn error_response(
    status: StatusCode,
    message: String,
    entry: Option<CacheEntry>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message,
            entry,
        }),
    )
}
