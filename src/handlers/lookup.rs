//! Lookup API Handlers
//! /api/lookup, /api/lookup/stream, /api/cache エンドポイント

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use chrono::{Local, NaiveDate};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};

use super::{error_response, ErrorResponse};
use crate::cache::{CacheEntry, Phase};
use crate::error::{LookupError, ValidationError, GENERIC_LOOKUP_MESSAGE};
use crate::models::{PricedItem, Promotion};
use crate::validate::ValidatedCode;
use crate::AppState;

// ========================================
// Response Types
// ========================================

#[derive(Serialize)]
pub struct LookupResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PriceSummary>,
    pub entry: CacheEntry,
}

impl LookupResponse {
    fn new(entry: CacheEntry) -> Self {
        let today = Local::now().date_naive();
        Self {
            success: true,
            summary: entry.item().map(|item| PriceSummary::of(item, today)),
            entry,
        }
    }
}

/// What the price card shows at a glance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub has_discount: bool,
    pub has_bulk_pricing: bool,
    /// Promotions running on the day of the request.
    pub active_promotions: Vec<Promotion>,
}

impl PriceSummary {
    pub fn of(item: &PricedItem, day: NaiveDate) -> Self {
        Self {
            has_discount: item.has_discount(),
            has_bulk_pricing: item.has_bulk_pricing(),
            active_promotions: item.active_promotions(day).cloned().collect(),
        }
    }
}

// ========================================
// Query Parameters
// ========================================

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub refresh: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ========================================
// Handlers
// ========================================

/// GET /api/lookup?code=... - 価格照会（ネットワーク結果を待つ）
pub async fn get_lookup(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>, ApiError> {
    info!("🔎 lookup: {:?} (refresh={})", query.code, query.refresh);

    let requested = if query.refresh {
        state.client.refresh(&query.code)
    } else {
        state.client.lookup(&query.code)
    };
    let stream = requested.map_err(validation_failed)?;

    let entry = stream.resolved().await;
    if entry.is_error() {
        let (status, message) = entry
            .last_error
            .as_ref()
            .map(|err| (status_for(err), err.user_message()))
            .unwrap_or_else(|| (StatusCode::BAD_GATEWAY, GENERIC_LOOKUP_MESSAGE.to_string()));
        warn!("❌ lookup failed for {}: {}", entry.key, message);
        return Err(error_response(status, message, Some(entry)));
    }

    Ok(Json(LookupResponse::new(entry)))
}

/// GET /api/lookup/stream?code=... - stale → resolved の2段階 SSE
pub async fn stream_lookup(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LookupQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    info!("📡 lookup stream: {:?}", query.code);

    let stream = state.client.lookup(&query.code).map_err(validation_failed)?;
    let events = stream.into_stream().map(|phase| Ok(phase_event(&phase)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// GET /api/cache?code=... - キャッシュの現在値（取得は行わない）
pub async fn peek_entry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>, ApiError> {
    let key = ValidatedCode::try_from(query.code.as_str()).map_err(validation_failed)?;

    match state.client.cache().entry(&key) {
        Some(entry) => Ok(Json(LookupResponse::new(entry))),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("{} has not been looked up", key),
            None,
        )),
    }
}

// ========================================
// Helpers
// ========================================

fn validation_failed(err: ValidationError) -> ApiError {
    warn!("⚠️  rejected input: {}", err);
    error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), None)
}

/// Backend 4xx answers pass through; everything else is a bad gateway.
fn status_for(err: &LookupError) -> StatusCode {
    err.status()
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(StatusCode::is_client_error)
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

fn phase_event(phase: &Phase) -> Event {
    let name = if phase.is_stale() { "stale" } else { "resolved" };
    Event::default()
        .event(name)
        .json_data(phase.entry())
        .unwrap_or_else(|err| Event::default().event("error").data(err.to_string()))
}
