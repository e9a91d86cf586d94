//! Data Sources
//! REST と GraphQL の2種類のバックエンドを同じトレイトで扱う

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, BackendKind};
use crate::error::LookupError;
use crate::models::RawItem;
use crate::validate::ValidatedCode;

pub mod graphql;
pub mod rest;

pub use graphql::GraphqlSource;
pub use rest::RestSource;

/// A backend that can answer "what does this code cost".
///
/// Implementations only fetch and decode; they never retry and never
/// normalize.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn fetch(&self, code: &ValidatedCode) -> Result<RawItem, LookupError>;
}

/// Build the configured backend.
pub fn from_config(config: &AppConfig) -> reqwest::Result<Arc<dyn PriceSource>> {
    let client = http_client(config.timeout)?;
    let source: Arc<dyn PriceSource> = match config.backend {
        BackendKind::Rest => Arc::new(RestSource::new(client, &config.backend_url)),
        BackendKind::Graphql => Arc::new(GraphqlSource::new(client, &config.backend_url)),
    };
    Ok(source)
}

pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("plu-lookup/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// `{ "detail": ... }` body of a failed REST call. FastAPI-style validation
/// failures put a list in `detail`; only string details are surfaced.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

pub(crate) fn error_detail(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| d.as_str().map(str::to_string))
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
