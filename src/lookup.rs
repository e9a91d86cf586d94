//! Lookup Client
//! 入力検証 → キャッシュ → バックエンド → 正規化 の入口

use std::sync::Arc;
use tracing::warn;

use crate::cache::{CacheEntry, FetchResult, LookupStream, ResultCache};
use crate::config::BackendKind;
use crate::error::ValidationError;
use crate::normalize::normalize;
use crate::source::PriceSource;
use crate::validate::{validate, ValidatedCode};

/// Caller-facing lookup handle. Clones share the same source and cache.
#[derive(Clone)]
pub struct LookupClient {
    source: Arc<dyn PriceSource>,
    cache: ResultCache,
}

impl LookupClient {
    pub fn new(source: Arc<dyn PriceSource>, cache: ResultCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn backend(&self) -> BackendKind {
        self.source.kind()
    }

    /// Validate `raw` and start a cache-and-network lookup.
    ///
    /// Validation failures return before any request is made.
    pub fn lookup(&self, raw: &str) -> Result<LookupStream, ValidationError> {
        let code = validate(raw)?;
        let source = Arc::clone(&self.source);
        let request_code = code.clone();
        Ok(self.cache.watch(code, move || fetch_priced(source, request_code)))
    }

    /// Cached entry when one exists (refreshing it in the background),
    /// otherwise the network result.
    pub async fn get(&self, raw: &str) -> Result<CacheEntry, ValidationError> {
        let code = validate(raw)?;
        let source = Arc::clone(&self.source);
        let request_code = code.clone();
        Ok(self
            .cache
            .get_or_fetch(code, move || fetch_priced(source, request_code))
            .await)
    }

    /// Explicit re-submit: skip the cached entry and wait on a new request.
    pub fn refresh(&self, raw: &str) -> Result<LookupStream, ValidationError> {
        let code = validate(raw)?;
        let source = Arc::clone(&self.source);
        let request_code = code.clone();
        Ok(self.cache.refresh(code, move || fetch_priced(source, request_code)))
    }
}

async fn fetch_priced(source: Arc<dyn PriceSource>, code: ValidatedCode) -> FetchResult {
    let raw = source.fetch(&code).await?;
    normalize(raw).map_err(|err| {
        warn!("{} backend broke the item contract for {}: {}", source.kind(), code, err);
        err.into()
    })
}
