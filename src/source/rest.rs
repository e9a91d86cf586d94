//! REST backend: `GET /item?code=...`

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{error_detail, join_url, PriceSource};
use crate::config::BackendKind;
use crate::error::LookupError;
use crate::models::{RawItem, RestPayload};
use crate::validate::ValidatedCode;

pub struct RestSource {
    client: Client,
    item_url: String,
}

impl RestSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            item_url: join_url(base_url, "item"),
        }
    }
}

#[async_trait]
impl PriceSource for RestSource {
    fn kind(&self) -> BackendKind {
        BackendKind::Rest
    }

    async fn fetch(&self, code: &ValidatedCode) -> Result<RawItem, LookupError> {
        debug!("GET {} code={}", self.item_url, code);

        let response = self
            .client
            .get(&self.item_url)
            .query(&[("code", code.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(LookupError::transport(
                Some(status.as_u16()),
                error_detail(&body),
                format!("HTTP {status}"),
            ));
        }

        let payload: RestPayload = serde_json::from_slice(&body)?;
        Ok(RawItem::Rest(payload))
    }
}
