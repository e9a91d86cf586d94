//! GraphQL backend: `query plu($barcode: String!)`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{error_detail, join_url, PriceSource};
use crate::config::BackendKind;
use crate::error::LookupError;
use crate::models::{GraphqlItem, RawItem};
use crate::validate::ValidatedCode;

pub const PLU_QUERY: &str = "query plu($barcode: String!) {
  plu(barcode: $barcode) {
    id
    code
    barcode
    name
    normalPrice
    discountedPrice
    bulkPrices { id quantity unitPrice }
    promoPrices { id promoCode promoName start end discountPercent discount unitPrice }
  }
}";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRequest<'a> {
    query: &'static str,
    operation_name: &'static str,
    variables: PluVariables<'a>,
}

#[derive(Serialize)]
struct PluVariables<'a> {
    barcode: &'a str,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<PluData>,
    #[serde(default)]
    errors: Vec<GraphqlErrorMessage>,
}

#[derive(Deserialize)]
struct PluData {
    #[serde(default)]
    plu: Option<GraphqlItem>,
}

#[derive(Deserialize)]
struct GraphqlErrorMessage {
    message: String,
}

pub struct GraphqlSource {
    client: Client,
    endpoint: String,
}

impl GraphqlSource {
    /// `base_url` is the server root; the endpoint is `{base_url}/graphql`.
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: join_url(base_url, "graphql"),
        }
    }
}

#[async_trait]
impl PriceSource for GraphqlSource {
    fn kind(&self) -> BackendKind {
        BackendKind::Graphql
    }

    async fn fetch(&self, code: &ValidatedCode) -> Result<RawItem, LookupError> {
        debug!("POST {} plu(barcode: {})", self.endpoint, code);

        let request = GraphqlRequest {
            query: PLU_QUERY,
            operation_name: "plu",
            variables: PluVariables {
                barcode: code.as_str(),
            },
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<GraphqlResponse>(&body)
                .ok()
                .and_then(|r| first_message(r.errors))
                .or_else(|| error_detail(&body));
            return Err(LookupError::transport(
                Some(status.as_u16()),
                detail,
                format!("HTTP {status}"),
            ));
        }

        let parsed: GraphqlResponse = serde_json::from_slice(&body)?;
        if let Some(message) = first_message(parsed.errors) {
            return Err(LookupError::transport(
                Some(status.as_u16()),
                Some(message.clone()),
                format!("GraphQL error: {message}"),
            ));
        }

        parsed
            .data
            .and_then(|d| d.plu)
            .map(RawItem::Graphql)
            .ok_or_else(|| LookupError::InvalidResponse("response has no `plu` object".to_string()))
    }
}

fn first_message(errors: Vec<GraphqlErrorMessage>) -> Option<String> {
    errors.into_iter().next().map(|e| e.message)
}
