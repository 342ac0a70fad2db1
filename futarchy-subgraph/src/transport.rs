//! GraphQL transport
//!
//! Adapters talk to their indexers through [`GraphqlTransport`] so the query
//! and normalization logic can be exercised without a network.

use async_trait::async_trait;
use futarchy_core::{ChartError, ChartResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// Executes one GraphQL document against an endpoint and returns `data`.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn query(&self, endpoint: &str, query: &str, variables: Value) -> ChartResult<Value>;
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpGraphqlClient {
    client: Client,
}

impl HttpGraphqlClient {
    pub fn new() -> Self {
        Self::with_client(
            Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        )
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpGraphqlClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphqlTransport for HttpGraphqlClient {
    #[instrument(skip(self, query, variables))]
    async fn query(&self, endpoint: &str, query: &str, variables: Value) -> ChartResult<Value> {
        debug!("GraphQL request to {} with {}", endpoint, variables);

        let response = self
            .client
            .post(endpoint)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(|e| ChartError::network(format!("GraphQL request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChartError::upstream(format!(
                "Indexer error ({}): {}",
                status, body
            )));
        }

        let payload: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| ChartError::parse(format!("Failed to parse GraphQL response: {}", e)))?;

        into_data(payload)
    }
}

fn into_data(payload: GraphqlResponse) -> ChartResult<Value> {
    if let Some(errors) = payload.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(ChartError::upstream(format!(
            "GraphQL errors: {}",
            messages.join("; ")
        )));
    }

    payload
        .data
        .ok_or_else(|| ChartError::upstream("GraphQL response carried no data"))
}

/// Decode a sub-tree of a `data` payload into a typed shape.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(data: &Value, field: &str) -> ChartResult<T> {
    let node = data.get(field).cloned().unwrap_or(Value::Null);
    serde_json::from_value(node)
        .map_err(|e| ChartError::parse(format!("Unexpected shape for '{}': {}", field, e)))
}
