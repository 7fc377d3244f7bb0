use async_trait::async_trait;
use serde::Deserialize;
use wear_core::{
    error::BoxError,
    models::{ApplicationInfo, TransactionPage, TransactionQuery},
    services::Indexer,
};

use crate::http::{read_json, Endpoint};

pub const TESTNET_INDEXER: &str = "https://testnet-idx.algonode.cloud";
const TOKEN_HEADER: &str = "X-Indexer-API-Token";

#[derive(Debug, Deserialize)]
struct ApplicationResponse {
    application: ApplicationInfo,
}

pub struct IndexerClient {
    endpoint: Endpoint,
}

impl IndexerClient {
    pub fn new() -> Self {
        Self::new_with_endpoint(TESTNET_INDEXER, None)
    }

    pub fn new_with_endpoint(endpoint: &str, token: Option<String>) -> Self {
        Self { endpoint: Endpoint::new(endpoint, TOKEN_HEADER, token) }
    }
}

impl Default for IndexerClient {
    fn default() -> Self {
        Self::new()
    }
}

fn search_params(query: &TransactionQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("note-prefix", query.note_prefix.clone()),
        ("tx-type", query.tx_type.to_string()),
        ("min-round", query.min_round.to_string()),
    ];
    if let Some(next) = &query.next {
        params.push(("next", next.clone()));
    }
    params
}

#[async_trait]
impl Indexer for IndexerClient {
    async fn search_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage, BoxError> {
        let request = self.endpoint.get("/v2/transactions").query(&search_params(query));
        read_json(request.send().await?).await
    }

    async fn lookup_application(&self, app_id: u64) -> Result<ApplicationInfo, BoxError> {
        let path = format!("/v2/applications/{app_id}");
        let request = self.endpoint.get(&path).query(&[("include-all", "true")]);
        let response: ApplicationResponse = read_json(request.send().await?).await?;
        Ok(response.application)
    }
}
