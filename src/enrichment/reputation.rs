use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ADDRESS_PLACEHOLDER;
use crate::error::{EnrichmentError, SystemError};
use crate::logging::PerformanceMonitor;
use crate::models::ReputationReport;

#[derive(Debug, Deserialize)]
struct ReputationResponse {
    results: Option<ReputationReport>,
}

/// HTTP client for the contract reputation service
#[derive(Clone)]
pub struct ReputationClient {
    client: Client,
    url_template: String,
}

impl ReputationClient {
    pub fn new(url_template: String, timeout_seconds: u64) -> Result<Self, SystemError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| SystemError::HttpClient(e.to_string()))?;
        Ok(Self { client, url_template })
    }

    pub fn url_for(&self, address: &str) -> String {
        self.url_template.replace(ADDRESS_PLACEHOLDER, address)
    }

    /// GET the report for a contract; the payload must expose `results`
    pub async fn lookup(&self, address: &str) -> Result<ReputationReport, EnrichmentError> {
        let monitor = PerformanceMonitor::new("reputation_lookup")
            .with_metadata("address", serde_json::json!(address));

        let result = self.fetch(address).await;
        monitor.finish_with_result(&result);
        result
    }

    async fn fetch(&self, address: &str) -> Result<ReputationReport, EnrichmentError> {
        let response = self.client.get(self.url_for(address)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let payload: ReputationResponse = serde_json::from_slice(&bytes)
            .map_err(|e| EnrichmentError::InvalidPayload(e.to_string()))?;

        payload
            .results
            .ok_or_else(|| EnrichmentError::InvalidPayload("missing results".to_string()))
    }
}
