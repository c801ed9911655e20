use crate::config::DashboardConfig;
use crate::errors::{DashboardError, FetchError};
use crate::models::{BudgetEntry, HealthEntry, SubmitResponse};
use serde::Serialize;
use tracing::info;

/// Body mass index from weight in kilograms and height in centimetres,
/// rounded to two decimals the way the entry form stores it.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    let height_m = height_cm / 100.0;
    let usable = |value: f64| value.is_finite() && value > 0.0;
    if !usable(weight_kg) || !usable(height_m) {
        return None;
    }
    Some(((weight_kg / (height_m * height_m)) * 100.0).round() / 100.0)
}

/// Posts new daily entries to the tracking server.
#[derive(Debug, Clone)]
pub struct EntryClient {
    client: reqwest::Client,
    base_url: String,
}

impl EntryClient {
    pub fn new(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn submit_health(&self, entry: &HealthEntry) -> Result<String, FetchError> {
        self.post("/add-health", entry).await
    }

    pub async fn submit_budget(&self, entry: &BudgetEntry) -> Result<String, FetchError> {
        self.post("/add-budget", entry).await
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<String, FetchError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(status, &url));
        }

        let reply: SubmitResponse = response.json().await?;
        info!("{path}: {}", reply.message);
        Ok(reply.message)
    }
}
