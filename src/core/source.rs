// Record service client

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::core::constants::{CATALOG_ENDPOINT, SIGNAL_ENDPOINT};
use crate::core::error::{Result, SourceError};
use crate::core::format::{decode_records, PredictionCounts, Record, SignalType};

/// Where raw sample arrays, prediction counts and the record list come from.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Raw numeric samples of an ECG or BPM record.
    async fn fetch_samples(&self, id: &str, signal_type: SignalType) -> Result<Vec<f64>>;

    /// Label to count map of a Pred record.
    async fn fetch_prediction_counts(&self, id: &str) -> Result<PredictionCounts>;

    /// Full record list.
    async fn fetch_records(&self) -> Result<Vec<Record>>;
}

pub struct HttpDataSource {
    client: Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, query);

        let resp = self.client.get(&url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        // Decode separately so malformed bodies surface as decode errors
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_samples(&self, id: &str, signal_type: SignalType) -> Result<Vec<f64>> {
        self.get_json(SIGNAL_ENDPOINT, &[("id", id), ("type", signal_type.as_str())])
            .await
    }

    async fn fetch_prediction_counts(&self, id: &str) -> Result<PredictionCounts> {
        self.get_json(SIGNAL_ENDPOINT, &[("id", id), ("type", SignalType::Pred.as_str())])
            .await
    }

    async fn fetch_records(&self) -> Result<Vec<Record>> {
        let values: Vec<Value> = self.get_json(CATALOG_ENDPOINT, &[]).await?;
        Ok(decode_records(values))
    }
}
