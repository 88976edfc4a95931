use serde_json::Value;
use std::time::Duration;

use super::{MetricSnapshot, MetricValue};
use crate::error::ProbeError;

/// Thin HTTP client for JSON status pages served by cluster daemons.
#[derive(Debug, Clone)]
pub struct StatusClient {
    client: reqwest::Client,
    base_url: String,
}

impl StatusClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GETs `path` and decodes the body as JSON. Non-2xx statuses are errors.
    pub async fn get_json(&self, path: &str) -> Result<Value, ProbeError> {
        let url = self.url_for(path);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(ProbeError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        let document = serde_json::from_str(&body)?;
        log::trace!("Fetched {url} ({} bytes)", body.len());
        Ok(document)
    }
}

/// Reads named metrics from a daemon's JSON metrics page.
///
/// Every call fetches a fresh snapshot; there is no caching and no retry.
#[derive(Debug, Clone)]
pub struct MetricScraper {
    status: StatusClient,
    metrics_path: String,
}

impl MetricScraper {
    pub fn new(status: StatusClient, metrics_path: &str) -> Self {
        Self {
            status,
            metrics_path: metrics_path.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        self.status.url_for(&self.metrics_path)
    }

    pub async fn snapshot(&self) -> Result<MetricSnapshot, ProbeError> {
        let document = self.status.get_json(&self.metrics_path).await?;
        MetricSnapshot::from_json(&document)
    }

    pub async fn get_metric(&self, name: &str) -> Result<MetricValue, ProbeError> {
        let snapshot = self.snapshot().await?;
        snapshot.get(name).cloned()
    }

    pub async fn get_metric_i64(&self, name: &str) -> Result<i64, ProbeError> {
        self.snapshot().await?.get_i64(name)
    }

    pub async fn get_metric_string(&self, name: &str) -> Result<String, ProbeError> {
        self.snapshot().await?.get_string(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = StatusClient::new("http://localhost:25000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:25000");
        assert_eq!(
            client.url_for("/jsonmetrics?json"),
            "http://localhost:25000/jsonmetrics?json"
        );
    }

    #[test]
    fn test_scraper_endpoint() {
        let client = StatusClient::new("http://impalad:25000", Duration::from_secs(5)).unwrap();
        let scraper = MetricScraper::new(client, crate::DEFAULT_METRICS_PATH);
        assert_eq!(scraper.endpoint(), "http://impalad:25000/jsonmetrics?json");
    }
}
