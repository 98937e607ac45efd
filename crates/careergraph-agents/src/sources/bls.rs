use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use careergraph_core::SourcesConfig;

const HOURS_PER_WORK_YEAR: f64 = 2_080.0;

/// Client for the occupational wage API (BLS OEWS shaped). Series values
/// arrive as strings; median hourly figures are annualized at 2080 hours.
pub struct BlsClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl BlsClient {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key: config.bls_api_key.clone(),
            base_url: config.bls_base_url.clone(),
            client,
        })
    }

    /// Fetch the median annual salary for an occupation code. `Ok(None)`
    /// when no key is configured or the series carries no usable value.
    pub async fn fetch_median_annual(&self, soc_code: &str) -> Result<Option<f64>> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                debug!("no wage API key configured; skipping live lookup");
                return Ok(None);
            }
        };

        let code = soc_code.replace('-', "");
        // Area 0000000 = national; data type 02 = median hourly wage,
        // 04 = mean annual wage.
        let series_ids = vec![
            format!("OEUM{}0000000002", code),
            format!("OEUM{}0000000004", code),
        ];

        let payload = SeriesRequest {
            seriesid: series_ids,
            startyear: "2022".to_string(),
            endyear: "2024".to_string(),
            registrationkey: Some(api_key.clone()),
        };

        let url = format!("{}/timeseries/data/", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach wage API")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("wage API error ({})", status));
        }

        let parsed: SeriesResponse = response
            .json()
            .await
            .context("Failed to parse wage API response")?;

        if parsed.status != "REQUEST_SUCCEEDED" {
            return Err(anyhow!("wage API request failed: {}", parsed.status));
        }

        let mut median_hourly = None;
        let mut mean_annual = None;

        for series in parsed.results.series {
            let Some(latest) = series.data.first() else {
                continue;
            };
            let Ok(value) = latest.value.parse::<f64>() else {
                continue;
            };
            if series.series_id.ends_with("02") {
                median_hourly = Some(value);
            } else if series.series_id.ends_with("04") {
                mean_annual = Some(value);
            }
        }

        let annual = median_hourly
            .map(|hourly| hourly * HOURS_PER_WORK_YEAR)
            .or(mean_annual);

        Ok(annual.filter(|v| *v > 0.0))
    }
}

#[derive(Debug, Serialize)]
struct SeriesRequest {
    seriesid: Vec<String>,
    startyear: String,
    endyear: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    #[serde(default)]
    status: String,
    #[serde(rename = "Results", default)]
    results: SeriesResults,
}

#[derive(Debug, Default, Deserialize)]
struct SeriesResults {
    #[serde(default)]
    series: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(rename = "seriesID", default)]
    series_id: String,
    #[serde(default)]
    data: Vec<SeriesPoint>,
}

#[derive(Debug, Deserialize)]
struct SeriesPoint {
    #[serde(default)]
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer, api_key: Option<&str>) -> BlsClient {
        let config = SourcesConfig {
            bls_api_key: api_key.map(str::to_string),
            bls_base_url: server.base_url(),
            ..Default::default()
        };
        BlsClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_skips_live_lookup() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, None);
        assert!(client.fetch_median_annual("17-2141").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_median_hourly_is_annualized() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/timeseries/data/");
                then.status(200).json_body(json!({
                    "status": "REQUEST_SUCCEEDED",
                    "Results": {
                        "series": [{
                            "seriesID": "OEUM1721410000000002",
                            "data": [{"year": "2024", "value": "45.50"}]
                        }]
                    }
                }));
            })
            .await;

        let client = client_for(&server, Some("test-key"));
        let median = client.fetch_median_annual("17-2141").await.unwrap().unwrap();
        assert_eq!(median, 45.50 * 2_080.0);
    }

    #[tokio::test]
    async fn test_failed_status_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/timeseries/data/");
                then.status(200).json_body(json!({
                    "status": "REQUEST_NOT_PROCESSED",
                    "Results": {"series": []}
                }));
            })
            .await;

        let client = client_for(&server, Some("test-key"));
        assert!(client.fetch_median_annual("17-2141").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_series_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/timeseries/data/");
                then.status(200).json_body(json!({
                    "status": "REQUEST_SUCCEEDED",
                    "Results": {"series": []}
                }));
            })
            .await;

        let client = client_for(&server, Some("test-key"));
        assert!(client.fetch_median_annual("17-2141").await.unwrap().is_none());
    }
}
