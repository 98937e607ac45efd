use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use careergraph_core::SourcesConfig;

/// Trusted education domains queried by default.
const TRUSTED_DOMAINS: &[&str] = &[
    "mdc.edu",
    "fiu.edu",
    "fau.edu",
    "ucf.edu",
    "uf.edu",
    "floridashines.org",
    "ed.gov",
];

const MAX_RESULTS_PER_REQUEST: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub domain: String,
}

/// Programmable-search client restricted to trusted education domains.
/// Missing credentials are an error; the research stage treats that the
/// same as an empty result set.
pub struct SearchClient {
    api_key: Option<String>,
    engine_id: Option<String>,
    base_url: String,
    client: Client,
}

impl SearchClient {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key: config.search_api_key.clone(),
            engine_id: config.search_engine_id.clone(),
            base_url: config.search_base_url.clone(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }

    pub async fn search_education_sites(
        &self,
        query: &str,
        num_results: usize,
        site_restrictions: Option<&[&str]>,
    ) -> Result<Vec<SearchResult>> {
        let (api_key, engine_id) = match (&self.api_key, &self.engine_id) {
            (Some(key), Some(id)) => (key, id),
            _ => return Err(anyhow!("search credentials are not configured")),
        };

        let domains = site_restrictions.unwrap_or(TRUSTED_DOMAINS);
        let site_query = domains
            .iter()
            .map(|d| format!("site:{}", d))
            .collect::<Vec<_>>()
            .join(" OR ");
        let full_query = format!("{} {}", query, site_query);
        let num = num_results.min(MAX_RESULTS_PER_REQUEST).to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", api_key.as_str()),
                ("cx", engine_id.as_str()),
                ("q", full_query.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach search API")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("search API error ({})", status));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search API response")?;

        Ok(parsed
            .items
            .into_iter()
            .map(|item| SearchResult {
                domain: extract_domain(&item.link),
                title: item.title,
                link: item.link,
                snippet: item.snippet,
            })
            .collect())
    }

    /// Search for feeder-institution programs matching a career.
    pub async fn search_feeder_programs(&self, career: &str) -> Result<Vec<SearchResult>> {
        let query = format!("{} program degree", career);
        self.search_education_sites(&query, 5, Some(&["mdc.edu"]))
            .await
    }
}

fn extract_domain(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("")
        .to_string()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}
