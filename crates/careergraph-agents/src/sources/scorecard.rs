use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use careergraph_core::{SeedData, SourcesConfig};

/// Floor applied to tuition figures coming from the seed-fallback tier.
pub const TUITION_FLOOR: f64 = 3_000.0;

/// Simplified cost record for one institution.
#[derive(Debug, Clone)]
pub struct CollegeCosts {
    pub in_state_tuition: f64,
    pub out_of_state_tuition: f64,
    pub city: Option<String>,
}

/// Client for the college cost API (College Scorecard shaped). A missing
/// API key or an empty result set is `Ok(None)`, never an error: the cost
/// calculator's fallback chain decides what happens next.
pub struct ScorecardClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
    seed: Arc<SeedData>,
}

impl ScorecardClient {
    pub fn new(config: &SourcesConfig, seed: Arc<SeedData>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key: config.scorecard_api_key.clone(),
            base_url: config.scorecard_base_url.clone(),
            client,
            seed,
        })
    }

    /// Fetch live cost data for an institution. Single attempt; no retries.
    pub async fn fetch_costs(&self, institution: &str) -> Result<Option<CollegeCosts>> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                debug!("no scorecard API key configured; skipping live lookup");
                return Ok(None);
            }
        };

        let name = self.seed.canonical_name(institution);
        let url = format!("{}/schools", self.base_url.trim_end_matches('/'));
        let fields = [
            "school.name",
            "school.city",
            "school.state",
            "latest.cost.tuition.in_state",
            "latest.cost.tuition.out_of_state",
        ]
        .join(",");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", api_key.as_str()),
                ("school.name", name.as_str()),
                ("fields", fields.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach college cost API")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("college cost API error ({})", status));
        }

        let parsed: ScorecardResponse = response
            .json()
            .await
            .context("Failed to parse college cost API response")?;

        let Some(school) = parsed.results.into_iter().next() else {
            debug!("college cost API returned no results for '{}'", name);
            return Ok(None);
        };

        let in_state = school.in_state_tuition.unwrap_or(0.0);
        let out_of_state = school.out_of_state_tuition.unwrap_or(0.0);
        if in_state <= 0.0 && out_of_state <= 0.0 {
            return Ok(None);
        }

        Ok(Some(CollegeCosts {
            in_state_tuition: in_state,
            out_of_state_tuition: out_of_state.max(in_state),
            city: school.city,
        }))
    }

    /// Seed-backed fallback with the tuition floor enforced. Looser name
    /// matching than the ranking-table tier.
    pub fn fallback_costs(&self, institution: &str) -> Option<CollegeCosts> {
        self.seed.institution_fuzzy(institution).map(|record| CollegeCosts {
            in_state_tuition: record.in_state_tuition.max(TUITION_FLOOR),
            out_of_state_tuition: record.out_of_state_tuition.max(TUITION_FLOOR),
            city: Some(record.city.clone()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ScorecardResponse {
    #[serde(default)]
    results: Vec<ScorecardSchool>,
}

#[derive(Debug, Deserialize)]
struct ScorecardSchool {
    #[serde(rename = "school.city", default)]
    city: Option<String>,
    #[serde(rename = "latest.cost.tuition.in_state", default)]
    in_state_tuition: Option<f64>,
    #[serde(rename = "latest.cost.tuition.out_of_state", default)]
    out_of_state_tuition: Option<f64>,
}
