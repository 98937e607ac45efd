use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use careergraph_ai::{extract_json_block, GenerationConfig, LlmProvider, Message};
use careergraph_core::{
    CareerPathwaySeed, Certification, Citation, FeederProgram, License, PathwayResult, Profile,
    SeedData, TransferOption,
};

use crate::selector::{PathwaySelector, RankedOption};
use crate::sources::{SearchClient, SearchResult};

const RESEARCH_SYSTEM_PROMPT: &str = "You are an educational pathway \
researcher. From the search results provided, identify the feeder-college \
programs, university transfer options with articulation agreements, \
professional certifications, and licenses required for the career. Respond \
with ONLY a JSON object with the fields: feeder_programs, transfer_options, \
certifications, licenses, citations.";

/// Outcome of the research stage: the assembled pathway plus the ranked
/// options the advisor chooses from.
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub pathway: PathwayResult,
    pub ranked: Vec<RankedOption>,
}

/// Researches feeder programs, transfer options, and credential
/// requirements for a career. Strategy order: seed table, then
/// search + generative structuring, then category defaults. Every miss or
/// failure falls through to the next strategy.
pub struct PathwayResearch {
    seed: Arc<SeedData>,
    selector: PathwaySelector,
    search: Option<SearchClient>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl PathwayResearch {
    pub fn new(
        seed: Arc<SeedData>,
        search: Option<SearchClient>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        let selector = PathwaySelector::new(seed.clone());
        Self {
            seed,
            selector,
            search,
            llm,
        }
    }

    pub async fn research(&self, profile: &Profile) -> ResearchOutcome {
        let career = profile.career.as_str();
        let location = profile.constraints.location;

        if let Some(seeded) = self.seed.pathway(career) {
            debug!("using seeded pathway for '{}'", career);
            return self.finish(self.from_seed(seeded), location);
        }

        if let Some(results) = self.run_search(career).await {
            if let Some(pathway) = self.structure_results(career, &results).await {
                return self.finish(pathway, location);
            }
        }

        debug!("no seed or search pathway for '{}'; using category defaults", career);
        let mut pathway = self
            .selector
            .category_defaults(career, &profile.category);
        pathway.citations = vec![citation(
            0,
            &format!("Feeder pathways for {}", career),
            "https://www.mdc.edu/",
        )];
        self.finish(pathway, location)
    }

    /// Rank, dedup, and location-filter the transfer options, then seal the
    /// pathway with the surviving options in rank order.
    fn finish(
        &self,
        mut pathway: PathwayResult,
        location: careergraph_core::LocationPreference,
    ) -> ResearchOutcome {
        let ranked = self
            .selector
            .select(std::mem::take(&mut pathway.transfer_options), location);
        pathway.transfer_options = ranked.iter().map(|r| r.option.clone()).collect();
        ResearchOutcome { pathway, ranked }
    }

    fn from_seed(&self, seeded: &CareerPathwaySeed) -> PathwayResult {
        let mut citations: Vec<Citation> = Vec::new();
        for (i, program) in seeded.feeder_programs.iter().enumerate() {
            citations.push(citation(i, &program.name, &program.url));
        }
        let offset = citations.len();
        for (i, partner) in seeded.transfer_partners.iter().enumerate() {
            citations.push(citation(offset + i, &partner.university, &partner.url));
        }

        PathwayResult {
            feeder_programs: seeded.feeder_programs.clone(),
            transfer_options: seeded.transfer_partners.clone(),
            certifications: seeded.certifications.clone(),
            licenses: seeded.licenses.clone(),
            citations,
        }
    }

    async fn run_search(&self, career: &str) -> Option<Vec<SearchResult>> {
        let client = self.search.as_ref()?;
        if !client.is_configured() {
            return None;
        }
        match client.search_feeder_programs(career).await {
            Ok(results) if results.is_empty() => {
                debug!("search returned no results for '{}'", career);
                None
            }
            Ok(results) => Some(results),
            Err(e) => {
                warn!("pathway search failed for '{}': {e:#}", career);
                None
            }
        }
    }

    async fn structure_results(
        &self,
        career: &str,
        results: &[SearchResult],
    ) -> Option<PathwayResult> {
        let provider = self.llm.as_ref()?;
        match self.generate_pathway(provider.as_ref(), career, results).await {
            Ok(pathway) => Some(pathway),
            Err(e) => {
                warn!("pathway structuring unusable for '{}' ({e:#})", career);
                None
            }
        }
    }

    async fn generate_pathway(
        &self,
        provider: &dyn LlmProvider,
        career: &str,
        results: &[SearchResult],
    ) -> anyhow::Result<PathwayResult> {
        let results_json = serde_json::to_string_pretty(&results[..results.len().min(5)])?;
        let prompt = format!(
            "Analyze these search results and create a structured pathway.\n\n\
             Career: {}\n\nSearch Results:\n```json\n{}\n```\n\n\
             Return ONLY the JSON object described in your instructions.",
            career, results_json
        );

        let messages = vec![Message::system(RESEARCH_SYSTEM_PROMPT), Message::user(prompt)];
        let response = provider
            .generate_chat(&messages, &GenerationConfig::default())
            .await?;

        let block = extract_json_block(&response.content)?;
        let wire: PathwayWire = serde_json::from_str(block)?;
        Ok(wire.into_pathway())
    }
}

fn citation(index: usize, title: &str, url: &str) -> Citation {
    Citation {
        id: (index + 1).to_string(),
        title: title.to_string(),
        url: url.to_string(),
        accessed_at: Utc::now(),
    }
}

/// Lenient wire shape for generative pathway output.
#[derive(Debug, Deserialize)]
struct PathwayWire {
    #[serde(default)]
    feeder_programs: Vec<FeederProgram>,
    #[serde(default)]
    transfer_options: Vec<TransferOption>,
    #[serde(default)]
    certifications: Vec<Certification>,
    #[serde(default)]
    licenses: Vec<License>,
    #[serde(default)]
    citations: Vec<CitationWire>,
}

#[derive(Debug, Deserialize)]
struct CitationWire {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

impl PathwayWire {
    fn into_pathway(self) -> PathwayResult {
        let citations = self
            .citations
            .into_iter()
            .enumerate()
            .map(|(i, c)| citation(i, &c.title, &c.url))
            .collect();
        PathwayResult {
            feeder_programs: self.feeder_programs,
            transfer_options: self.transfer_options,
            certifications: self.certifications,
            licenses: self.licenses,
            citations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careergraph_core::{
        BudgetTier, Constraints, LocationPreference, TimelinePreference,
    };

    fn profile(career: &str, category: &str, location: LocationPreference) -> Profile {
        Profile {
            career: career.to_string(),
            category: category.to_string(),
            constraints: Constraints {
                budget: BudgetTier::Medium,
                timeline: TimelinePreference::Normal,
                gpa: 3.3,
                has_aa: false,
                location,
            },
            preferences: vec![],
            flags: vec![],
            recommendations: vec![],
        }
    }

    fn research() -> PathwayResearch {
        PathwayResearch::new(Arc::new(SeedData::default()), None, None)
    }

    #[tokio::test]
    async fn test_seeded_nursing_pathway() {
        let outcome = research()
            .research(&profile("Registered Nurse", "Healthcare", LocationPreference::Local))
            .await;
        assert_eq!(outcome.pathway.feeder_programs.len(), 1);
        assert!(outcome.pathway.feeder_programs[0].name.contains("Nursing"));
        assert_eq!(outcome.pathway.licenses.len(), 1);
        assert_eq!(outcome.pathway.licenses[0].name, "NCLEX-RN");
        assert!(!outcome.pathway.citations.is_empty());
    }

    #[tokio::test]
    async fn test_unseeded_career_gets_category_defaults() {
        let outcome = research()
            .research(&profile(
                "Robotics Engineer",
                "STEM-Engineering",
                LocationPreference::InRegion,
            ))
            .await;
        assert_eq!(outcome.pathway.licenses.len(), 1);
        assert!(!outcome.pathway.transfer_options.is_empty());
        assert!(outcome.ranked.iter().all(|r| r.in_region));
    }

    #[tokio::test]
    async fn test_in_region_never_returns_out_of_region() {
        let outcome = research()
            .research(&profile(
                "Software Developer",
                "STEM-Technology",
                LocationPreference::InRegion,
            ))
            .await;
        assert!(!outcome.ranked.is_empty());
        assert!(outcome.ranked.iter().all(|r| r.in_region));
    }

    #[tokio::test]
    async fn test_anywhere_includes_out_of_region_defaults() {
        let outcome = research()
            .research(&profile(
                "Marine Biologist",
                "General",
                LocationPreference::Anywhere,
            ))
            .await;
        assert!(outcome.ranked.iter().any(|r| !r.in_region));
    }

    #[test]
    fn test_pathway_wire_defaults() {
        let wire: PathwayWire = serde_json::from_str(r#"{"transfer_options": []}"#).unwrap();
        let pathway = wire.into_pathway();
        assert!(pathway.feeder_programs.is_empty());
        assert!(pathway.licenses.is_empty());
    }
}
