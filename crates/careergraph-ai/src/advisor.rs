use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use careergraph_core::{InstitutionRecord, Profile, SeedData};

use crate::extract::extract_json_block;
use crate::llm_provider::{GenerationConfig, LlmProvider, Message};

/// Candidates offered to the advisor; anything beyond this is truncated.
pub const MAX_CANDIDATES: usize = 8;
/// Upper bound on a believable per-path cost estimate.
pub const MAX_ESTIMATED_COST: f64 = 500_000.0;

/// A ranked candidate institution with its resolved cost components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateCost {
    pub university: String,
    pub tier: u8,
    pub score: i64,
    pub in_region: bool,
    pub tuition_per_year: f64,
    pub yearly_living: f64,
    pub estimated_total: f64,
    pub duration_years: f64,
}

impl CandidateCost {
    /// Build a candidate straight from the ranking table. Used by the
    /// deterministic advisor when the caller supplied too few candidates.
    pub fn from_record(record: &InstitutionRecord, seed: &SeedData) -> Self {
        let tuition = record.tuition(record.in_region);
        let (housing, _) = seed.housing(&record.city);
        let yearly_living = housing.yearly_living();
        Self {
            university: record.name.clone(),
            tier: record.tier,
            score: record.ranking_score(),
            in_region: record.in_region,
            tuition_per_year: tuition,
            yearly_living,
            estimated_total: (tuition + yearly_living) * 2.0,
            duration_years: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisorContext {
    pub profile: Profile,
    /// Ranked best-first; at most [`MAX_CANDIDATES`] entries are sent out.
    pub candidates: Vec<CandidateCost>,
}

/// One recommended institution for a path archetype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathPick {
    pub university: String,
    pub tier: u8,
    pub score: i64,
    pub estimated_cost: f64,
    pub duration_years: f64,
    #[serde(default)]
    pub rationale: String,
}

impl PathPick {
    fn from_candidate(candidate: &CandidateCost, rationale: &str) -> Self {
        Self {
            university: candidate.university.clone(),
            tier: candidate.tier,
            score: candidate.score,
            estimated_cost: candidate.estimated_total,
            duration_years: candidate.duration_years,
            rationale: rationale.to_string(),
        }
    }
}

/// The advisor's answer: one institution per path archetype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub cheapest: PathPick,
    pub fastest: PathPick,
    pub prestige: PathPick,
}

impl Recommendation {
    pub fn picks(&self) -> [(&'static str, &PathPick); 3] {
        [
            ("cheapest", &self.cheapest),
            ("fastest", &self.fastest),
            ("prestige", &self.prestige),
        ]
    }

    /// Enforce the acceptance rules for generative output: every pick names
    /// a university, costs are positive and believable, durations are
    /// positive, and the three university names are pairwise distinct.
    pub fn validate(&self) -> Result<()> {
        for (key, pick) in self.picks() {
            if pick.university.trim().is_empty() {
                return Err(anyhow!("{} pick has an empty university name", key));
            }
            if !pick.estimated_cost.is_finite()
                || pick.estimated_cost <= 0.0
                || pick.estimated_cost > MAX_ESTIMATED_COST
            {
                return Err(anyhow!(
                    "{} pick has an implausible estimated cost: {}",
                    key,
                    pick.estimated_cost
                ));
            }
            if !pick.duration_years.is_finite() || pick.duration_years <= 0.0 {
                return Err(anyhow!(
                    "{} pick has an invalid duration: {}",
                    key,
                    pick.duration_years
                ));
            }
        }

        let names: Vec<String> = self
            .picks()
            .iter()
            .map(|(_, p)| p.university.trim().to_lowercase())
            .collect();
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                if names[i] == names[j] {
                    return Err(anyhow!(
                        "recommendation repeats university '{}' across paths",
                        self.picks()[i].1.university
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Narrow seam for path-archetype selection. The generative implementation
/// and the deterministic fallback are interchangeable here, which lets the
/// whole pipeline run and be tested with zero network access.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn propose(&self, ctx: &AdvisorContext) -> Result<Recommendation>;

    fn advisor_name(&self) -> &str;
}

/// Rule-based selection over the ranked candidates. Requires no network.
pub struct DeterministicAdvisor {
    seed: Arc<SeedData>,
}

impl DeterministicAdvisor {
    pub fn new(seed: Arc<SeedData>) -> Self {
        Self { seed }
    }

    fn normalized(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Next-ranked institution from the seed table whose name is not in use.
    fn top_up(&self, used: &[String]) -> Option<CandidateCost> {
        let mut records: Vec<&InstitutionRecord> = self.seed.institutions().iter().collect();
        records.sort_by(|a, b| {
            b.ranking_score()
                .cmp(&a.ranking_score())
                .then_with(|| a.name.cmp(&b.name))
        });
        records
            .into_iter()
            .find(|r| !used.contains(&Self::normalized(&r.name)))
            .map(|r| CandidateCost::from_record(r, &self.seed))
    }

    fn pick_distinct(
        &self,
        pool: &[CandidateCost],
        used: &[String],
        better: impl Fn(&CandidateCost, &CandidateCost) -> std::cmp::Ordering,
    ) -> Option<CandidateCost> {
        pool.iter()
            .filter(|c| !used.contains(&Self::normalized(&c.university)))
            .max_by(|a, b| better(a, b).then_with(|| b.university.cmp(&a.university)))
            .cloned()
            .or_else(|| self.top_up(used))
    }
}

#[async_trait]
impl Advisor for DeterministicAdvisor {
    async fn propose(&self, ctx: &AdvisorContext) -> Result<Recommendation> {
        let pool: Vec<CandidateCost> = if ctx.candidates.is_empty() {
            warn!("advisor received no candidates; selecting from seed rankings");
            self.seed
                .institutions()
                .iter()
                .map(|r| CandidateCost::from_record(r, &self.seed))
                .collect()
        } else {
            ctx.candidates.clone()
        };

        let mut used: Vec<String> = Vec::with_capacity(3);

        // Cheapest: lowest tuition among in-region candidates, falling back
        // to lowest tuition overall when nothing is tagged in-region.
        let in_region: Vec<CandidateCost> =
            pool.iter().filter(|c| c.in_region).cloned().collect();
        let cheapest_pool = if in_region.is_empty() { &pool } else { &in_region };
        let cheapest = self
            .pick_distinct(cheapest_pool, &used, |a, b| {
                b.tuition_per_year
                    .partial_cmp(&a.tuition_per_year)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| anyhow!("no candidate available for cheapest path"))?;
        used.push(Self::normalized(&cheapest.university));

        // Prestige: highest ranking score not already used.
        let prestige = self
            .pick_distinct(&pool, &used, |a, b| a.score.cmp(&b.score))
            .ok_or_else(|| anyhow!("no candidate available for prestige path"))?;
        used.push(Self::normalized(&prestige.university));

        // Fastest: next-highest ranking score distinct from the other two.
        let fastest = self
            .pick_distinct(&pool, &used, |a, b| a.score.cmp(&b.score))
            .ok_or_else(|| anyhow!("no candidate available for fastest path"))?;

        let recommendation = Recommendation {
            cheapest: PathPick::from_candidate(
                &cheapest,
                "Lowest in-region tuition among ranked candidates",
            ),
            fastest: PathPick::from_candidate(
                &fastest,
                "Strong ranking with an accelerated course load available",
            ),
            prestige: PathPick::from_candidate(
                &prestige,
                "Highest ranking score among candidates",
            ),
        };
        recommendation.validate()?;
        Ok(recommendation)
    }

    fn advisor_name(&self) -> &str {
        "deterministic"
    }
}

const ADVISOR_SYSTEM_PROMPT: &str = "You are an educational pathway advisor. \
Given a student profile and a ranked list of candidate universities with \
resolved cost components, recommend exactly one university for each of the \
three path archetypes: cheapest, fastest, and prestige. The three \
universities must be distinct. Respond with ONLY a JSON object of the form \
{\"cheapest\": {...}, \"fastest\": {...}, \"prestige\": {...}} where each \
pick has the fields: university, tier, score, estimated_cost, \
duration_years, rationale.";

/// Generative advisor. Any call failure, parse failure, or validation
/// failure falls through to the deterministic selection.
pub struct LlmAdvisor {
    provider: Arc<dyn LlmProvider>,
    fallback: DeterministicAdvisor,
}

impl LlmAdvisor {
    pub fn new(provider: Arc<dyn LlmProvider>, seed: Arc<SeedData>) -> Self {
        Self {
            provider,
            fallback: DeterministicAdvisor::new(seed),
        }
    }

    async fn try_generate(&self, ctx: &AdvisorContext) -> Result<Recommendation> {
        let mut trimmed = ctx.clone();
        trimmed.candidates.truncate(MAX_CANDIDATES);

        let context_json = serde_json::to_string_pretty(&trimmed)
            .context("Failed to serialize advisor context")?;
        let prompt = format!(
            "Student profile and candidate universities:\n```json\n{}\n```\n\n\
             Recommend one university per path archetype as specified.",
            context_json
        );

        let messages = vec![Message::system(ADVISOR_SYSTEM_PROMPT), Message::user(prompt)];
        let config = GenerationConfig {
            temperature: 0.1,
            ..Default::default()
        };

        let response = self.provider.generate_chat(&messages, &config).await?;
        let block = extract_json_block(&response.content)?;
        let recommendation: Recommendation =
            serde_json::from_str(block).context("Recommendation did not match schema")?;
        recommendation.validate()?;
        Ok(recommendation)
    }
}

#[async_trait]
impl Advisor for LlmAdvisor {
    async fn propose(&self, ctx: &AdvisorContext) -> Result<Recommendation> {
        match self.try_generate(ctx).await {
            Ok(recommendation) => Ok(recommendation),
            Err(e) => {
                warn!("generative advisor unusable ({e:#}); using deterministic selection");
                self.fallback.propose(ctx).await
            }
        }
    }

    fn advisor_name(&self) -> &str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careergraph_core::{
        BudgetTier, Constraints, LocationPreference, TimelinePreference,
    };

    fn profile() -> Profile {
        Profile {
            career: "Mechanical Engineer".to_string(),
            category: "STEM-Engineering".to_string(),
            constraints: Constraints {
                budget: BudgetTier::Medium,
                timeline: TimelinePreference::Normal,
                gpa: 3.5,
                has_aa: false,
                location: LocationPreference::Anywhere,
            },
            preferences: vec![],
            flags: vec![],
            recommendations: vec![],
        }
    }

    fn candidate(name: &str, tier: u8, score: i64, in_region: bool, tuition: f64) -> CandidateCost {
        CandidateCost {
            university: name.to_string(),
            tier,
            score,
            in_region,
            tuition_per_year: tuition,
            yearly_living: 15_000.0,
            estimated_total: (tuition + 15_000.0) * 2.0,
            duration_years: 4.0,
        }
    }

    fn seed() -> Arc<SeedData> {
        Arc::new(SeedData::default())
    }

    #[tokio::test]
    async fn test_deterministic_selection() {
        let advisor = DeterministicAdvisor::new(seed());
        let ctx = AdvisorContext {
            profile: profile(),
            candidates: vec![
                candidate("Florida Atlantic University", 3, 191, true, 4_879.0),
                candidate("Florida International University", 3, 276, true, 6_565.0),
                candidate("Massachusetts Institute of Technology", 1, 598, false, 57_986.0),
                candidate("Stanford University", 1, 597, false, 59_339.0),
            ],
        };

        let rec = advisor.propose(&ctx).await.unwrap();
        assert_eq!(rec.cheapest.university, "Florida Atlantic University");
        assert_eq!(rec.prestige.university, "Massachusetts Institute of Technology");
        assert_eq!(rec.fastest.university, "Stanford University");
        assert!(rec.validate().is_ok());
    }

    #[tokio::test]
    async fn test_deterministic_breaks_collisions_with_fewer_than_three() {
        let advisor = DeterministicAdvisor::new(seed());
        let ctx = AdvisorContext {
            profile: profile(),
            candidates: vec![candidate(
                "Florida International University",
                3,
                276,
                true,
                6_565.0,
            )],
        };

        let rec = advisor.propose(&ctx).await.unwrap();
        assert!(rec.validate().is_ok());
        let names: Vec<&str> = rec.picks().iter().map(|(_, p)| p.university.as_str()).collect();
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn test_deterministic_with_empty_candidates() {
        let advisor = DeterministicAdvisor::new(seed());
        let ctx = AdvisorContext {
            profile: profile(),
            candidates: vec![],
        };
        let rec = advisor.propose(&ctx).await.unwrap();
        assert!(rec.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let pick = PathPick {
            university: "FIU".to_string(),
            tier: 3,
            score: 276,
            estimated_cost: 40_000.0,
            duration_years: 4.0,
            rationale: String::new(),
        };
        let rec = Recommendation {
            cheapest: pick.clone(),
            fastest: pick.clone(),
            prestige: pick,
        };
        assert!(rec.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_cost_out_of_bounds() {
        let base = PathPick {
            university: "A".to_string(),
            tier: 1,
            score: 500,
            estimated_cost: 40_000.0,
            duration_years: 4.0,
            rationale: String::new(),
        };
        let mut rec = Recommendation {
            cheapest: base.clone(),
            fastest: PathPick {
                university: "B".to_string(),
                ..base.clone()
            },
            prestige: PathPick {
                university: "C".to_string(),
                estimated_cost: 600_000.0,
                ..base
            },
        };
        assert!(rec.validate().is_err());
        rec.prestige.estimated_cost = 120_000.0;
        assert!(rec.validate().is_ok());
        rec.fastest.estimated_cost = 0.0;
        assert!(rec.validate().is_err());
    }
}
