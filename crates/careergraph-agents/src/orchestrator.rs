use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use careergraph_ai::{
    Advisor, AdvisorContext, CandidateCost, DeterministicAdvisor, LlmAdvisor, LlmProvider,
    PathPick, Recommendation, MAX_CANDIDATES,
};
use careergraph_core::{
    CareerGraphError, CostBreakdown, Goal, NodeKind, Path, PathId, PathSet, PathwayResult,
    Position, Profile, QuizInput, Residency, Result, Roadmap, RoadmapEdge, RoadmapMetadata,
    RoadmapNode, SalaryOutlookSummary, SalaryResult, SeedData, Settings, Step, StepKind,
};

use crate::costs::{CostCalculator, UNIVERSITY_YEARS};
use crate::profiler::IntakeProfiler;
use crate::research::{PathwayResearch, ResearchOutcome};
use crate::salary::SalaryOutlook;
use crate::selector::PathwaySelector;
use crate::sources::{BlsClient, ScorecardClient, SearchClient};

/// Confidence reported in roadmap metadata.
const ROADMAP_CONFIDENCE: f64 = 0.85;
/// An accelerated path recovers its cost sooner; a prestige path later.
const FASTEST_ROI_FACTOR: f64 = 0.8;
const PRESTIGE_ROI_FACTOR: f64 = 1.5;
/// Step-cost sums win over the calculator total once they exceed it by
/// this fraction (graduate goals are added after cost calculation).
const RECONCILE_TOLERANCE: f64 = 0.10;
const DEFAULT_DURATION_LABEL: &str = "4 years";

/// Coordinates the full pipeline: profiling, pathway research, cost
/// estimation, salary outlook, advisor selection, and final synthesis.
/// Stages run strictly in sequence; no state is shared across requests.
pub struct Orchestrator {
    seed: Arc<SeedData>,
    profiler: IntakeProfiler,
    research: PathwayResearch,
    costs: CostCalculator,
    salary: SalaryOutlook,
    advisor: Arc<dyn Advisor>,
}

impl Orchestrator {
    pub fn new(
        settings: &Settings,
        seed: Arc<SeedData>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self> {
        let scorecard = ScorecardClient::new(&settings.sources, seed.clone())
            .map_err(|e| CareerGraphError::Config(e.to_string()))?;
        let bls = BlsClient::new(&settings.sources)
            .map_err(|e| CareerGraphError::Config(e.to_string()))?;
        let search = SearchClient::new(&settings.sources)
            .map_err(|e| CareerGraphError::Config(e.to_string()))?;

        let advisor: Arc<dyn Advisor> = match &llm {
            Some(provider) => Arc::new(LlmAdvisor::new(provider.clone(), seed.clone())),
            None => Arc::new(DeterministicAdvisor::new(seed.clone())),
        };

        Ok(Self {
            profiler: IntakeProfiler::new(llm.clone()),
            research: PathwayResearch::new(seed.clone(), Some(search), llm),
            costs: CostCalculator::new(seed.clone(), scorecard),
            salary: SalaryOutlook::new(seed.clone(), bls),
            advisor,
            seed,
        })
    }

    /// Generate a complete roadmap from validated quiz data.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), career = %quiz.career()))]
    pub async fn generate_roadmap(&self, quiz: &QuizInput) -> Result<Roadmap> {
        quiz.validate()?;

        info!("profiling student");
        let profile = self.profiler.profile(quiz).await;
        info!(category = %profile.category, flags = ?profile.flags, "profile ready");

        info!("researching pathways");
        let ResearchOutcome { pathway, ranked } = self.research.research(&profile).await;
        info!(
            feeder_programs = pathway.feeder_programs.len(),
            transfer_options = pathway.transfer_options.len(),
            "pathway research complete"
        );

        let mut candidates: Vec<CandidateCost> = Vec::new();
        for option in ranked.iter().take(MAX_CANDIDATES) {
            candidates.push(self.costs.candidate_cost(option).await);
        }

        let recommendation = self
            .advisor
            .propose(&AdvisorContext {
                profile: profile.clone(),
                candidates,
            })
            .await
            .map_err(|e| CareerGraphError::Synthesis(format!("{e:#}")))?;
        info!(
            advisor = self.advisor.advisor_name(),
            cheapest = %recommendation.cheapest.university,
            fastest = %recommendation.fastest.university,
            prestige = %recommendation.prestige.university,
            "path archetypes selected"
        );

        info!("estimating costs");
        let has_aa = profile.constraints.has_aa;
        let addons = self.costs.credential_addons(&pathway);

        let mut cheapest_bd = self
            .costs
            .bachelor_track(
                &recommendation.cheapest.university,
                self.residency_for(&recommendation.cheapest.university),
                has_aa,
            )
            .await;
        let fastest_base = self
            .costs
            .bachelor_track(
                &recommendation.fastest.university,
                self.residency_for(&recommendation.fastest.university),
                has_aa,
            )
            .await;
        let mut fastest_bd = self.costs.accelerated(&fastest_base);
        let mut prestige_bd = self
            .costs
            .bachelor_track(
                &recommendation.prestige.university,
                self.residency_for(&recommendation.prestige.university),
                has_aa,
            )
            .await;

        CostCalculator::apply_addons(&mut cheapest_bd, addons);
        CostCalculator::apply_addons(&mut fastest_bd, addons);
        CostCalculator::apply_addons(&mut prestige_bd, addons);
        info!(
            cheapest = cheapest_bd.total,
            prestige = prestige_bd.total,
            "cost estimation complete"
        );

        info!("analyzing salary outlook");
        let salary = self
            .salary
            .estimate(&profile.career, cheapest_bd.total, cheapest_bd.metadata.years)
            .await;
        info!(median = salary.median_salary, roi_years = salary.roi_years, "salary outlook ready");

        info!("synthesizing roadmap");
        let roadmap = self.synthesize(
            &profile,
            &pathway,
            &recommendation,
            cheapest_bd,
            fastest_bd,
            prestige_bd,
            &salary,
            &quiz.goals,
        );
        info!(
            nodes = roadmap.nodes.len(),
            edges = roadmap.edges.len(),
            "roadmap complete"
        );

        Ok(roadmap)
    }

    fn residency_for(&self, university: &str) -> Residency {
        match self.seed.institution(university) {
            Some(record) if record.in_region => Residency::InState,
            _ => Residency::OutOfState,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn synthesize(
        &self,
        profile: &Profile,
        pathway: &PathwayResult,
        recommendation: &Recommendation,
        cheapest_bd: CostBreakdown,
        fastest_bd: CostBreakdown,
        prestige_bd: CostBreakdown,
        salary: &SalaryResult,
        goals: &[Goal],
    ) -> Roadmap {
        let paths = PathSet {
            cheapest: self.build_path(
                PathId::Cheapest,
                "Most Affordable Path",
                &cheapest_bd,
                pathway,
                profile,
                &recommendation.cheapest,
                salary.roi_years,
                goals,
            ),
            fastest: self.build_path(
                PathId::Fastest,
                "Fastest Path",
                &fastest_bd,
                pathway,
                profile,
                &recommendation.fastest,
                salary.roi_years * FASTEST_ROI_FACTOR,
                goals,
            ),
            prestige: self.build_path(
                PathId::Prestige,
                "Prestige Path",
                &prestige_bd,
                pathway,
                profile,
                &recommendation.prestige,
                salary.roi_years * PRESTIGE_ROI_FACTOR,
                goals,
            ),
        };

        let (nodes, edges) = self.build_graph(pathway, &paths);

        Roadmap {
            nodes,
            edges,
            citations: pathway.citations.clone(),
            metadata: RoadmapMetadata {
                generated_at: Utc::now(),
                confidence: ROADMAP_CONFIDENCE,
                career: profile.career.clone(),
                category: profile.category.clone(),
                salary_outlook: SalaryOutlookSummary {
                    median_salary: salary.median_salary,
                    growth_rate: salary.growth_rate.clone(),
                    outlook: salary.outlook.clone(),
                },
            },
            paths,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_path(
        &self,
        id: PathId,
        name: &str,
        breakdown: &CostBreakdown,
        pathway: &PathwayResult,
        profile: &Profile,
        pick: &PathPick,
        roi_years: f64,
        goals: &[Goal],
    ) -> Path {
        let mut steps: Vec<Step> = Vec::new();
        let university = pick.university.as_str();

        if breakdown.feeder > 0.0 {
            let program = pathway.feeder_programs.first();
            push_step(
                &mut steps,
                StepKind::Program,
                self.seed.feeder.name.clone(),
                "2 years".to_string(),
                breakdown.feeder,
                program
                    .map(|p| format!("{} ({})", p.name, p.code))
                    .unwrap_or_else(|| "Associate degree".to_string()),
                program.map(|p| p.url.clone()),
            );
        }

        if goals.contains(&Goal::Internship) {
            push_step(
                &mut steps,
                StepKind::Internship,
                university.to_string(),
                "1 summer".to_string(),
                0.0,
                format!("Industry internship in {}", profile.career),
                None,
            );
        }
        if goals.contains(&Goal::Research) {
            push_step(
                &mut steps,
                StepKind::Research,
                university.to_string(),
                "1 semester".to_string(),
                0.0,
                format!("Undergraduate research in {}", profile.career),
                None,
            );
        }

        let matched_option = self.matching_option(pathway, university);
        let university_cost = breakdown.university
            + breakdown.housing
            + breakdown.food
            + breakdown.transport
            + breakdown.books
            + breakdown.fees;
        push_step(
            &mut steps,
            StepKind::Program,
            university.to_string(),
            "2 years".to_string(),
            university_cost,
            matched_option
                .map(|o| o.program.clone())
                .unwrap_or_else(|| format!("BS {}", profile.career)),
            matched_option.and_then(|o| {
                if o.url.is_empty() {
                    None
                } else {
                    Some(o.url.clone())
                }
            }),
        );

        for cert in pathway.certifications.iter().filter(|c| c.required) {
            push_step(
                &mut steps,
                StepKind::Certification,
                "Professional Board".to_string(),
                cert.timing.clone(),
                crate::costs::CERTIFICATION_EXAM_FEE,
                cert.name.clone(),
                cert.url.clone(),
            );
        }
        for license in pathway.licenses.iter().filter(|l| l.required) {
            push_step(
                &mut steps,
                StepKind::License,
                format!("{} Board", license.state),
                license.timing.clone(),
                crate::costs::LICENSE_FEE,
                license.name.clone(),
                license.url.clone(),
            );
        }

        let tuition_per_year = breakdown.university / UNIVERSITY_YEARS;
        let yearly_living =
            (breakdown.housing + breakdown.food + breakdown.transport) / UNIVERSITY_YEARS;
        let accelerated = breakdown.metadata.accelerated;

        if goals.contains(&Goal::Masters) {
            let addon = self
                .costs
                .master_addon(tuition_per_year, yearly_living, accelerated);
            push_step(
                &mut steps,
                StepKind::Masters,
                university.to_string(),
                format_years(addon.years),
                addon.cost,
                format!("Master's degree, {}", university),
                None,
            );
        }
        if goals.contains(&Goal::Doctorate) {
            let addon = self.costs.doctorate_addon(yearly_living, accelerated);
            push_step(
                &mut steps,
                StepKind::Doctorate,
                university.to_string(),
                format_years(addon.years),
                addon.cost,
                format!("Doctoral research, {}", university),
                None,
            );
        }

        let step_sum: f64 = steps.iter().map(|s| s.cost).sum();
        let total_cost = if step_sum > breakdown.total * (1.0 + RECONCILE_TOLERANCE) {
            step_sum
        } else {
            breakdown.total
        };

        let years: f64 = steps.iter().map(|s| parse_years(&s.duration)).sum();
        let duration = if years > 0.0 {
            format_years(years)
        } else {
            DEFAULT_DURATION_LABEL.to_string()
        };

        Path {
            id,
            name: name.to_string(),
            total_cost,
            duration,
            steps,
            roi_years,
        }
    }

    fn matching_option<'a>(
        &self,
        pathway: &'a PathwayResult,
        university: &str,
    ) -> Option<&'a careergraph_core::TransferOption> {
        let key = PathwaySelector::normalize_name(university);
        pathway
            .transfer_options
            .iter()
            .find(|o| PathwaySelector::normalize_name(&o.university) == key)
    }

    /// Mirror the step chains as a node/edge structure with layout
    /// coordinates for visualization.
    fn build_graph(
        &self,
        pathway: &PathwayResult,
        paths: &PathSet,
    ) -> (Vec<RoadmapNode>, Vec<RoadmapEdge>) {
        let mut nodes: Vec<RoadmapNode> = Vec::new();
        let mut edges: Vec<RoadmapEdge> = Vec::new();
        let mut y = 0.0;

        let feeder_step = paths
            .cheapest
            .steps
            .iter()
            .find(|s| s.kind == StepKind::Program && s.institution == self.seed.feeder.name);
        let feeder_node_id = feeder_step.map(|step| {
            let id = format!("node-{}", nodes.len());
            nodes.push(RoadmapNode {
                id: id.clone(),
                kind: NodeKind::Feeder,
                label: format!("{}: {}", step.institution, step.description),
                cost: step.cost,
                duration: step.duration.clone(),
                url: step.url.clone(),
                position: Position { x: 250.0, y },
            });
            y += 150.0;
            id
        });
        if feeder_node_id.is_none() {
            y += 150.0;
        }

        let mut university_node_ids: Vec<String> = Vec::new();
        for (i, path) in paths.iter().enumerate() {
            let Some(step) = path
                .steps
                .iter()
                .find(|s| s.kind == StepKind::Program && s.institution != self.seed.feeder.name)
            else {
                continue;
            };
            let node_id = format!("node-{}", nodes.len());
            nodes.push(RoadmapNode {
                id: node_id.clone(),
                kind: NodeKind::University,
                label: format!("{}: {}", step.institution, step.description),
                cost: step.cost,
                duration: step.duration.clone(),
                url: step.url.clone(),
                position: Position {
                    x: 250.0 + i as f64 * 300.0,
                    y,
                },
            });

            if let Some(feeder_id) = &feeder_node_id {
                let label = self
                    .matching_option(pathway, &step.institution)
                    .map(|o| o.articulation.clone())
                    .unwrap_or_else(|| "Transfer Agreement".to_string());
                edges.push(RoadmapEdge {
                    id: format!("edge-{}", edges.len()),
                    source: feeder_id.clone(),
                    target: node_id.clone(),
                    label: Some(label),
                });
            }
            university_node_ids.push(node_id);
        }
        y += 150.0;

        let first_university = university_node_ids.first().cloned();

        for cert in pathway.certifications.iter().filter(|c| c.required) {
            let node_id = format!("node-{}", nodes.len());
            nodes.push(RoadmapNode {
                id: node_id.clone(),
                kind: NodeKind::Certification,
                label: cert.name.clone(),
                cost: crate::costs::CERTIFICATION_EXAM_FEE,
                duration: cert.timing.clone(),
                url: cert.url.clone(),
                position: Position { x: 250.0, y },
            });
            if let Some(source) = &first_university {
                edges.push(RoadmapEdge {
                    id: format!("edge-{}", edges.len()),
                    source: source.clone(),
                    target: node_id,
                    label: Some("Professional Certification".to_string()),
                });
            }
            y += 100.0;
        }

        for license in pathway.licenses.iter().filter(|l| l.required) {
            let node_id = format!("node-{}", nodes.len());
            nodes.push(RoadmapNode {
                id: node_id.clone(),
                kind: NodeKind::License,
                label: format!("{} ({})", license.name, license.state),
                cost: crate::costs::LICENSE_FEE,
                duration: license.timing.clone(),
                url: license.url.clone(),
                position: Position { x: 250.0, y },
            });
            if let Some(source) = &first_university {
                edges.push(RoadmapEdge {
                    id: format!("edge-{}", edges.len()),
                    source: source.clone(),
                    target: node_id,
                    label: Some("State Licensure".to_string()),
                });
            }
            y += 100.0;
        }

        let masters_node_id = paths
            .cheapest
            .steps
            .iter()
            .find(|s| s.kind == StepKind::Masters)
            .map(|step| {
                let node_id = format!("node-{}", nodes.len());
                nodes.push(RoadmapNode {
                    id: node_id.clone(),
                    kind: NodeKind::Masters,
                    label: step.description.clone(),
                    cost: step.cost,
                    duration: step.duration.clone(),
                    url: None,
                    position: Position { x: 550.0, y },
                });
                if let Some(source) = &first_university {
                    edges.push(RoadmapEdge {
                        id: format!("edge-{}", edges.len()),
                        source: source.clone(),
                        target: node_id.clone(),
                        label: Some("Graduate School".to_string()),
                    });
                }
                y += 100.0;
                node_id
            });

        if let Some(step) = paths
            .cheapest
            .steps
            .iter()
            .find(|s| s.kind == StepKind::Doctorate)
        {
            let node_id = format!("node-{}", nodes.len());
            nodes.push(RoadmapNode {
                id: node_id.clone(),
                kind: NodeKind::Doctorate,
                label: step.description.clone(),
                cost: step.cost,
                duration: step.duration.clone(),
                url: None,
                position: Position { x: 550.0, y },
            });
            let source = masters_node_id.or(first_university);
            if let Some(source) = source {
                edges.push(RoadmapEdge {
                    id: format!("edge-{}", edges.len()),
                    source,
                    target: node_id,
                    label: Some("Doctoral Research".to_string()),
                });
            }
        }

        (nodes, edges)
    }
}

fn push_step(
    steps: &mut Vec<Step>,
    kind: StepKind,
    institution: String,
    duration: String,
    cost: f64,
    description: String,
    url: Option<String>,
) {
    let prerequisites = steps
        .last()
        .map(|prev| vec![prev.id.clone()])
        .unwrap_or_default();
    steps.push(Step {
        id: format!("step-{}", steps.len()),
        kind,
        institution,
        duration,
        cost,
        prerequisites,
        description,
        url,
    });
}

/// Parse a year count out of a duration label ("2 years" -> 2.0). Labels
/// without a year unit contribute nothing.
fn parse_years(duration: &str) -> f64 {
    let lower = duration.to_lowercase();
    if !lower.contains("year") {
        return 0.0;
    }
    lower
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .unwrap_or(0.0)
}

fn format_years(years: f64) -> String {
    if (years - years.round()).abs() < 1e-9 {
        let whole = years.round() as i64;
        if whole == 1 {
            "1 year".to_string()
        } else {
            format!("{} years", whole)
        }
    } else {
        format!("{:.1} years", years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_years() {
        assert_eq!(parse_years("2 years"), 2.0);
        assert_eq!(parse_years("1 year"), 1.0);
        assert_eq!(parse_years("4.5 years"), 4.5);
        assert_eq!(parse_years("1 summer"), 0.0);
        assert_eq!(parse_years("After graduation"), 0.0);
    }

    #[test]
    fn test_format_years() {
        assert_eq!(format_years(2.0), "2 years");
        assert_eq!(format_years(1.0), "1 year");
        assert_eq!(format_years(1.7), "1.7 years");
        assert_eq!(format_years(4.5), "4.5 years");
    }

    #[test]
    fn test_push_step_builds_linear_chain() {
        let mut steps = Vec::new();
        push_step(
            &mut steps,
            StepKind::Program,
            "Miami Dade College".to_string(),
            "2 years".to_string(),
            6_800.0,
            "Engineering AS".to_string(),
            None,
        );
        push_step(
            &mut steps,
            StepKind::Program,
            "Florida International University".to_string(),
            "2 years".to_string(),
            13_130.0,
            "BS Mechanical Engineering".to_string(),
            None,
        );
        push_step(
            &mut steps,
            StepKind::License,
            "Florida Board".to_string(),
            "After graduation".to_string(),
            300.0,
            "PE License".to_string(),
            None,
        );

        assert!(steps[0].prerequisites.is_empty());
        assert_eq!(steps[1].prerequisites, vec!["step-0".to_string()]);
        assert_eq!(steps[2].prerequisites, vec!["step-1".to_string()]);
    }
}
