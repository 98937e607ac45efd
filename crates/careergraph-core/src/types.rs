use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::quiz::{BudgetTier, LocationPreference, TimelinePreference};

/// Structured student profile produced by the intake stage. Immutable once
/// created; every later stage only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub career: String,
    pub category: String,
    pub constraints: Constraints,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraints {
    pub budget: BudgetTier,
    pub timeline: TimelinePreference,
    pub gpa: f64,
    #[serde(rename = "hasAA")]
    pub has_aa: bool,
    pub location: LocationPreference,
}

/// Academic program at the feeder institution (community college).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeederProgram {
    pub code: String,
    pub name: String,
    pub credits: u32,
    pub url: String,
}

/// University transfer option with its articulation agreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOption {
    pub university: String,
    pub program: String,
    pub articulation: String,
    pub url: String,
    #[serde(default)]
    pub abet_accredited: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub required: bool,
    pub timing: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    pub required: bool,
    pub timing: String,
    pub state: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub title: String,
    pub url: String,
    pub accessed_at: DateTime<Utc>,
}

/// Output of the pathway research stage. Transfer options are ordered by
/// ranking score and deduplicated by normalized university name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathwayResult {
    pub feeder_programs: Vec<FeederProgram>,
    pub transfer_options: Vec<TransferOption>,
    pub certifications: Vec<Certification>,
    pub licenses: Vec<License>,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Residency {
    InState,
    OutOfState,
}

impl fmt::Display for Residency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Residency::InState => "in-state",
            Residency::OutOfState => "out-of-state",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostMetadata {
    pub institution: String,
    pub city: String,
    pub years: f64,
    pub residency: Residency,
    /// Set when housing costs came from the baseline metro instead of the
    /// institution's own city.
    #[serde(default)]
    pub housing_estimated: bool,
    #[serde(default)]
    pub accelerated: bool,
}

/// Itemized education cost for one path. Invariant: `total` is never below
/// the sum of the listed components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub feeder: f64,
    pub university: f64,
    pub housing: f64,
    pub food: f64,
    pub transport: f64,
    pub books: f64,
    pub fees: f64,
    pub addons: f64,
    pub total: f64,
    pub metadata: CostMetadata,
}

impl CostBreakdown {
    pub fn components_sum(&self) -> f64 {
        self.feeder
            + self.university
            + self.housing
            + self.food
            + self.transport
            + self.books
            + self.fees
            + self.addons
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryResult {
    pub occupation: String,
    pub soc_code: String,
    pub median_salary: f64,
    pub regional_salary: f64,
    pub growth_rate: String,
    pub outlook: String,
    pub roi_years: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Program,
    Certification,
    License,
    Internship,
    Research,
    Masters,
    #[serde(rename = "phd")]
    Doctorate,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepKind::Program => "program",
            StepKind::Certification => "certification",
            StepKind::License => "license",
            StepKind::Internship => "internship",
            StepKind::Research => "research",
            StepKind::Masters => "masters",
            StepKind::Doctorate => "phd",
        };
        write!(f, "{}", s)
    }
}

/// One stage of a path. Steps form a linear chain: the first step has no
/// prerequisite and every later step names exactly the preceding step's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub kind: StepKind,
    pub institution: String,
    pub duration: String,
    pub cost: f64,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathId {
    Cheapest,
    Fastest,
    Prestige,
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PathId::Cheapest => "cheapest",
            PathId::Fastest => "fastest",
            PathId::Prestige => "prestige",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    pub id: PathId,
    pub name: String,
    pub total_cost: f64,
    pub duration: String,
    pub steps: Vec<Step>,
    pub roi_years: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Feeder,
    University,
    Certification,
    License,
    Internship,
    Research,
    Masters,
    #[serde(rename = "phd")]
    Doctorate,
}

/// Layout coordinates for visualization only; not semantically meaningful.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub cost: f64,
    pub duration: String,
    #[serde(default)]
    pub url: Option<String>,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSet {
    pub cheapest: Path,
    pub fastest: Path,
    pub prestige: Path,
}

impl PathSet {
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [&self.cheapest, &self.fastest, &self.prestige].into_iter()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryOutlookSummary {
    pub median_salary: f64,
    pub growth_rate: String,
    pub outlook: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapMetadata {
    pub generated_at: DateTime<Utc>,
    pub confidence: f64,
    pub career: String,
    pub category: String,
    pub salary_outlook: SalaryOutlookSummary,
}

/// Complete roadmap returned to the caller. Built fresh per request and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roadmap {
    pub paths: PathSet,
    pub nodes: Vec<RoadmapNode>,
    pub edges: Vec<RoadmapEdge>,
    pub citations: Vec<Citation>,
    pub metadata: RoadmapMetadata,
}
