pub mod costs;
pub mod orchestrator;
pub mod profiler;
pub mod research;
pub mod salary;
pub mod selector;
pub mod sources;

pub use costs::{CostCalculator, DegreeAddon, ResolvedTuition, TuitionSource};
pub use orchestrator::Orchestrator;
pub use profiler::IntakeProfiler;
pub use research::{PathwayResearch, ResearchOutcome};
pub use salary::{calculate_roi, SalaryOutlook};
pub use selector::{PathwaySelector, RankedOption, DEFAULT_TOP_K};
pub use sources::{BlsClient, CollegeCosts, ScorecardClient, SearchClient, SearchResult};
