use std::sync::Arc;

use tracing::{debug, warn};

use careergraph_core::{CostBreakdown, CostMetadata, PathwayResult, Residency, SeedData};

use crate::selector::RankedOption;
use crate::sources::scorecard::{ScorecardClient, TUITION_FLOOR};

use careergraph_ai::CandidateCost;

pub const FEEDER_YEARS: f64 = 2.0;
pub const UNIVERSITY_YEARS: f64 = 2.0;
pub const BOOKS_PER_YEAR: f64 = 1_200.0;
pub const BACHELOR_FEE_RATE: f64 = 0.12;

pub const MASTER_YEARS: f64 = 2.0;
pub const MASTER_TUITION_PREMIUM: f64 = 1.2;
pub const MASTER_FEE_RATE: f64 = 0.10;
pub const MASTER_BOOKS_FLAT: f64 = 1_200.0;

pub const DOCTORATE_YEARS: f64 = 5.0;
pub const DOCTORATE_LIVING_FRACTION: f64 = 0.3;
pub const RESEARCH_MATERIALS_COST: f64 = 3_000.0;
pub const CONFERENCE_TRAVEL_COST: f64 = 1_500.0;

pub const ACCELERATED_PREMIUM: f64 = 0.15;
pub const ACCELERATED_MASTER_FACTOR: f64 = 0.85;
pub const ACCELERATED_DOCTORATE_FACTOR: f64 = 0.9;

pub const CERTIFICATION_EXAM_FEE: f64 = 200.0;
pub const LICENSE_FEE: f64 = 300.0;

/// Generic tuition used when every lookup tier misses.
pub const GENERIC_IN_STATE_TUITION: f64 = 8_000.0;
pub const GENERIC_OUT_OF_STATE_TUITION: f64 = 20_000.0;

/// Which tier of the lookup chain produced a tuition figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuitionSource {
    RankingTable,
    CostApi,
    SeedFallback,
    CategoryDefault,
}

#[derive(Debug, Clone)]
pub struct ResolvedTuition {
    pub per_year: f64,
    pub source: TuitionSource,
    pub city: Option<String>,
}

/// Cost of an optional graduate degree stage.
#[derive(Debug, Clone, Copy)]
pub struct DegreeAddon {
    pub cost: f64,
    pub years: f64,
}

/// Computes cost breakdowns for bachelor-track, master, and doctorate
/// stages. Tuition resolution is an ordered chain of lookup strategies,
/// each consulted only when the previous one produced nothing usable.
pub struct CostCalculator {
    seed: Arc<SeedData>,
    scorecard: ScorecardClient,
}

impl CostCalculator {
    pub fn new(seed: Arc<SeedData>, scorecard: ScorecardClient) -> Self {
        Self { seed, scorecard }
    }

    /// Resolve per-year tuition: ranking table, then the live cost API,
    /// then the seed fallback with its floor, then the generic constant.
    pub async fn resolve_tuition(&self, institution: &str, residency: Residency) -> ResolvedTuition {
        let in_state = residency == Residency::InState;

        if let Some(record) = self.seed.institution(institution) {
            let per_year = record.tuition(in_state);
            if per_year > 0.0 {
                return ResolvedTuition {
                    per_year,
                    source: TuitionSource::RankingTable,
                    city: Some(record.city.clone()),
                };
            }
        }

        match self.scorecard.fetch_costs(institution).await {
            Ok(Some(costs)) => {
                let per_year = if in_state {
                    costs.in_state_tuition
                } else {
                    costs.out_of_state_tuition
                };
                if per_year > 0.0 {
                    return ResolvedTuition {
                        per_year,
                        source: TuitionSource::CostApi,
                        city: costs.city,
                    };
                }
            }
            Ok(None) => {}
            Err(e) => warn!("cost API lookup failed for '{}': {e:#}", institution),
        }

        if let Some(costs) = self.scorecard.fallback_costs(institution) {
            let per_year = if in_state {
                costs.in_state_tuition
            } else {
                costs.out_of_state_tuition
            };
            if per_year >= TUITION_FLOOR {
                return ResolvedTuition {
                    per_year,
                    source: TuitionSource::SeedFallback,
                    city: costs.city,
                };
            }
        }

        debug!("using generic tuition for unresolvable institution '{}'", institution);
        ResolvedTuition {
            per_year: if in_state {
                GENERIC_IN_STATE_TUITION
            } else {
                GENERIC_OUT_OF_STATE_TUITION
            },
            source: TuitionSource::CategoryDefault,
            city: None,
        }
    }

    /// Full bachelor-track breakdown: feeder years, university years with
    /// living costs, books, and fees.
    pub async fn bachelor_track(
        &self,
        institution: &str,
        residency: Residency,
        has_associate: bool,
    ) -> CostBreakdown {
        let resolved = self.resolve_tuition(institution, residency).await;
        let city = resolved.city.clone().unwrap_or_default();
        let (housing_record, housing_estimated) = self.seed.housing(&city);
        if housing_estimated {
            warn!(
                "no housing data for '{}'; defaulting to {} costs",
                city, housing_record.city
            );
        }

        let feeder_years = if has_associate { 0.0 } else { FEEDER_YEARS };
        let feeder_rate = match residency {
            Residency::InState => self.seed.feeder.in_state_per_year,
            Residency::OutOfState => self.seed.feeder.out_of_state_per_year,
        };
        let feeder = feeder_rate * feeder_years;

        let university = resolved.per_year * UNIVERSITY_YEARS;
        let housing = housing_record.shared_rent_monthly * 12.0 * UNIVERSITY_YEARS;
        let food = housing_record.food_monthly * 12.0 * UNIVERSITY_YEARS;
        let transport = housing_record.transport_monthly * 12.0 * UNIVERSITY_YEARS;
        let books = BOOKS_PER_YEAR * (feeder_years + UNIVERSITY_YEARS);
        let fees = BACHELOR_FEE_RATE * (feeder + university);

        let total = feeder + university + housing + food + transport + books + fees;

        CostBreakdown {
            feeder,
            university,
            housing,
            food,
            transport,
            books,
            fees,
            addons: 0.0,
            total,
            metadata: CostMetadata {
                institution: self.seed.canonical_name(institution),
                city: housing_record.city.clone(),
                years: feeder_years + UNIVERSITY_YEARS,
                residency,
                housing_estimated,
                accelerated: false,
            },
        }
    }

    /// Accelerated variant of a breakdown: a flat premium on the total,
    /// modeling paid summer terms to finish sooner.
    pub fn accelerated(&self, base: &CostBreakdown) -> CostBreakdown {
        let mut fast = base.clone();
        fast.total = base.total * (1.0 + ACCELERATED_PREMIUM);
        fast.metadata.accelerated = true;
        fast
    }

    /// Master's degree stage on top of a bachelor track at the same
    /// institution. Graduate tuition carries a premium over undergraduate.
    pub fn master_addon(
        &self,
        undergrad_tuition_per_year: f64,
        yearly_living: f64,
        accelerated: bool,
    ) -> DegreeAddon {
        let years = if accelerated {
            MASTER_YEARS * ACCELERATED_MASTER_FACTOR
        } else {
            MASTER_YEARS
        };
        let tuition = undergrad_tuition_per_year * MASTER_TUITION_PREMIUM * years;
        let cost = tuition + yearly_living * years + MASTER_BOOKS_FLAT + MASTER_FEE_RATE * tuition;
        DegreeAddon { cost, years }
    }

    /// Doctorate stage, assumed funded: no tuition, a fraction of living
    /// costs out of pocket, plus research materials and conference travel.
    pub fn doctorate_addon(&self, yearly_living: f64, accelerated: bool) -> DegreeAddon {
        let years = if accelerated {
            DOCTORATE_YEARS * ACCELERATED_DOCTORATE_FACTOR
        } else {
            DOCTORATE_YEARS
        };
        let cost = yearly_living * DOCTORATE_LIVING_FRACTION * years
            + RESEARCH_MATERIALS_COST
            + CONFERENCE_TRAVEL_COST;
        DegreeAddon { cost, years }
    }

    /// Flat per-item fees for every required certification and license.
    pub fn credential_addons(&self, pathway: &PathwayResult) -> f64 {
        let certs = pathway.certifications.iter().filter(|c| c.required).count() as f64;
        let licenses = pathway.licenses.iter().filter(|l| l.required).count() as f64;
        certs * CERTIFICATION_EXAM_FEE + licenses * LICENSE_FEE
    }

    /// Add credential fees into a breakdown, keeping the total invariant.
    pub fn apply_addons(breakdown: &mut CostBreakdown, addons: f64) {
        breakdown.addons += addons;
        breakdown.total += addons;
    }

    /// Resolve the cost components the advisor sees for one ranked
    /// candidate.
    pub async fn candidate_cost(&self, ranked: &RankedOption) -> CandidateCost {
        let residency = if ranked.in_region {
            Residency::InState
        } else {
            Residency::OutOfState
        };
        let resolved = self
            .resolve_tuition(&ranked.option.university, residency)
            .await;
        let city = resolved.city.clone().unwrap_or_default();
        let (housing_record, _) = self.seed.housing(&city);
        let yearly_living = housing_record.yearly_living();

        CandidateCost {
            university: ranked.option.university.clone(),
            tier: ranked.tier,
            score: ranked.score,
            in_region: ranked.in_region,
            tuition_per_year: resolved.per_year,
            yearly_living,
            estimated_total: (resolved.per_year + yearly_living) * UNIVERSITY_YEARS,
            duration_years: FEEDER_YEARS + UNIVERSITY_YEARS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careergraph_core::SourcesConfig;

    fn calculator() -> CostCalculator {
        let seed = Arc::new(SeedData::default());
        let scorecard = ScorecardClient::new(&SourcesConfig::default(), seed.clone()).unwrap();
        CostCalculator::new(seed, scorecard)
    }

    #[tokio::test]
    async fn test_ranking_table_tier_wins() {
        let calc = calculator();
        let resolved = calc
            .resolve_tuition("Florida International University", Residency::InState)
            .await;
        assert_eq!(resolved.source, TuitionSource::RankingTable);
        assert_eq!(resolved.per_year, 6_565.0);
    }

    #[tokio::test]
    async fn test_generic_tier_for_unknown_institution() {
        let calc = calculator();
        let resolved = calc
            .resolve_tuition("Wildcat Technical Academy", Residency::OutOfState)
            .await;
        assert_eq!(resolved.source, TuitionSource::CategoryDefault);
        assert_eq!(resolved.per_year, GENERIC_OUT_OF_STATE_TUITION);
    }

    #[tokio::test]
    async fn test_bachelor_track_invariants() {
        let calc = calculator();
        let breakdown = calc
            .bachelor_track("Florida International University", Residency::InState, false)
            .await;

        assert!(breakdown.total > 0.0);
        assert!(breakdown.total >= breakdown.components_sum() - 1e-6);
        assert_eq!(breakdown.feeder, 3_400.0 * FEEDER_YEARS);
        assert_eq!(breakdown.university, 6_565.0 * UNIVERSITY_YEARS);
        assert_eq!(breakdown.books, BOOKS_PER_YEAR * 4.0);
        assert!(
            (breakdown.fees
                - BACHELOR_FEE_RATE * (breakdown.feeder + breakdown.university))
                .abs()
                < 1e-6
        );
        assert!(!breakdown.metadata.housing_estimated);
        assert_eq!(breakdown.metadata.city, "Miami");
    }

    #[tokio::test]
    async fn test_associate_holders_skip_feeder() {
        let calc = calculator();
        let breakdown = calc
            .bachelor_track("Florida International University", Residency::InState, true)
            .await;
        assert_eq!(breakdown.feeder, 0.0);
        assert_eq!(breakdown.metadata.years, UNIVERSITY_YEARS);
        assert_eq!(breakdown.books, BOOKS_PER_YEAR * UNIVERSITY_YEARS);
    }

    #[tokio::test]
    async fn test_accelerated_is_never_cheaper() {
        let calc = calculator();
        let base = calc
            .bachelor_track("University of Florida", Residency::InState, false)
            .await;
        let fast = calc.accelerated(&base);
        assert!(fast.total >= base.total);
        assert!((fast.total - base.total * 1.15).abs() < 1e-6);
        assert!(fast.total >= fast.components_sum() - 1e-6);
        assert!(fast.metadata.accelerated);
    }

    #[tokio::test]
    async fn test_unknown_city_flags_housing_estimate() {
        let calc = calculator();
        let breakdown = calc
            .bachelor_track("Wildcat Technical Academy", Residency::InState, false)
            .await;
        assert!(breakdown.metadata.housing_estimated);
        assert!(breakdown.total > 0.0);
    }

    #[test]
    fn test_master_addon_premium_and_acceleration() {
        let calc = calculator();
        let base = calc.master_addon(10_000.0, 15_000.0, false);
        let tuition = 10_000.0 * MASTER_TUITION_PREMIUM * MASTER_YEARS;
        let expected = tuition + 15_000.0 * MASTER_YEARS + MASTER_BOOKS_FLAT + 0.10 * tuition;
        assert!((base.cost - expected).abs() < 1e-6);
        assert_eq!(base.years, MASTER_YEARS);

        let fast = calc.master_addon(10_000.0, 15_000.0, true);
        assert!((fast.years - MASTER_YEARS * ACCELERATED_MASTER_FACTOR).abs() < 1e-9);
        assert!(fast.cost < base.cost);
    }

    #[test]
    fn test_doctorate_addon_is_funded() {
        let calc = calculator();
        let addon = calc.doctorate_addon(18_000.0, false);
        let expected = 18_000.0 * DOCTORATE_LIVING_FRACTION * DOCTORATE_YEARS
            + RESEARCH_MATERIALS_COST
            + CONFERENCE_TRAVEL_COST;
        assert!((addon.cost - expected).abs() < 1e-6);

        let fast = calc.doctorate_addon(18_000.0, true);
        assert!((fast.years - DOCTORATE_YEARS * ACCELERATED_DOCTORATE_FACTOR).abs() < 1e-9);
    }

    #[test]
    fn test_credential_addons_count_required_only() {
        use careergraph_core::{Certification, License};
        let calc = calculator();
        let pathway = PathwayResult {
            feeder_programs: vec![],
            transfer_options: vec![],
            certifications: vec![
                Certification {
                    name: "FE Exam".to_string(),
                    required: true,
                    timing: String::new(),
                    url: None,
                },
                Certification {
                    name: "Optional Cert".to_string(),
                    required: false,
                    timing: String::new(),
                    url: None,
                },
            ],
            licenses: vec![License {
                name: "PE License".to_string(),
                required: true,
                timing: String::new(),
                state: "Florida".to_string(),
                url: None,
            }],
            citations: vec![],
        };
        assert_eq!(
            calc.credential_addons(&pathway),
            CERTIFICATION_EXAM_FEE + LICENSE_FEE
        );
    }
}
