use std::sync::Arc;

use tracing::{debug, warn};

use careergraph_core::{SalaryResult, SeedData};

use crate::sources::BlsClient;

/// Effective tax rate applied to gross salary.
pub const TAX_RATE: f64 = 0.25;
/// Wage forgone per year spent in school instead of working.
pub const FORGONE_WAGE_PER_YEAR: f64 = 25_000.0;
/// Regional salaries run below the national median.
pub const REGIONAL_DISCOUNT: f64 = 0.90;

/// Years of net post-graduation earnings needed to recover education cost
/// plus the opportunity cost of the years spent in school. Infinite when
/// net salary is non-positive.
pub fn calculate_roi(median_salary: f64, education_cost: f64, years_in_school: f64) -> f64 {
    let net_salary = median_salary * (1.0 - TAX_RATE);
    if net_salary <= 0.0 {
        return f64::INFINITY;
    }
    let opportunity_cost = FORGONE_WAGE_PER_YEAR * years_in_school;
    (education_cost + opportunity_cost) / net_salary
}

/// Maps an occupation to a compensation estimate and an ROI figure. The
/// live wage source is consulted once; anything else comes verbatim from
/// the static tables.
pub struct SalaryOutlook {
    seed: Arc<SeedData>,
    bls: BlsClient,
}

impl SalaryOutlook {
    pub fn new(seed: Arc<SeedData>, bls: BlsClient) -> Self {
        Self { seed, bls }
    }

    pub async fn estimate(
        &self,
        career: &str,
        education_cost: f64,
        years_in_school: f64,
    ) -> SalaryResult {
        let Some(record) = self.seed.occupation(career) else {
            debug!("no occupation record for '{}'; using category defaults", career);
            let band = self.seed.category_salary_default(career);
            return SalaryResult {
                occupation: career.to_string(),
                soc_code: "unknown".to_string(),
                median_salary: band.median,
                regional_salary: band.regional,
                growth_rate: band.growth_rate.to_string(),
                outlook: band.outlook.to_string(),
                roi_years: calculate_roi(band.median, education_cost, years_in_school),
            };
        };

        let (median_salary, regional_salary) =
            match self.bls.fetch_median_annual(&record.soc_code).await {
                Ok(Some(live_median)) => (live_median, live_median * REGIONAL_DISCOUNT),
                Ok(None) => (record.median_salary, record.regional_salary),
                Err(e) => {
                    warn!("wage lookup failed for {}: {e:#}", record.soc_code);
                    (record.median_salary, record.regional_salary)
                }
            };

        SalaryResult {
            occupation: career.to_string(),
            soc_code: record.soc_code.clone(),
            median_salary,
            regional_salary,
            growth_rate: record.growth_rate.clone(),
            outlook: record.outlook.clone(),
            roi_years: calculate_roi(median_salary, education_cost, years_in_school),
        }
    }
}
