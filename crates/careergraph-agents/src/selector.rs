use std::sync::Arc;

use careergraph_core::{
    Certification, FeederProgram, License, LocationPreference, PathwayResult, SeedData,
    TransferOption,
};

/// How many in-region options each location policy keeps.
pub const DEFAULT_TOP_K: usize = 4;

/// Words ignored when comparing institution names.
const COMMON_WORDS: &[&str] = &["UNIVERSITY", "COLLEGE", "INSTITUTE", "THE", "OF", "AND"];

/// A transfer option tagged with its ranking-table attributes.
#[derive(Debug, Clone)]
pub struct RankedOption {
    pub option: TransferOption,
    pub score: i64,
    pub tier: u8,
    pub in_region: bool,
    pub metro: bool,
}

/// Filters and ranks candidate institutions by location preference and
/// ranking score, deduplicating by normalized institution name.
pub struct PathwaySelector {
    seed: Arc<SeedData>,
    top_k: usize,
}

impl PathwaySelector {
    pub fn new(seed: Arc<SeedData>) -> Self {
        Self {
            seed,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Normalize an institution name for deduplication: strip parenthetical
    /// text, drop punctuation and common words, collapse whitespace,
    /// uppercase.
    pub fn normalize_name(name: &str) -> String {
        let mut stripped = String::with_capacity(name.len());
        let mut depth = 0usize;
        for c in name.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ if depth == 0 => stripped.push(c),
                _ => {}
            }
        }

        stripped
            .to_uppercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect::<String>()
            .split_whitespace()
            .filter(|word| !COMMON_WORDS.contains(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn tag(&self, option: TransferOption) -> RankedOption {
        match self.seed.institution(&option.university) {
            Some(record) => RankedOption {
                score: record.ranking_score(),
                tier: record.tier,
                in_region: record.in_region,
                metro: record.metro,
                option,
            },
            None => RankedOption {
                score: 0,
                tier: 4,
                in_region: false,
                metro: false,
                option,
            },
        }
    }

    fn dedup(candidates: Vec<RankedOption>) -> Vec<RankedOption> {
        let mut seen: Vec<String> = Vec::with_capacity(candidates.len());
        let mut kept = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let key = Self::normalize_name(&candidate.option.university);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            kept.push(candidate);
        }
        kept
    }

    fn sort_by_score(options: &mut [RankedOption]) {
        options.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.option.university.cmp(&b.option.university))
        });
    }

    /// Apply dedup and the location policy, returning candidates ordered by
    /// ranking score (ties broken by name).
    pub fn select(
        &self,
        candidates: Vec<TransferOption>,
        location: LocationPreference,
    ) -> Vec<RankedOption> {
        let tagged: Vec<RankedOption> = candidates.into_iter().map(|c| self.tag(c)).collect();
        let deduped = Self::dedup(tagged);

        let (mut in_region, mut out_of_region): (Vec<_>, Vec<_>) =
            deduped.into_iter().partition(|c| c.in_region);
        Self::sort_by_score(&mut in_region);
        Self::sort_by_score(&mut out_of_region);

        let mut selected = match location {
            LocationPreference::Anywhere => {
                let mut picked = out_of_region;
                picked.extend(in_region.into_iter().take(self.top_k));
                picked
            }
            LocationPreference::InRegion => {
                in_region.into_iter().take(self.top_k).collect()
            }
            LocationPreference::Local => {
                let (metro, rest): (Vec<_>, Vec<_>) =
                    in_region.into_iter().partition(|c| c.metro);
                let mut picked: Vec<RankedOption> =
                    metro.into_iter().take(self.top_k).collect();
                let remaining = self.top_k.saturating_sub(picked.len());
                picked.extend(rest.into_iter().take(remaining));
                picked
            }
        };

        Self::sort_by_score(&mut selected);
        selected
    }

    /// Synthesize transfer-option candidates from the ranking table for an
    /// occupation with no seeded pathway.
    pub fn candidates_from_rankings(&self, career: &str) -> Vec<TransferOption> {
        self.seed
            .institutions()
            .iter()
            .map(|record| TransferOption {
                university: record.name.clone(),
                program: format!("BS {}", career),
                articulation: "Transfer Agreement".to_string(),
                url: String::new(),
                abet_accredited: None,
            })
            .collect()
    }

    /// Category-consistent default pathway for occupations with no seed
    /// match: engineering gets an accreditation-gated track with a
    /// qualifying exam and a professional license, nursing a single
    /// licensure exam, software no license at all.
    pub fn category_defaults(&self, career: &str, category: &str) -> PathwayResult {
        let lower = format!("{} {}", career, category).to_lowercase();
        let transfer_options = self.candidates_from_rankings(career);

        let (feeder_programs, certifications, licenses) = if lower.contains("engineer") {
            (
                vec![FeederProgram {
                    code: "AS.EGR".to_string(),
                    name: "Engineering Associate in Science".to_string(),
                    credits: 60,
                    url: "https://www.mdc.edu/engineering/".to_string(),
                }],
                vec![Certification {
                    name: "FE Exam (Fundamentals of Engineering)".to_string(),
                    required: true,
                    timing: "During senior year or after graduation".to_string(),
                    url: Some("https://ncees.org/engineering/fe/".to_string()),
                }],
                vec![License {
                    name: "PE License (Professional Engineer)".to_string(),
                    required: true,
                    timing: "After 4 years of work experience + PE exam".to_string(),
                    state: "Florida".to_string(),
                    url: Some("https://fbpe.org/".to_string()),
                }],
            )
        } else if lower.contains("software") || lower.contains("developer") || lower.contains("technology") {
            (
                vec![FeederProgram {
                    code: "AS.CS".to_string(),
                    name: "Computer Science Associate in Science".to_string(),
                    credits: 60,
                    url: "https://www.mdc.edu/stem/".to_string(),
                }],
                vec![],
                vec![],
            )
        } else if lower.contains("nurse") || lower.contains("health") {
            (
                vec![FeederProgram {
                    code: "AS.NUR".to_string(),
                    name: "Nursing Associate in Science (ADN)".to_string(),
                    credits: 72,
                    url: "https://www.mdc.edu/nursing/".to_string(),
                }],
                vec![],
                vec![License {
                    name: "NCLEX-RN".to_string(),
                    required: true,
                    timing: "After ADN graduation".to_string(),
                    state: "Florida".to_string(),
                    url: Some("https://floridasnursing.gov/".to_string()),
                }],
            )
        } else {
            (
                vec![FeederProgram {
                    code: "AA.GEN".to_string(),
                    name: "Associate in Arts".to_string(),
                    credits: 60,
                    url: "https://www.mdc.edu/".to_string(),
                }],
                vec![],
                vec![],
            )
        };

        PathwayResult {
            feeder_programs,
            transfer_options,
            certifications,
            licenses,
            citations: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> PathwaySelector {
        PathwaySelector::new(Arc::new(SeedData::default()))
    }

    fn option(university: &str) -> TransferOption {
        TransferOption {
            university: university.to_string(),
            program: "BS Test".to_string(),
            articulation: "2+2 Transfer Agreement".to_string(),
            url: String::new(),
            abet_accredited: None,
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(
            PathwaySelector::normalize_name("Florida International University"),
            "FLORIDA INTERNATIONAL"
        );
        assert_eq!(
            PathwaySelector::normalize_name("The University of Florida (Gainesville)"),
            "FLORIDA"
        );
        assert_eq!(
            PathwaySelector::normalize_name("Georgia Institute of Technology"),
            "GEORGIA TECHNOLOGY"
        );
        assert_eq!(
            PathwaySelector::normalize_name("Miami-Dade College"),
            "MIAMI DADE"
        );
    }

    #[test]
    fn test_dedup_is_idempotent_and_unique() {
        let sel = selector();
        let candidates = vec![
            option("Florida International University"),
            option("FLORIDA INTERNATIONAL UNIVERSITY"),
            option("Florida International University (Main Campus)"),
            option("University of Florida"),
        ];

        let first = sel.select(candidates.clone(), LocationPreference::Anywhere);
        let second = sel.select(
            first.iter().map(|r| r.option.clone()).collect(),
            LocationPreference::Anywhere,
        );

        assert_eq!(first.len(), second.len());
        let mut keys: Vec<String> = first
            .iter()
            .map(|r| PathwaySelector::normalize_name(&r.option.university))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), first.len());
        // First occurrence wins.
        assert!(first
            .iter()
            .any(|r| r.option.university == "Florida International University"));
    }

    #[test]
    fn test_anywhere_includes_out_of_region() {
        let sel = selector();
        let candidates = vec![
            option("Florida International University"),
            option("Massachusetts Institute of Technology"),
        ];
        let selected = sel.select(candidates, LocationPreference::Anywhere);
        assert!(selected.iter().any(|r| !r.in_region));
    }

    #[test]
    fn test_in_region_excludes_out_of_region() {
        let sel = selector();
        let candidates = vec![
            option("Florida International University"),
            option("University of Florida"),
            option("Massachusetts Institute of Technology"),
            option("Stanford University"),
        ];
        let selected = sel.select(candidates, LocationPreference::InRegion);
        assert!(!selected.is_empty());
        assert!(selected.iter().all(|r| r.in_region));
    }

    #[test]
    fn test_in_region_caps_at_top_k() {
        let sel = selector();
        let candidates: Vec<TransferOption> = [
            "Florida International University",
            "Florida Atlantic University",
            "University of Central Florida",
            "University of Florida",
            "Florida State University",
            "University of South Florida",
        ]
        .iter()
        .map(|n| option(n))
        .collect();

        let selected = sel.select(candidates, LocationPreference::InRegion);
        assert_eq!(selected.len(), DEFAULT_TOP_K);
        // Highest-score in-region institution survives the cap.
        assert_eq!(selected[0].option.university, "University of Florida");
    }

    #[test]
    fn test_local_prefers_metro_then_fills() {
        let sel = selector();
        let candidates: Vec<TransferOption> = [
            "Florida International University", // metro
            "University of Florida",
            "Florida State University",
            "University of South Florida",
            "Florida Atlantic University",
        ]
        .iter()
        .map(|n| option(n))
        .collect();

        let selected = sel.select(candidates, LocationPreference::Local);
        assert_eq!(selected.len(), DEFAULT_TOP_K);
        assert!(selected
            .iter()
            .any(|r| r.option.university == "Florida International University"));
    }

    #[test]
    fn test_unknown_institution_scores_zero() {
        let sel = selector();
        let selected = sel.select(
            vec![option("Wildcat Technical Academy")],
            LocationPreference::Anywhere,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].score, 0);
        assert!(!selected[0].in_region);
    }

    #[test]
    fn test_ordering_is_score_descending() {
        let sel = selector();
        let selected = sel.select(
            vec![
                option("Florida Atlantic University"),
                option("University of Florida"),
                option("Florida International University"),
            ],
            LocationPreference::InRegion,
        );
        let scores: Vec<i64> = selected.iter().map(|r| r.score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(scores, sorted);
    }

    #[test]
    fn test_category_defaults() {
        let sel = selector();

        let engineering = sel.category_defaults("Robotics Engineer", "STEM-Engineering");
        assert_eq!(engineering.licenses.len(), 1);
        assert!(!engineering.certifications.is_empty());

        let software = sel.category_defaults("Game Developer", "STEM-Technology");
        assert!(software.licenses.is_empty());

        let nursing = sel.category_defaults("Travel Nurse", "Healthcare");
        assert_eq!(nursing.licenses.len(), 1);
        assert!(nursing.licenses[0].name.contains("NCLEX"));

        let generic = sel.category_defaults("Park Ranger", "General");
        assert!(!generic.feeder_programs.is_empty());
        assert!(!generic.transfer_options.is_empty());
    }
}
