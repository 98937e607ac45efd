use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CareerGraphError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    Hs,
    SomeCollege,
    Aa,
    Ba,
}

impl EducationLevel {
    /// An associate degree (or higher) satisfies the feeder-institution stage.
    pub fn has_associate(&self) -> bool {
        matches!(self, EducationLevel::Aa | EducationLevel::Ba)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelinePreference {
    Fast,
    Normal,
    Flexible,
}

/// Location preference for candidate institutions. Wire names keep the
/// original quiz vocabulary ("miami" / "florida" / "anywhere") with the
/// generic spellings accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationPreference {
    #[serde(rename = "miami", alias = "local")]
    Local,
    #[serde(rename = "florida", alias = "in_region")]
    InRegion,
    #[serde(rename = "anywhere")]
    Anywhere,
}

impl fmt::Display for LocationPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LocationPreference::Local => "local",
            LocationPreference::InRegion => "in-region",
            LocationPreference::Anywhere => "anywhere",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WorkSchedule {
    #[default]
    FullTimeStudent,
    PartTimeStudent,
}

/// A post-degree goal named in the quiz. Unrecognized goals are carried
/// through verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Goal {
    Internship,
    Research,
    Masters,
    Doctorate,
    Other(String),
}

impl From<String> for Goal {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Goal::Other(s))
    }
}

impl From<Goal> for String {
    fn from(g: Goal) -> Self {
        g.to_string()
    }
}

impl FromStr for Goal {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "internship" => Goal::Internship,
            "research" => Goal::Research,
            "masters" | "ms" => Goal::Masters,
            "phd" | "doctorate" => Goal::Doctorate,
            other => Goal::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Goal::Internship => "internship",
            Goal::Research => "research",
            Goal::Masters => "masters",
            Goal::Doctorate => "phd",
            Goal::Other(s) => s.as_str(),
        };
        write!(f, "{}", s)
    }
}

/// Validated quiz payload accepted by the roadmap pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizInput {
    pub career: String,
    pub current_education: EducationLevel,
    pub gpa: f64,
    pub budget: BudgetTier,
    pub timeline: TimelinePreference,
    pub location: LocationPreference,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub has_transfer_credits: bool,
    #[serde(default)]
    pub veteran_status: bool,
    #[serde(default)]
    pub work_schedule: WorkSchedule,
}

impl QuizInput {
    /// Rejects malformed input before any pipeline stage runs.
    pub fn validate(&self) -> Result<()> {
        if self.career.trim().is_empty() {
            return Err(CareerGraphError::Validation(
                "career cannot be empty".to_string(),
            ));
        }
        if !(0.0..=4.0).contains(&self.gpa) {
            return Err(CareerGraphError::Validation(format!(
                "gpa must be between 0.0 and 4.0, got {}",
                self.gpa
            )));
        }
        Ok(())
    }

    pub fn career(&self) -> &str {
        self.career.trim()
    }

    pub fn has_goal(&self, goal: &Goal) -> bool {
        self.goals.contains(goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quiz_json() -> serde_json::Value {
        json!({
            "career": "Mechanical Engineer",
            "current_education": "hs",
            "gpa": 3.5,
            "budget": "medium",
            "timeline": "normal",
            "location": "miami",
            "goals": ["internship", "masters"],
            "has_transfer_credits": false,
            "veteran_status": false,
            "work_schedule": "full-time-student"
        })
    }

    #[test]
    fn test_quiz_deserializes_wire_names() {
        let quiz: QuizInput = serde_json::from_value(quiz_json()).unwrap();
        assert_eq!(quiz.location, LocationPreference::Local);
        assert_eq!(quiz.current_education, EducationLevel::Hs);
        assert!(quiz.has_goal(&Goal::Masters));
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn test_location_aliases() {
        let quiz: QuizInput = serde_json::from_value({
            let mut v = quiz_json();
            v["location"] = json!("in_region");
            v
        })
        .unwrap();
        assert_eq!(quiz.location, LocationPreference::InRegion);
    }

    #[test]
    fn test_empty_career_rejected() {
        let quiz: QuizInput = serde_json::from_value({
            let mut v = quiz_json();
            v["career"] = json!("   ");
            v
        })
        .unwrap();
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn test_gpa_out_of_range_rejected() {
        let quiz: QuizInput = serde_json::from_value({
            let mut v = quiz_json();
            v["gpa"] = json!(4.7);
            v
        })
        .unwrap();
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn test_unknown_goal_preserved() {
        let goal: Goal = "study_abroad".to_string().into();
        assert_eq!(goal, Goal::Other("study_abroad".to_string()));
        assert_eq!(String::from(goal), "study_abroad");
    }
}
