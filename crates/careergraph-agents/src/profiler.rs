use std::sync::Arc;

use tracing::{debug, warn};

use careergraph_ai::{extract_json_block, GenerationConfig, LlmProvider, Message};
use careergraph_core::{
    BudgetTier, Constraints, EducationLevel, Profile, QuizInput, TimelinePreference,
};

const PROFILER_SYSTEM_PROMPT: &str = "You are a student intake analyst. Given \
quiz answers, produce a structured profile as a single JSON object with the \
fields: career, category, constraints {budget, timeline, gpa, hasAA, \
location}, preferences, flags, recommendations. Categories follow the form \
STEM-Engineering, STEM-Technology, Healthcare, Business, or General. Do not \
include any text outside the JSON object.";

/// Extracts a structured profile from the quiz, via the LLM when one is
/// configured and a deterministic mapping otherwise. Generation failures of
/// any kind degrade to the deterministic mapping.
pub struct IntakeProfiler {
    llm: Option<Arc<dyn LlmProvider>>,
}

impl IntakeProfiler {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { llm }
    }

    pub async fn profile(&self, quiz: &QuizInput) -> Profile {
        if let Some(provider) = &self.llm {
            match self.generate_profile(provider.as_ref(), quiz).await {
                Ok(profile) => return profile,
                Err(e) => {
                    warn!("intake profiling generation unusable ({e:#}); using quiz-derived profile");
                }
            }
        } else {
            debug!("no LLM configured; deriving profile from quiz directly");
        }
        Self::fallback_profile(quiz)
    }

    async fn generate_profile(
        &self,
        provider: &dyn LlmProvider,
        quiz: &QuizInput,
    ) -> anyhow::Result<Profile> {
        let quiz_json = serde_json::to_string_pretty(quiz)?;
        let prompt = format!(
            "Analyze this student quiz data and create a structured profile.\n\n\
             Quiz Data:\n```json\n{}\n```\n\n\
             Return ONLY the JSON object described in your instructions.",
            quiz_json
        );

        let messages = vec![Message::system(PROFILER_SYSTEM_PROMPT), Message::user(prompt)];
        let response = provider
            .generate_chat(&messages, &GenerationConfig::default())
            .await?;

        let block = extract_json_block(&response.content)?;
        let mut profile: Profile = serde_json::from_str(block)?;
        if profile.career.trim().is_empty() {
            profile.career = quiz.career().to_string();
        }
        Ok(profile)
    }

    /// Deterministic profile assembled from the quiz alone.
    pub fn fallback_profile(quiz: &QuizInput) -> Profile {
        let career = quiz.career().to_string();
        let mut flags = Vec::new();
        if quiz.budget == BudgetTier::Low && !quiz.current_education.has_associate() {
            flags.push("community_college_optimal".to_string());
        }
        if quiz.timeline == TimelinePreference::Fast {
            flags.push("accelerated_candidate".to_string());
        }
        if quiz.veteran_status {
            flags.push("veteran_benefits_eligible".to_string());
        }
        if quiz.has_transfer_credits || quiz.current_education == EducationLevel::SomeCollege {
            flags.push("transfer_credits_review".to_string());
        }

        Profile {
            category: infer_category(&career).to_string(),
            constraints: Constraints {
                budget: quiz.budget,
                timeline: quiz.timeline,
                gpa: quiz.gpa,
                has_aa: quiz.current_education.has_associate(),
                location: quiz.location,
            },
            preferences: quiz.goals.iter().map(|g| g.to_string()).collect(),
            flags,
            recommendations: vec![],
            career,
        }
    }
}

fn infer_category(career: &str) -> &'static str {
    let lower = career.to_lowercase();
    let matches_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if matches_any(&["architect"]) {
        "STEM-Architecture"
    } else if matches_any(&["software", "developer", "data", "cyber", "programmer"]) {
        "STEM-Technology"
    } else if matches_any(&["engineer"]) {
        "STEM-Engineering"
    } else if matches_any(&["nurse", "medical", "health", "physician", "therapist"]) {
        "Healthcare"
    } else if matches_any(&["business", "finance", "account", "analyst", "marketing"]) {
        "Business"
    } else {
        "General"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careergraph_core::{Goal, LocationPreference, WorkSchedule};

    fn quiz(career: &str, budget: BudgetTier, timeline: TimelinePreference) -> QuizInput {
        QuizInput {
            career: career.to_string(),
            current_education: EducationLevel::Hs,
            gpa: 3.4,
            budget,
            timeline,
            location: LocationPreference::Local,
            goals: vec![Goal::Internship],
            has_transfer_credits: false,
            veteran_status: false,
            work_schedule: WorkSchedule::FullTimeStudent,
        }
    }

    #[test]
    fn test_fallback_profile_categories() {
        let p = IntakeProfiler::fallback_profile(&quiz(
            "Mechanical Engineer",
            BudgetTier::Medium,
            TimelinePreference::Normal,
        ));
        assert_eq!(p.category, "STEM-Engineering");

        let p = IntakeProfiler::fallback_profile(&quiz(
            "Software Developer",
            BudgetTier::Medium,
            TimelinePreference::Normal,
        ));
        assert_eq!(p.category, "STEM-Technology");

        let p = IntakeProfiler::fallback_profile(&quiz(
            "Registered Nurse",
            BudgetTier::Medium,
            TimelinePreference::Normal,
        ));
        assert_eq!(p.category, "Healthcare");

        let p = IntakeProfiler::fallback_profile(&quiz(
            "Park Ranger",
            BudgetTier::Medium,
            TimelinePreference::Normal,
        ));
        assert_eq!(p.category, "General");
    }

    #[test]
    fn test_fallback_profile_flags() {
        let p = IntakeProfiler::fallback_profile(&quiz(
            "Registered Nurse",
            BudgetTier::Low,
            TimelinePreference::Fast,
        ));
        assert!(p.flags.contains(&"community_college_optimal".to_string()));
        assert!(p.flags.contains(&"accelerated_candidate".to_string()));
        assert!(p.constraints.budget == BudgetTier::Low);
        assert!(!p.constraints.has_aa);
    }

    #[tokio::test]
    async fn test_profile_without_llm_is_deterministic() {
        let profiler = IntakeProfiler::new(None);
        let q = quiz("Civil Engineer", BudgetTier::High, TimelinePreference::Flexible);
        let first = profiler.profile(&q).await;
        let second = profiler.profile(&q).await;
        assert_eq!(first.category, second.category);
        assert_eq!(first.flags, second.flags);
    }
}
