pub mod advisor;
pub mod extract;
pub mod gemini_provider;
pub mod llm_factory;
pub mod llm_provider;

pub use advisor::{
    Advisor, AdvisorContext, CandidateCost, DeterministicAdvisor, LlmAdvisor, PathPick,
    Recommendation, MAX_CANDIDATES,
};
pub use extract::extract_json_block;
pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use llm_factory::LlmProviderFactory;
pub use llm_provider::{
    GenerationConfig, LlmProvider, LlmResponse, LlmResult, Message, MessageRole,
};
