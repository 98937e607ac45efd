use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

use careergraph_ai::{GenerationConfig, Message};
use careergraph_core::{CareerGraphError, QuizInput, Roadmap};

use crate::{ApiError, ApiResult, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub agents: AgentReadiness,
    pub environment: EnvironmentDiagnostics,
}

#[derive(Serialize)]
pub struct AgentReadiness {
    pub intake_profiler: &'static str,
    pub pathway_research: &'static str,
    pub cost_estimator: &'static str,
    pub salary_outlook: &'static str,
}

#[derive(Serialize)]
pub struct EnvironmentDiagnostics {
    pub llm: bool,
    pub scorecard_api: bool,
    pub bls_api: bool,
    pub search_api: bool,
}

#[derive(Deserialize)]
pub struct PlanRequest {
    pub quiz_data: QuizInput,
}

#[derive(Serialize)]
pub struct PlanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<Roadmap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct CareerEntry {
    pub name: String,
    pub category: String,
}

#[derive(Serialize)]
pub struct CareersResponse {
    pub careers: Vec<CareerEntry>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub system_prompt: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let sources = &state.settings.sources;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: option_env!("CARGO_PKG_VERSION")
            .unwrap_or("0.0.0")
            .to_string(),
        agents: AgentReadiness {
            intake_profiler: "ready",
            pathway_research: "ready",
            cost_estimator: "ready",
            salary_outlook: "ready",
        },
        environment: EnvironmentDiagnostics {
            llm: state.llm.is_some(),
            scorecard_api: sources.scorecard_api_key.is_some(),
            bls_api: sources.bls_api_key.is_some(),
            search_api: sources.search_api_key.is_some() && sources.search_engine_id.is_some(),
        },
    })
}

pub async fn generate_plan(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> ApiResult<Json<PlanResponse>> {
    match state.orchestrator.generate_roadmap(&request.quiz_data).await {
        Ok(roadmap) => Ok(Json(PlanResponse {
            success: true,
            roadmap: Some(roadmap),
            error: None,
        })),
        Err(CareerGraphError::Validation(msg)) => Err(ApiError::Validation(msg)),
        Err(e) => {
            error!("roadmap generation failed: {}", e);
            Err(ApiError::Internal("roadmap generation failed".to_string()))
        }
    }
}

pub async fn list_careers(State(state): State<AppState>) -> Json<CareersResponse> {
    let careers = state
        .seed
        .pathways()
        .iter()
        .map(|pathway| CareerEntry {
            name: pathway.career.clone(),
            category: pathway.category.clone(),
        })
        .collect();

    Json(CareersResponse { careers })
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let Some(provider) = &state.llm else {
        return Err(ApiError::ServiceUnavailable(
            "no generative provider configured".to_string(),
        ));
    };

    let messages = vec![
        Message::system(request.system_prompt),
        Message::user(request.message),
    ];
    let config = GenerationConfig {
        temperature: 0.7,
        max_tokens: 500,
        ..Default::default()
    };

    match provider.generate_chat(&messages, &config).await {
        Ok(response) => Ok(Json(ChatResponse {
            response: response.content,
        })),
        Err(e) => {
            error!("chat generation failed: {e:#}");
            Err(ApiError::Internal("chat generation failed".to_string()))
        }
    }
}
