use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use careergraph_agents::Orchestrator;
use careergraph_ai::{LlmProvider, LlmProviderFactory};
use careergraph_core::{Result, SeedData, Settings};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub seed: Arc<SeedData>,
    pub orchestrator: Arc<Orchestrator>,
    pub llm: Option<Arc<dyn LlmProvider>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let seed = match &settings.seed_file {
            Some(path) => {
                info!("loading seed data override from {}", path);
                Arc::new(SeedData::from_file(Path::new(path))?)
            }
            None => Arc::new(SeedData::default()),
        };

        let llm = match LlmProviderFactory::create_from_config(&settings.llm) {
            Ok(provider) => {
                info!(
                    provider = provider.provider_name(),
                    model = provider.model_name(),
                    "LLM provider configured"
                );
                Some(provider)
            }
            Err(e) => {
                warn!("running without generative provider: {}", e);
                None
            }
        };

        let orchestrator = Arc::new(Orchestrator::new(&settings, seed.clone(), llm.clone())?);

        Ok(Self {
            settings: Arc::new(settings),
            seed,
            orchestrator,
            llm,
        })
    }
}
