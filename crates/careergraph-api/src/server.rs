use std::net::SocketAddr;

use tracing::info;

use careergraph_core::{CareerGraphError, Result, Settings};

use crate::{create_router, AppState};

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub fn new(settings: Settings) -> Result<Self> {
        let addr: SocketAddr = settings
            .server
            .bind_address()
            .parse()
            .map_err(|e| CareerGraphError::Config(format!("invalid bind address: {}", e)))?;
        let state = AppState::new(settings)?;
        Ok(Self { state, addr })
    }

    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state);

        info!("CareerGraph API listening on http://{}", self.addr);
        info!("  GET  /health      - service health and source diagnostics");
        info!("  POST /api/plan    - generate a roadmap from quiz data");
        info!("  GET  /api/careers - supported careers");
        info!("  POST /api/chat    - roadmap Q&A");

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, router)
            .await
            .map_err(CareerGraphError::Io)?;

        Ok(())
    }
}
