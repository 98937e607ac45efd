pub mod config;
pub mod error;
pub mod quiz;
pub mod seed;
pub mod types;

pub use config::{LlmConfig, ServerConfig, Settings, SourcesConfig};
pub use error::{CareerGraphError, Result};
pub use quiz::*;
pub use seed::*;
pub use types::*;
