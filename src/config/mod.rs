//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `ESTATE_CONCIERGE` prefix
//! and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use estate_concierge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod database;
mod engagement;
mod error;
mod gateway;
mod seed;
mod server;

pub use ai::{AiConfig, AiProvider};
pub use database::DatabaseConfig;
pub use engagement::{AlertsConfig, EngagementConfig};
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use seed::SeedConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; in-memory stores when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub engagement: EngagementConfig,

    #[serde(default)]
    pub alerts: AlertsConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `ESTATE_CONCIERGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ESTATE_CONCIERGE__DATABASE__URL=...` -> `database.url = ...`
    /// - `ESTATE_CONCIERGE__AI__API_KEY=...` -> `ai.api_key = ...`
    pub fn load() -> Result<Self, ConfigError> {
        // .env is optional (development only)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ESTATE_CONCIERGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(ref database) = self.database {
            database.validate()?;
        }
        self.ai.validate()?;
        self.gateway.validate(self.is_production())?;
        self.engagement.validate()?;
        self.alerts.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
