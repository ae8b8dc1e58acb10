use std::env;

/// ---------------------------------------------------------------------------
/// Portal Configuration
/// ---------------------------------------------------------------------------

/// Connection settings for the hosted backend (auth service + document store)
#[derive(Debug, Clone)]
pub struct PortalConfig {
  pub api_key: String,
  pub project_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),
}

impl PortalConfig {
  /// Load configuration from the environment (reads a .env file if present)
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();

    Ok(Self {
      api_key: env::var("PORTAL_API_KEY")
        .map_err(|_| ConfigError::MissingConfig("PORTAL_API_KEY".into()))?,
      project_id: env::var("PORTAL_PROJECT_ID")
        .map_err(|_| ConfigError::MissingConfig("PORTAL_PROJECT_ID".into()))?,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
