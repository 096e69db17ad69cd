//! Service configuration.
//!
//! Settings come from an optional RON file; the binaries then apply command
//! line overrides on top. Every field has a default, so an empty file (or no
//! file at all) yields a working online service.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2/";
pub const DEFAULT_SPRITE_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/";

/// Environment variable naming the RON config file.
pub const CONFIG_ENV_VAR: &str = "POKEMON_TRAINER_CONFIG";

/// Upper bound for `cache_capacity`. Cache hits scan the recency list.
pub const MAX_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub api_base_url: String,
    pub sprite_base_url: String,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
    /// Entries kept per lookup cache (profiles and chains each).
    pub cache_capacity: usize,
    pub opponent_pool: Vec<String>,
    pub initial_evolution_threshold: u64,
    pub evolution_threshold_step: u64,
    /// Serve from the built-in species table instead of the public API.
    pub offline: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            sprite_base_url: DEFAULT_SPRITE_BASE_URL.to_string(),
            request_timeout_secs: 10,
            health_timeout_secs: 3,
            cache_capacity: 50,
            opponent_pool: ["pikachu", "charmander", "squirtle", "bulbasaur"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            initial_evolution_threshold: 500,
            evolution_threshold_step: 600,
            offline: false,
        }
    }
}

impl ServiceConfig {
    pub fn from_ron_str(source: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig =
            ron::from_str(source).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_ron_str(&source, &display)
    }

    /// Loads from `path`, else from the file named by the environment, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(env_path) if !env_path.is_empty() => Self::load(Path::new(&env_path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 || self.cache_capacity > MAX_CACHE_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "cache_capacity must be between 1 and {}",
                MAX_CACHE_CAPACITY
            )));
        }
        if self.request_timeout_secs == 0 || self.health_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".to_string()));
        }
        if self.evolution_threshold_step == 0 {
            return Err(ConfigError::Invalid(
                "evolution_threshold_step must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
