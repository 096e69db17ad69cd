// In: src/lib.rs

//! Pokemon Trainer
//!
//! Trains a Pokémon by simulating a bounded series of battles, accumulating
//! experience and walking the creature along its evolution chain. Reference
//! data comes from the public PokéAPI or from a small built-in table.

// --- MODULE DECLARATIONS ---
pub mod config;
pub mod errors;
pub mod provider;
pub mod rng;
pub mod server;
pub mod sprites;
pub mod training;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    BattleRecord, CreatureProfile, EpochSummary, EvolutionChain, EvolutionNode, Optimizer,
    RunLength, SpeciesPage, TrainingRequest, TrainingResult,
};

// --- From this crate's modules (`src/`) ---
pub use config::ServiceConfig;
pub use errors::{
    ConfigError, ParameterError, ProviderError, ProviderResult, TrainerResult, TrainingError,
};
pub use provider::{
    CachedProvider, PokeApiClient, ReferenceProvider, SharedProvider, StaticProvider,
};
pub use rng::{ScriptedRng, TrainingRng};
pub use server::{create_router, AppState};
pub use training::{Trainer, TrainingSettings};

use std::sync::Arc;

/// Builds the provider stack the configuration asks for, behind the lookup cache.
pub fn build_provider(config: &ServiceConfig) -> SharedProvider {
    if config.offline {
        log::info!("using the built-in species table");
        Arc::new(CachedProvider::new(StaticProvider::new(), config.cache_capacity))
    } else {
        log::info!("using reference data from {}", config.api_base_url);
        Arc::new(CachedProvider::new(
            PokeApiClient::from_config(config),
            config.cache_capacity,
        ))
    }
}

/// A trainer wired up from configuration.
pub fn build_trainer(config: &ServiceConfig) -> Trainer<SharedProvider> {
    Trainer::new(build_provider(config), TrainingSettings::from(config))
}
