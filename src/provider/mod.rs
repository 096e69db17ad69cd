//! Reference-data providers.
//!
//! A provider answers four questions about creatures: their profile, their
//! evolution chain, their sprite bytes and the species index. The simulator
//! only depends on the `ReferenceProvider` trait; which backend sits behind it
//! (the public API, the built-in table, either of them behind a cache) is a
//! deployment choice.

pub mod cache;
pub mod pokeapi;
pub mod static_table;

pub use cache::{CachedProvider, LruCache};
pub use pokeapi::PokeApiClient;
pub use static_table::StaticProvider;

use crate::errors::ProviderResult;
use schema::{CreatureProfile, EvolutionChain, SpeciesPage};
use std::sync::Arc;

/// Species resolved by the default health probe.
pub const HEALTH_PROBE_SPECIES: &str = "pikachu";

pub trait ReferenceProvider: Send + Sync {
    fn resolve(&self, name: &str) -> ProviderResult<CreatureProfile>;

    fn evolution_chain(&self, name: &str) -> ProviderResult<EvolutionChain>;

    fn sprite_bytes(&self, sprite_id: u32) -> ProviderResult<Vec<u8>>;

    fn list_species(&self, offset: u32, limit: u32) -> ProviderResult<SpeciesPage>;

    /// Cheap liveness check against the backing data source.
    fn probe(&self) -> ProviderResult<()> {
        self.resolve(HEALTH_PROBE_SPECIES).map(|_| ())
    }
}

pub type SharedProvider = Arc<dyn ReferenceProvider>;

impl<P: ReferenceProvider + ?Sized> ReferenceProvider for Arc<P> {
    fn resolve(&self, name: &str) -> ProviderResult<CreatureProfile> {
        (**self).resolve(name)
    }

    fn evolution_chain(&self, name: &str) -> ProviderResult<EvolutionChain> {
        (**self).evolution_chain(name)
    }

    fn sprite_bytes(&self, sprite_id: u32) -> ProviderResult<Vec<u8>> {
        (**self).sprite_bytes(sprite_id)
    }

    fn list_species(&self, offset: u32, limit: u32) -> ProviderResult<SpeciesPage> {
        (**self).list_species(offset, limit)
    }

    fn probe(&self) -> ProviderResult<()> {
        (**self).probe()
    }
}
