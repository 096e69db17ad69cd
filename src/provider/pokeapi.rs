//! Blocking client for the public PokéAPI.

use super::{ReferenceProvider, HEALTH_PROBE_SPECIES};
use crate::config::ServiceConfig;
use crate::errors::{ProviderError, ProviderResult};
use schema::{normalize_name, CreatureProfile, EvolutionChain, SpeciesPage};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

const USER_AGENT: &str = concat!("pokemon-trainer/", env!("CARGO_PKG_VERSION"));

/// Sprites are small PNGs; anything larger is not a sprite.
const MAX_SPRITE_BYTES: u64 = 1 << 20;

#[derive(Debug, Deserialize)]
struct PokemonPayload {
    id: u32,
    name: String,
    base_experience: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ResourceLink {
    url: String,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpeciesPayload {
    evolution_chain: Option<ResourceLink>,
}

#[derive(Debug, Deserialize)]
struct ChainPayload {
    chain: ChainLink,
}

#[derive(Debug, Deserialize)]
struct ChainLink {
    species: NamedResource,
    #[serde(default)]
    evolves_to: Vec<ChainLink>,
}

#[derive(Debug, Deserialize)]
struct PagePayload {
    count: u32,
    results: Vec<NamedResource>,
}

/// Appends `link` and its descendants in pre-order, returning the index of `link`.
fn flatten_chain(link: &ChainLink, chain: &mut EvolutionChain) -> usize {
    let index = chain.push(&link.species.name);
    for child in &link.evolves_to {
        let child_index = flatten_chain(child, chain);
        chain.link(index, child_index);
    }
    index
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

fn map_error(err: ureq::Error, what: &str) -> ProviderError {
    match err {
        ureq::Error::Status(404, _) => ProviderError::NotFound(what.to_string()),
        ureq::Error::Status(code, _) => {
            ProviderError::Unavailable(format!("HTTP {} while fetching {}", code, what))
        }
        ureq::Error::Transport(transport) => ProviderError::Unavailable(transport.to_string()),
    }
}

pub struct PokeApiClient {
    agent: ureq::Agent,
    probe_agent: ureq::Agent,
    api_base_url: String,
    sprite_base_url: String,
}

impl PokeApiClient {
    pub fn new(
        api_base_url: &str,
        sprite_base_url: &str,
        request_timeout: Duration,
        probe_timeout: Duration,
    ) -> Self {
        let build = |timeout| {
            ureq::AgentBuilder::new()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
        };
        Self {
            agent: build(request_timeout),
            probe_agent: build(probe_timeout),
            api_base_url: with_trailing_slash(api_base_url),
            sprite_base_url: with_trailing_slash(sprite_base_url),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            &config.api_base_url,
            &config.sprite_base_url,
            config.request_timeout(),
            config.health_timeout(),
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> ProviderResult<T> {
        log::debug!("GET {}", url);
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|err| map_error(err, what))?;
        response
            .into_json::<T>()
            .map_err(|err| ProviderError::Malformed(format!("{}: {}", what, err)))
    }

    pub fn sprite_url(&self, sprite_id: u32) -> String {
        format!("{}{}.png", self.sprite_base_url, sprite_id)
    }
}

impl ReferenceProvider for PokeApiClient {
    fn resolve(&self, name: &str) -> ProviderResult<CreatureProfile> {
        let name = normalize_name(name);
        let url = format!("{}pokemon/{}", self.api_base_url, name);
        let payload: PokemonPayload = self.get_json(&url, &name)?;
        Ok(CreatureProfile {
            name: payload.name,
            base_power_level: payload.base_experience.unwrap_or(0),
            sprite_id: payload.id,
        })
    }

    fn evolution_chain(&self, name: &str) -> ProviderResult<EvolutionChain> {
        let name = normalize_name(name);
        let url = format!("{}pokemon-species/{}", self.api_base_url, name);
        let species: SpeciesPayload = self.get_json(&url, &name)?;
        let link = species
            .evolution_chain
            .ok_or_else(|| ProviderError::NotFound(format!("evolution chain of {}", name)))?;

        let payload: ChainPayload = self.get_json(&link.url, &name)?;
        let mut chain = EvolutionChain::default();
        flatten_chain(&payload.chain, &mut chain);
        Ok(chain)
    }

    fn sprite_bytes(&self, sprite_id: u32) -> ProviderResult<Vec<u8>> {
        let url = self.sprite_url(sprite_id);
        let what = format!("sprite {}", sprite_id);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| map_error(err, &what))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_SPRITE_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|err| ProviderError::Unavailable(format!("{}: {}", what, err)))?;
        Ok(bytes)
    }

    fn list_species(&self, offset: u32, limit: u32) -> ProviderResult<SpeciesPage> {
        let url = format!(
            "{}pokemon?offset={}&limit={}",
            self.api_base_url, offset, limit
        );
        let payload: PagePayload = self.get_json(&url, "species index")?;
        Ok(SpeciesPage {
            count: payload.count,
            offset,
            limit,
            results: payload.results.into_iter().map(|r| r.name).collect(),
        })
    }

    fn probe(&self) -> ProviderResult<()> {
        let url = format!("{}pokemon/{}", self.api_base_url, HEALTH_PROBE_SPECIES);
        self.probe_agent
            .get(&url)
            .call()
            .map(|_| ())
            .map_err(|err| map_error(err, HEALTH_PROBE_SPECIES))
    }
}
