use super::ReferenceProvider;
use crate::errors::{ProviderError, ProviderResult};
use schema::{normalize_name, CreatureProfile, EvolutionChain, SpeciesPage};

/// (name, pokédex id, base experience, evolution line)
type SpeciesEntry = (&'static str, u32, u32, &'static [&'static str]);

const SPECIES_TABLE: &[SpeciesEntry] = &[
    ("bulbasaur", 1, 64, &["bulbasaur", "ivysaur", "venusaur"]),
    ("ivysaur", 2, 142, &["bulbasaur", "ivysaur", "venusaur"]),
    ("venusaur", 3, 263, &["bulbasaur", "ivysaur", "venusaur"]),
    ("charmander", 4, 62, &["charmander", "charmeleon", "charizard"]),
    ("charmeleon", 5, 142, &["charmander", "charmeleon", "charizard"]),
    ("charizard", 6, 267, &["charmander", "charmeleon", "charizard"]),
    ("squirtle", 7, 63, &["squirtle", "wartortle", "blastoise"]),
    ("wartortle", 8, 142, &["squirtle", "wartortle", "blastoise"]),
    ("blastoise", 9, 265, &["squirtle", "wartortle", "blastoise"]),
    ("pikachu", 25, 112, &["pichu", "pikachu", "raichu"]),
    ("raichu", 26, 243, &["pichu", "pikachu", "raichu"]),
    ("pichu", 172, 41, &["pichu", "pikachu", "raichu"]),
];

/// The small hard-coded table used when the public API is not wanted.
///
/// It carries no sprites: `sprite_bytes` always reports not found.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProvider;

impl StaticProvider {
    pub fn new() -> Self {
        Self
    }

    fn entry(name: &str) -> ProviderResult<&'static SpeciesEntry> {
        let wanted = normalize_name(name);
        SPECIES_TABLE
            .iter()
            .find(|(species, ..)| *species == wanted)
            .ok_or(ProviderError::NotFound(wanted))
    }
}

impl ReferenceProvider for StaticProvider {
    fn resolve(&self, name: &str) -> ProviderResult<CreatureProfile> {
        let &(species, id, base_exp, _) = Self::entry(name)?;
        Ok(CreatureProfile {
            name: species.to_string(),
            base_power_level: base_exp,
            sprite_id: id,
        })
    }

    fn evolution_chain(&self, name: &str) -> ProviderResult<EvolutionChain> {
        let &(_, _, _, line) = Self::entry(name)?;
        Ok(EvolutionChain::linear(line))
    }

    fn sprite_bytes(&self, sprite_id: u32) -> ProviderResult<Vec<u8>> {
        Err(ProviderError::NotFound(format!("sprite {}", sprite_id)))
    }

    fn list_species(&self, offset: u32, limit: u32) -> ProviderResult<SpeciesPage> {
        let results = SPECIES_TABLE
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(species, ..)| species.to_string())
            .collect();
        Ok(SpeciesPage {
            count: SPECIES_TABLE.len() as u32,
            offset,
            limit,
            results,
        })
    }
}
