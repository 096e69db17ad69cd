//! The training loop.
//!
//! A run resolves the creature once, then fights a bounded number of simulated
//! battles. Each battle adds experience, may consume a recovery, and may push
//! the creature one stage along its evolution chain.

use super::evolution::{EvolutionTracker, EVOLUTION_THRESHOLD_STEP, INITIAL_EVOLUTION_THRESHOLD};
use super::rewards::RewardCalculator;
use super::validation::{validate_bounds, validate_recovery_budget, BATTLES_PER_RECOVERY};
use crate::config::ServiceConfig;
use crate::errors::{ProviderError, TrainerResult, TrainingError};
use crate::provider::ReferenceProvider;
use crate::rng::{rng_for_run, TrainingRng};
use crate::sprites;
use schema::{
    normalize_name, BattleRecord, CreatureProfile, EpochSummary, EvolutionChain, TrainingRequest,
    TrainingResult,
};

/// Tunables shared by every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSettings {
    pub initial_evolution_threshold: u64,
    pub evolution_threshold_step: u64,
    /// Opponents are drawn from here; when empty, from the species seen in the run.
    pub opponent_pool: Vec<String>,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            initial_evolution_threshold: INITIAL_EVOLUTION_THRESHOLD,
            evolution_threshold_step: EVOLUTION_THRESHOLD_STEP,
            opponent_pool: ServiceConfig::default().opponent_pool,
        }
    }
}

impl From<&ServiceConfig> for TrainingSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            initial_evolution_threshold: config.initial_evolution_threshold,
            evolution_threshold_step: config.evolution_threshold_step,
            opponent_pool: config.opponent_pool.iter().map(|n| normalize_name(n)).collect(),
        }
    }
}

/// Everything the loop produces before images are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Simulation {
    final_species: String,
    evolutions: Vec<String>,
    total_xp: u64,
    battles: Vec<BattleRecord>,
    recoveries: u32,
    stopped_early: bool,
    epochs: Vec<EpochSummary>,
}

pub struct Trainer<P> {
    provider: P,
    settings: TrainingSettings,
}

fn lookup_failure(name: &str, err: ProviderError) -> TrainingError {
    match err {
        ProviderError::NotFound(_) => log::info!("{} not found", name),
        other => log::warn!("lookup of {} failed: {}", name, other),
    }
    TrainingError::NotFound(name.to_string())
}

impl<P: ReferenceProvider> Trainer<P> {
    pub fn new(provider: P, settings: TrainingSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &TrainingSettings {
        &self.settings
    }

    /// Runs with a fresh generator, seeded from the request when it carries a seed.
    pub fn run(&self, request: &TrainingRequest) -> TrainerResult<TrainingResult> {
        let mut rng = rng_for_run(request.seed);
        self.run_with_rng(request, &mut rng)
    }

    /// Validates, resolves and simulates. Nothing is simulated unless every
    /// check passes.
    pub fn run_with_rng<R: TrainingRng + ?Sized>(
        &self,
        request: &TrainingRequest,
        rng: &mut R,
    ) -> TrainerResult<TrainingResult> {
        validate_bounds(request)?;

        let name = normalize_name(&request.pokemon);
        let profile = self
            .provider
            .resolve(&name)
            .map_err(|err| lookup_failure(&name, err))?;

        validate_recovery_budget(request)?;

        // A creature without a chain still trains; it just never evolves. Any
        // other failure means the provider data is incomplete.
        let chain = match self.provider.evolution_chain(&name) {
            Ok(chain) => Some(chain),
            Err(ProviderError::NotFound(_)) => {
                log::debug!("no evolution chain for {}", name);
                None
            }
            Err(err) => return Err(lookup_failure(&name, err)),
        };

        let simulation = self.simulate(&name, &profile, chain.as_ref(), request, rng);
        log::info!(
            "trained {} for {} battles: {} xp, {} recoveries, final species {}",
            name,
            simulation.battles.len(),
            simulation.total_xp,
            simulation.recoveries,
            simulation.final_species
        );

        let (pokemon_image, final_pokemon_image) = if request.include_images {
            self.images(&profile, &simulation.final_species)
        } else {
            (None, None)
        };

        Ok(TrainingResult {
            pokemon: request.pokemon.clone(),
            pokemon_image,
            final_pokemon: simulation.final_species,
            final_pokemon_image,
            total_xp: simulation.total_xp,
            battles: simulation.battles,
            recoveries: simulation.recoveries,
            evolutions: simulation.evolutions,
            optimizer: request.optimizer,
            stopped_early: simulation.stopped_early,
            epochs: simulation.epochs,
        })
    }

    fn simulate<R: TrainingRng + ?Sized>(
        &self,
        name: &str,
        profile: &CreatureProfile,
        chain: Option<&EvolutionChain>,
        request: &TrainingRequest,
        rng: &mut R,
    ) -> Simulation {
        let total_steps = request.run.total_steps();
        let batch_size = request.run.batch_size();
        let intensity = request.training_intensity;

        let mut evolution = EvolutionTracker::new(
            name,
            self.settings.initial_evolution_threshold,
            self.settings.evolution_threshold_step,
        );
        let mut seen = vec![name.to_string()];
        let mut total_xp: u64 = 0;
        let mut recoveries = 0;
        let mut battles = Vec::with_capacity(total_steps as usize);
        let mut epochs: Vec<EpochSummary> = Vec::new();
        let mut stopped_early = false;

        for step in 1..=total_steps {
            let rewards = RewardCalculator.roll(rng, profile.base_power_level, intensity);
            let enemy = self.draw_opponent(rng, &seen);
            total_xp += u64::from(rewards.xp_gained);

            let epoch = batch_size.map(|size| (step - 1) / size + 1);
            if let Some(epoch) = epoch {
                if epochs.last().map(|summary| summary.epoch) != Some(epoch) {
                    epochs.push(EpochSummary {
                        epoch,
                        ..EpochSummary::default()
                    });
                }
                if let Some(summary) = epochs.last_mut() {
                    summary.battles += 1;
                    summary.xp_gained += u64::from(rewards.xp_gained);
                    summary.hp_lost += u64::from(rewards.hp_lost);
                }
            }

            battles.push(BattleRecord {
                step,
                epoch,
                enemy,
                xp_gained: rewards.xp_gained,
                hp_lost: rewards.hp_lost,
            });

            // Recoveries are only counted; they do not restore stamina.
            if step % BATTLES_PER_RECOVERY == 0 && recoveries < request.max_recoveries {
                recoveries += 1;
            }

            let threshold = evolution.threshold();
            if let Some(species) = evolution.check(total_xp, chain) {
                log::info!("{} evolved into {} after battle {}", name, species, step);
                seen.push(species.to_string());
            }

            if request.early_stopping && total_xp >= threshold {
                stopped_early = step < total_steps;
                log::debug!("early stop after battle {} at {} xp", step, total_xp);
                break;
            }
        }

        let (final_species, evolutions) = evolution.into_parts();
        Simulation {
            final_species,
            evolutions,
            total_xp,
            battles,
            recoveries,
            stopped_early,
            epochs,
        }
    }

    fn draw_opponent<R: TrainingRng + ?Sized>(&self, rng: &mut R, seen: &[String]) -> String {
        let candidates = if self.settings.opponent_pool.is_empty() {
            seen
        } else {
            &self.settings.opponent_pool[..]
        };
        // `seen` always holds the trainee, so this is never empty.
        candidates[rng.pick(candidates.len())].clone()
    }

    fn images(
        &self,
        profile: &CreatureProfile,
        final_species: &str,
    ) -> (Option<String>, Option<String>) {
        let original = match sprites::sprite_base64(&self.provider, profile.sprite_id) {
            Ok(image) => Some(image),
            Err(err) => {
                log::debug!("no sprite for {}: {}", profile.name, err);
                None
            }
        };
        let evolved = if final_species == normalize_name(&profile.name) {
            original.clone()
        } else {
            sprites::optional_image(&self.provider, final_species)
        };
        (original, evolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ParameterError, ProviderResult};
    use crate::provider::StaticProvider;
    use crate::rng::ScriptedRng;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use pretty_assertions::assert_eq;
    use schema::{Optimizer, RunLength, SpeciesPage};

    /// The static table, plus a one-byte "sprite" per pokédex id.
    struct SpriteTable;

    impl ReferenceProvider for SpriteTable {
        fn resolve(&self, name: &str) -> ProviderResult<CreatureProfile> {
            StaticProvider.resolve(name)
        }

        fn evolution_chain(&self, name: &str) -> ProviderResult<EvolutionChain> {
            StaticProvider.evolution_chain(name)
        }

        fn sprite_bytes(&self, sprite_id: u32) -> ProviderResult<Vec<u8>> {
            Ok(vec![sprite_id as u8])
        }

        fn list_species(&self, offset: u32, limit: u32) -> ProviderResult<SpeciesPage> {
            StaticProvider.list_species(offset, limit)
        }
    }

    fn trainer() -> Trainer<StaticProvider> {
        Trainer::new(StaticProvider, TrainingSettings::default())
    }

    // With every draw at 1.0 bulbasaur gains floor(64 * 1.2) = 76 xp per battle
    // at full intensity, losing 30 hp, and always meets the last pool entry.
    fn max_rng() -> ScriptedRng {
        ScriptedRng::constant(1.0)
    }

    #[test]
    fn test_long_run_evolves_bulbasaur() {
        let request = TrainingRequest::battles("bulbasaur", 50, 10, 1.0);
        let result = trainer().run_with_rng(&request, &mut max_rng()).unwrap();

        assert_eq!(result.pokemon, "bulbasaur");
        assert_eq!(result.final_pokemon, "venusaur");
        assert_eq!(result.evolutions, vec!["ivysaur".to_string(), "venusaur".to_string()]);
        assert_eq!(result.total_xp, 50 * 76);
        assert_eq!(result.battles.len(), 50);
        assert_eq!(result.recoveries, 10);
        assert!(!result.stopped_early);
        assert!(result.epochs.is_empty());

        let first = &result.battles[0];
        assert_eq!(first.step, 1);
        assert_eq!(first.epoch, None);
        assert_eq!(first.enemy, "bulbasaur");
        assert_eq!(first.xp_gained, 76);
        assert_eq!(first.hp_lost, 30);
    }

    #[test]
    fn test_long_run_evolves_for_any_seed() {
        // Even the minimum gain, floor(64 * 0.3) = 19 per battle, clears 500 in 50 battles.
        for seed in 0..50 {
            let request = TrainingRequest::battles("bulbasaur", 50, 10, 1.0).with_seed(seed);
            let result = trainer().run(&request).unwrap();
            assert_ne!(result.final_pokemon, "bulbasaur", "seed {}", seed);
        }
    }

    #[test]
    fn test_short_run_does_not_evolve() {
        // At most floor(64 * 1.2 * 0.5) = 38 per battle, 190 in total.
        for seed in 0..50 {
            let request = TrainingRequest::battles("bulbasaur", 5, 1, 0.5).with_seed(seed);
            let result = trainer().run(&request).unwrap();
            assert_eq!(result.final_pokemon, "bulbasaur");
            assert!(result.evolutions.is_empty());
            assert!(result.total_xp <= 190);
        }
    }

    #[test]
    fn test_recovery_budget_violation() {
        let request = TrainingRequest::battles("squirtle", 6, 3, 0.7);
        let err = trainer().run_with_rng(&request, &mut max_rng()).unwrap_err();
        assert_eq!(
            err,
            TrainingError::InvalidParameter(ParameterError::Recoveries {
                allowed: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_unknown_creature() {
        let request = TrainingRequest::battles("missingno", 10, 3, 0.8);
        let err = trainer().run_with_rng(&request, &mut max_rng()).unwrap_err();
        assert_eq!(err, TrainingError::NotFound("missingno".to_string()));

        // Lookup happens before the derived recovery bound is checked.
        let over_budget = TrainingRequest::battles("missingno", 6, 3, 0.8);
        let err = trainer().run_with_rng(&over_budget, &mut max_rng()).unwrap_err();
        assert_eq!(err, TrainingError::NotFound("missingno".to_string()));
    }

    /// Resolves from the static table but fails every chain lookup.
    struct ChainFailure(ProviderError);

    impl ReferenceProvider for ChainFailure {
        fn resolve(&self, name: &str) -> ProviderResult<CreatureProfile> {
            StaticProvider.resolve(name)
        }

        fn evolution_chain(&self, _name: &str) -> ProviderResult<EvolutionChain> {
            Err(self.0.clone())
        }

        fn sprite_bytes(&self, sprite_id: u32) -> ProviderResult<Vec<u8>> {
            StaticProvider.sprite_bytes(sprite_id)
        }

        fn list_species(&self, offset: u32, limit: u32) -> ProviderResult<SpeciesPage> {
            StaticProvider.list_species(offset, limit)
        }
    }

    #[test]
    fn test_unreachable_chain_fails_the_run() {
        for err in [
            ProviderError::Unavailable("connection refused".to_string()),
            ProviderError::Malformed("missing chain".to_string()),
        ] {
            let trainer = Trainer::new(ChainFailure(err), TrainingSettings::default());
            let request = TrainingRequest::battles("bulbasaur", 50, 10, 1.0).with_seed(1);
            assert_eq!(
                trainer.run(&request).unwrap_err(),
                TrainingError::NotFound("bulbasaur".to_string())
            );
        }
    }

    #[test]
    fn test_missing_chain_trains_without_evolving() {
        let trainer = Trainer::new(
            ChainFailure(ProviderError::NotFound("bulbasaur".to_string())),
            TrainingSettings::default(),
        );
        let request = TrainingRequest::battles("bulbasaur", 50, 10, 1.0);
        let result = trainer.run_with_rng(&request, &mut max_rng()).unwrap();
        assert_eq!(result.final_pokemon, "bulbasaur");
        assert!(result.evolutions.is_empty());
        assert_eq!(result.battles.len(), 50);
    }

    #[test]
    fn test_field_bounds_come_first() {
        let request = TrainingRequest::battles("missingno", 10, 3, 1.5);
        let err = trainer().run_with_rng(&request, &mut max_rng()).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::InvalidParameter(ParameterError::Intensity { .. })
        ));

        let request = TrainingRequest::battles("pikachu", 0, 0, 0.5);
        let err = trainer().run_with_rng(&request, &mut max_rng()).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::InvalidParameter(ParameterError::Battles { actual: 0, .. })
        ));
    }

    #[test]
    fn test_recoveries_stay_within_budget() {
        for seed in 0..20 {
            for (battles, max_recoveries) in [(1, 0), (3, 1), (10, 1), (10, 3), (100, 33), (99, 5)] {
                let request =
                    TrainingRequest::battles("charmander", battles, max_recoveries, 0.6).with_seed(seed);
                let result = trainer().run(&request).unwrap();
                assert!(result.recoveries <= max_recoveries);
                assert!(result.recoveries <= battles / 3);
                assert_eq!(result.recoveries, max_recoveries.min(battles / 3));
            }
        }
    }

    #[test]
    fn test_xp_total_matches_log() {
        let request = TrainingRequest::battles("pikachu", 40, 4, 0.8).with_seed(11);
        let result = trainer().run(&request).unwrap();
        let sum: u64 = result.battles.iter().map(|b| u64::from(b.xp_gained)).sum();
        assert_eq!(result.total_xp, sum);
        for (index, battle) in result.battles.iter().enumerate() {
            assert_eq!(battle.step, index as u32 + 1);
            // 20 * [0.5, 1.5] * 1.2, give or take float rounding at the ends
            assert!((11..=36).contains(&battle.hp_lost), "hp {}", battle.hp_lost);
        }
    }

    #[test]
    fn test_evolution_never_reverts() {
        let request = TrainingRequest::battles("charmander", 100, 0, 1.0).with_seed(5);
        let result = trainer().run(&request).unwrap();
        let line = ["charmander", "charmeleon", "charizard"];
        let stages: Vec<usize> = result
            .evolutions
            .iter()
            .map(|species| line.iter().position(|s| s == species).unwrap())
            .collect();
        assert!(stages.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(result.final_pokemon, "charizard");
    }

    #[test]
    fn test_same_seed_same_result() {
        let request = TrainingRequest::battles("squirtle", 30, 5, 0.9).with_seed(1234);
        let first = trainer().run(&request).unwrap();
        let second = trainer().run(&request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_early_stopping_ends_at_threshold() {
        let mut request = TrainingRequest::battles("bulbasaur", 100, 0, 1.0);
        request.early_stopping = true;
        let result = trainer().run_with_rng(&request, &mut max_rng()).unwrap();

        // 7 * 76 = 532 is the first total past 500.
        assert_eq!(result.battles.len(), 7);
        assert_eq!(result.total_xp, 532);
        assert_eq!(result.final_pokemon, "ivysaur");
        assert!(result.stopped_early);
    }

    #[test]
    fn test_early_stopping_without_reaching_threshold() {
        let mut request = TrainingRequest::battles("bulbasaur", 5, 0, 0.5);
        request.early_stopping = true;
        let result = trainer().run_with_rng(&request, &mut max_rng()).unwrap();
        assert_eq!(result.battles.len(), 5);
        assert!(!result.stopped_early);
    }

    #[test]
    fn test_epoch_framing() {
        let mut request = TrainingRequest::battles("squirtle", 1, 0, 0.5);
        request.run = RunLength::Epochs {
            epochs: 5,
            batch_size: 4,
        };
        request.max_recoveries = 6;
        request.optimizer = Optimizer::Adam;
        let result = trainer().run_with_rng(&request, &mut max_rng()).unwrap();

        assert_eq!(result.battles.len(), 20);
        assert_eq!(result.recoveries, 6);
        assert_eq!(result.optimizer, Optimizer::Adam);
        assert_eq!(result.epochs.len(), 5);
        for (index, summary) in result.epochs.iter().enumerate() {
            assert_eq!(summary.epoch, index as u32 + 1);
            assert_eq!(summary.battles, 4);
        }
        let epoch_xp: u64 = result.epochs.iter().map(|s| s.xp_gained).sum();
        assert_eq!(epoch_xp, result.total_xp);
        assert_eq!(result.battles[3].epoch, Some(1));
        assert_eq!(result.battles[4].epoch, Some(2));
        assert_eq!(result.battles[19].epoch, Some(5));
    }

    #[test]
    fn test_opponents_come_from_pool() {
        let request = TrainingRequest::battles("pikachu", 60, 0, 0.5).with_seed(3);
        let trainer = trainer();
        let result = trainer.run(&request).unwrap();
        let pool = &trainer.settings().opponent_pool;
        assert!(result.battles.iter().all(|b| pool.contains(&b.enemy)));
    }

    #[test]
    fn test_empty_pool_draws_from_seen_species() {
        let settings = TrainingSettings {
            opponent_pool: Vec::new(),
            ..TrainingSettings::default()
        };
        let trainer = Trainer::new(StaticProvider, settings);
        let request = TrainingRequest::battles("bulbasaur", 10, 0, 1.0);
        let result = trainer.run_with_rng(&request, &mut max_rng()).unwrap();

        // The evolution after battle 7 adds ivysaur to the candidates.
        assert_eq!(result.battles[6].enemy, "bulbasaur");
        assert_eq!(result.battles[7].enemy, "ivysaur");
    }

    #[test]
    fn test_images_for_both_stages() {
        let trainer = Trainer::new(SpriteTable, TrainingSettings::default());
        let request = TrainingRequest::battles("bulbasaur", 50, 0, 1.0);
        let result = trainer.run_with_rng(&request, &mut max_rng()).unwrap();

        assert_eq!(result.pokemon_image, Some(STANDARD.encode([1u8])));
        assert_eq!(result.final_pokemon_image, Some(STANDARD.encode([3u8])));
    }

    #[test]
    fn test_images_skipped_when_not_requested_or_unavailable() {
        let mut request = TrainingRequest::battles("bulbasaur", 3, 0, 1.0);
        request.include_images = false;
        let with_sprites = Trainer::new(SpriteTable, TrainingSettings::default());
        let result = with_sprites.run_with_rng(&request, &mut max_rng()).unwrap();
        assert_eq!(result.pokemon_image, None);
        assert_eq!(result.final_pokemon_image, None);

        request.include_images = true;
        let result = trainer().run_with_rng(&request, &mut max_rng()).unwrap();
        assert_eq!(result.pokemon_image, None);
        assert_eq!(result.final_pokemon_image, None);
    }

    #[test]
    fn test_unevolved_final_image_reuses_original() {
        let trainer = Trainer::new(SpriteTable, TrainingSettings::default());
        let request = TrainingRequest::battles("pikachu", 2, 0, 0.5);
        let result = trainer.run_with_rng(&request, &mut max_rng()).unwrap();
        assert_eq!(result.final_pokemon, "pikachu");
        assert_eq!(result.pokemon_image, result.final_pokemon_image);
        assert!(result.pokemon_image.is_some());
    }
}
