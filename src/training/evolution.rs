use schema::{normalize_name, EvolutionChain};

pub const INITIAL_EVOLUTION_THRESHOLD: u64 = 500;
pub const EVOLUTION_THRESHOLD_STEP: u64 = 600;

/// Tracks which species a creature has become during a run.
///
/// The species only ever moves forward along the chain; each evolution raises
/// the experience threshold for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionTracker {
    current: String,
    threshold: u64,
    threshold_step: u64,
    evolutions: Vec<String>,
}

impl EvolutionTracker {
    pub fn new(species: &str, initial_threshold: u64, threshold_step: u64) -> Self {
        Self {
            current: normalize_name(species),
            threshold: initial_threshold,
            threshold_step,
            evolutions: Vec::new(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Experience at which the next evolution is attempted.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn evolutions(&self) -> &[String] {
        &self.evolutions
    }

    /// Evolves at most once if `total_xp` has reached the threshold.
    ///
    /// Returns the new species when an evolution happened. Without a chain, or
    /// when the current species is absent from it or is its last stage, this
    /// is a no-op and the threshold stays where it is.
    pub fn check(&mut self, total_xp: u64, chain: Option<&EvolutionChain>) -> Option<&str> {
        if total_xp < self.threshold {
            return None;
        }
        let next = chain?.successor_of(&self.current)?.to_string();
        log::debug!(
            "{} evolves into {} at {} xp",
            self.current,
            next,
            total_xp
        );
        self.current = next.clone();
        self.threshold = self.threshold.saturating_add(self.threshold_step);
        self.evolutions.push(next);
        Some(self.current.as_str())
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.current, self.evolutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bulbasaur_line() -> EvolutionChain {
        EvolutionChain::linear(&["bulbasaur", "ivysaur", "venusaur"])
    }

    fn tracker(species: &str) -> EvolutionTracker {
        EvolutionTracker::new(species, INITIAL_EVOLUTION_THRESHOLD, EVOLUTION_THRESHOLD_STEP)
    }

    #[test]
    fn test_below_threshold_does_nothing() {
        let chain = bulbasaur_line();
        let mut evolution = tracker("bulbasaur");
        assert_eq!(evolution.check(499, Some(&chain)), None);
        assert_eq!(evolution.current(), "bulbasaur");
        assert_eq!(evolution.threshold(), 500);
    }

    #[test]
    fn test_evolves_through_the_line() {
        let chain = bulbasaur_line();
        let mut evolution = tracker("Bulbasaur");

        assert_eq!(evolution.check(500, Some(&chain)), Some("ivysaur"));
        assert_eq!(evolution.threshold(), 1100);

        // Only one stage per check, even with plenty of experience.
        assert_eq!(evolution.check(1099, Some(&chain)), None);
        assert_eq!(evolution.check(5000, Some(&chain)), Some("venusaur"));
        assert_eq!(evolution.threshold(), 1700);

        // Final stage: threshold does not move.
        assert_eq!(evolution.check(9000, Some(&chain)), None);
        assert_eq!(evolution.threshold(), 1700);
        assert_eq!(
            evolution.evolutions(),
            &["ivysaur".to_string(), "venusaur".to_string()]
        );
    }

    #[test]
    fn test_middle_of_chain_start() {
        let chain = EvolutionChain::linear(&["pichu", "pikachu", "raichu"]);
        let mut evolution = tracker("pikachu");
        assert_eq!(evolution.check(600, Some(&chain)), Some("raichu"));
    }

    #[test]
    fn test_no_chain_or_no_match() {
        let mut evolution = tracker("bulbasaur");
        assert_eq!(evolution.check(10_000, None), None);

        let unrelated = EvolutionChain::linear(&["squirtle", "wartortle"]);
        assert_eq!(evolution.check(10_000, Some(&unrelated)), None);
        let (current, evolutions) = evolution.into_parts();
        assert_eq!(current, "bulbasaur");
        assert!(evolutions.is_empty());
    }
}
