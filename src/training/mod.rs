pub mod evolution;
pub mod rewards;
pub mod simulator;
pub mod validation;

pub use evolution::EvolutionTracker;
pub use rewards::{BattleRewards, RewardCalculator};
pub use simulator::{Trainer, TrainingSettings};
