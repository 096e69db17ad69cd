use crate::rng::TrainingRng;

// Multiplier ranges for a single battle
pub const XP_GAIN_RANGE: (f64, f64) = (0.3, 1.2);
pub const HP_LOSS_RANGE: (f64, f64) = (0.5, 1.5);

/// Stamina lost before intensity scaling
const BASE_HP_LOSS: f64 = 20.0;

/// Experience and stamina outcome of one battle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleRewards {
    pub xp_gained: u32,
    pub hp_lost: u32,
}

/// Calculator for per-battle rewards
pub struct RewardCalculator;

impl RewardCalculator {
    /// xp = floor(base × gain × intensity)
    pub fn xp_gained(&self, base_power_level: u32, gain_multiplier: f64, intensity: f64) -> u32 {
        (base_power_level as f64 * gain_multiplier * intensity).floor() as u32
    }

    /// hp = floor(20 × loss × (2 − intensity)); harder training costs less stamina
    pub fn hp_lost(&self, loss_multiplier: f64, intensity: f64) -> u32 {
        (BASE_HP_LOSS * loss_multiplier * (2.0 - intensity)).floor() as u32
    }

    /// Draws the gain multiplier, then the loss multiplier, in that order.
    pub fn roll<R: TrainingRng + ?Sized>(
        &self,
        rng: &mut R,
        base_power_level: u32,
        intensity: f64,
    ) -> BattleRewards {
        let gain = rng.uniform(XP_GAIN_RANGE.0, XP_GAIN_RANGE.1);
        let loss = rng.uniform(HP_LOSS_RANGE.0, HP_LOSS_RANGE.1);
        BattleRewards {
            xp_gained: self.xp_gained(base_power_level, gain, intensity),
            hp_lost: self.hp_lost(loss, intensity),
        }
    }
}
