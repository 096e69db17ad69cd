use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How long a training run lasts.
///
/// On the wire this is flattened into the request, so a caller sends either
/// `"battles": 10` or `"epochs": 5, "batch_size": 4`. Mixing the two shapes,
/// or sending only half of the epoch shape, is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RunLengthFields", into = "RunLengthFields")]
pub enum RunLength {
    Epochs { epochs: u32, batch_size: u32 },
    Battles { battles: u32 },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct RunLengthFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    battles: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    epochs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    batch_size: Option<u32>,
}

impl TryFrom<RunLengthFields> for RunLength {
    type Error = String;

    fn try_from(fields: RunLengthFields) -> Result<Self, Self::Error> {
        match (fields.battles, fields.epochs, fields.batch_size) {
            (Some(battles), None, None) => Ok(RunLength::Battles { battles }),
            (None, Some(epochs), Some(batch_size)) => Ok(RunLength::Epochs { epochs, batch_size }),
            (None, None, None) => Err("expected `battles` or `epochs` with `batch_size`".into()),
            (None, _, _) => Err("`epochs` and `batch_size` must be given together".into()),
            (Some(_), _, _) => {
                Err("`battles` cannot be combined with `epochs` or `batch_size`".into())
            }
        }
    }
}

impl From<RunLength> for RunLengthFields {
    fn from(run: RunLength) -> Self {
        match run {
            RunLength::Battles { battles } => Self {
                battles: Some(battles),
                ..Self::default()
            },
            RunLength::Epochs { epochs, batch_size } => Self {
                epochs: Some(epochs),
                batch_size: Some(batch_size),
                ..Self::default()
            },
        }
    }
}

impl RunLength {
    /// Number of simulated battles the run is configured for.
    pub fn total_steps(&self) -> u32 {
        match *self {
            RunLength::Battles { battles } => battles,
            RunLength::Epochs { epochs, batch_size } => epochs.saturating_mul(batch_size),
        }
    }

    /// Size of one epoch, or `None` when battles are not grouped.
    pub fn batch_size(&self) -> Option<u32> {
        match *self {
            RunLength::Battles { .. } => None,
            RunLength::Epochs { batch_size, .. } => Some(batch_size),
        }
    }
}

/// Cosmetic label carried through a run. It has no effect on the simulation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Optimizer {
    #[default]
    Sgd,
    Adam,
    RmsProp,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub pokemon: String,
    #[serde(flatten)]
    pub run: RunLength,
    #[serde(default)]
    pub max_recoveries: u32,
    pub training_intensity: f64,
    #[serde(default)]
    pub optimizer: Optimizer,
    #[serde(default)]
    pub early_stopping: bool,
    #[serde(default = "default_true")]
    pub include_images: bool,
    /// Fixes the random source so a run can be reproduced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl TrainingRequest {
    /// A plain battle-count request with every optional field at its default.
    pub fn battles(pokemon: &str, battles: u32, max_recoveries: u32, intensity: f64) -> Self {
        Self {
            pokemon: pokemon.to_string(),
            run: RunLength::Battles { battles },
            max_recoveries,
            training_intensity: intensity,
            optimizer: Optimizer::default(),
            early_stopping: false,
            include_images: true,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One simulated encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRecord {
    /// 1-based position in the run.
    pub step: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u32>,
    pub enemy: String,
    pub xp_gained: u32,
    pub hp_lost: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: u32,
    pub battles: u32,
    pub xp_gained: u64,
    pub hp_lost: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub pokemon: String,
    pub pokemon_image: Option<String>,
    pub final_pokemon: String,
    pub final_pokemon_image: Option<String>,
    pub total_xp: u64,
    pub battles: Vec<BattleRecord>,
    pub recoveries: u32,
    /// Species reached through evolution, in order.
    pub evolutions: Vec<String>,
    pub optimizer: Optimizer,
    pub stopped_early: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub epochs: Vec<EpochSummary>,
}

impl TrainingResult {
    pub fn evolved(&self) -> bool {
        !self.evolutions.is_empty()
    }
}

/// One page of the species index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesPage {
    pub count: u32,
    pub offset: u32,
    pub limit: u32,
    pub results: Vec<String>,
}
