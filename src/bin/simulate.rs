//! Runs a single training simulation from the command line and prints the
//! result as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pokemon_trainer::{build_trainer, Optimizer, RunLength, ServiceConfig, TrainingRequest};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate one training run", long_about = None)]
struct Args {
    /// Creature to train
    pokemon: String,

    /// Number of battles (ignored when --epochs is given)
    #[arg(long, default_value_t = 10)]
    battles: u32,

    /// Group battles into this many epochs
    #[arg(long)]
    epochs: Option<u32>,

    /// Battles per epoch
    #[arg(long, default_value_t = 1)]
    batch_size: u32,

    #[arg(long, default_value_t = 0)]
    max_recoveries: u32,

    #[arg(long, default_value_t = 0.5)]
    intensity: f64,

    #[arg(long, default_value_t = Optimizer::Sgd)]
    optimizer: Optimizer,

    #[arg(long)]
    early_stopping: bool,

    /// Fetch sprites for the original and final creature
    #[arg(long)]
    images: bool,

    #[arg(long)]
    seed: Option<u64>,

    /// Use the built-in species table instead of PokéAPI
    #[arg(long)]
    offline: bool,

    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn request(&self) -> TrainingRequest {
        let run = match self.epochs {
            Some(epochs) => RunLength::Epochs {
                epochs,
                batch_size: self.batch_size,
            },
            None => RunLength::Battles {
                battles: self.battles,
            },
        };
        TrainingRequest {
            pokemon: self.pokemon.clone(),
            run,
            max_recoveries: self.max_recoveries,
            training_intensity: self.intensity,
            optimizer: self.optimizer,
            early_stopping: self.early_stopping,
            include_images: self.images,
            seed: self.seed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let mut config = ServiceConfig::resolve(args.config.as_deref())?;
    config.offline |= args.offline;

    let trainer = build_trainer(&config);
    let result = trainer
        .run(&args.request())
        .with_context(|| format!("training {} failed", args.pokemon))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
