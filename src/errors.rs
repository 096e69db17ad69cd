use thiserror::Error;

/// Main error type for a training run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    /// The creature could not be resolved by the reference-data provider
    #[error("Pokémon not found: {0}")]
    NotFound(String),
    /// A declared numeric bound was violated
    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),
}

/// Violations of the request's declared bounds
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("battles must be between {min} and {max}, got {actual}")]
    Battles { min: u32, max: u32, actual: u32 },
    #[error("epochs must be between {min} and {max}, got {actual}")]
    Epochs { min: u32, max: u32, actual: u32 },
    #[error("batch_size must be between {min} and {max}, got {actual}")]
    BatchSize { min: u32, max: u32, actual: u32 },
    #[error("training_intensity must be between {min} and {max}, got {actual}")]
    Intensity { min: f64, max: f64, actual: f64 },
    /// The recovery budget may not exceed a third of the run length
    #[error("max_recoveries cannot be greater than {allowed}, got {actual}")]
    Recoveries { allowed: u32, actual: u32 },
    #[error("limit must be between {min} and {max}, got {actual}")]
    PageLimit { min: u32, max: u32, actual: u32 },
}

/// Errors raised by reference-data providers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider has no record for this identifier
    #[error("no reference data for '{0}'")]
    NotFound(String),
    /// The upstream service could not be reached or answered with a failure
    #[error("reference data unavailable: {0}")]
    Unavailable(String),
    /// The upstream answered, but the body could not be understood
    #[error("malformed reference data: {0}")]
    Malformed(String),
}

/// Errors while loading the service configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Type alias for Results using TrainingError
pub type TrainerResult<T> = Result<T, TrainingError>;

/// Type alias for Results using ProviderError
pub type ProviderResult<T> = Result<T, ProviderError>;
