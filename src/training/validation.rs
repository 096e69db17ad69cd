use crate::errors::ParameterError;
use schema::{RunLength, TrainingRequest};
use std::ops::RangeInclusive;

pub const BATTLES: RangeInclusive<u32> = 1..=100;
pub const EPOCHS: RangeInclusive<u32> = 1..=50;
pub const BATCH_SIZE: RangeInclusive<u32> = 1..=10;
pub const INTENSITY: RangeInclusive<f64> = 0.1..=1.0;
pub const PAGE_LIMIT: RangeInclusive<u32> = 1..=100;

/// One recovery is allowed per three battles.
pub const BATTLES_PER_RECOVERY: u32 = 3;

fn check_u32(
    range: &RangeInclusive<u32>,
    actual: u32,
    err: fn(u32, u32, u32) -> ParameterError,
) -> Result<(), ParameterError> {
    if range.contains(&actual) {
        Ok(())
    } else {
        Err(err(*range.start(), *range.end(), actual))
    }
}

pub fn validate_run_length(run: &RunLength) -> Result<(), ParameterError> {
    match *run {
        RunLength::Battles { battles } => check_u32(&BATTLES, battles, |min, max, actual| {
            ParameterError::Battles { min, max, actual }
        }),
        RunLength::Epochs { epochs, batch_size } => {
            check_u32(&EPOCHS, epochs, |min, max, actual| ParameterError::Epochs {
                min,
                max,
                actual,
            })?;
            check_u32(&BATCH_SIZE, batch_size, |min, max, actual| {
                ParameterError::BatchSize { min, max, actual }
            })
        }
    }
}

pub fn validate_intensity(intensity: f64) -> Result<(), ParameterError> {
    // NaN fails `contains` as well.
    if INTENSITY.contains(&intensity) {
        Ok(())
    } else {
        Err(ParameterError::Intensity {
            min: *INTENSITY.start(),
            max: *INTENSITY.end(),
            actual: intensity,
        })
    }
}

/// Declared field bounds; checked before anything is looked up.
pub fn validate_bounds(request: &TrainingRequest) -> Result<(), ParameterError> {
    validate_run_length(&request.run)?;
    validate_intensity(request.training_intensity)
}

pub fn max_recoveries_allowed(run: &RunLength) -> u32 {
    run.total_steps() / BATTLES_PER_RECOVERY
}

/// The derived budget: `max_recoveries <= floor(run_length / 3)`.
pub fn validate_recovery_budget(request: &TrainingRequest) -> Result<u32, ParameterError> {
    let allowed = max_recoveries_allowed(&request.run);
    if request.max_recoveries > allowed {
        return Err(ParameterError::Recoveries {
            allowed,
            actual: request.max_recoveries,
        });
    }
    Ok(allowed)
}

pub fn validate_page_limit(limit: u32) -> Result<(), ParameterError> {
    check_u32(&PAGE_LIMIT, limit, |min, max, actual| {
        ParameterError::PageLimit { min, max, actual }
    })
}
