use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

pub const MIN_CANDIDATES: i64 = 1;
pub const MAX_CANDIDATES: i64 = 8;
pub const DEFAULT_CANDIDATES: i64 = 4;

/// Validated knobs passed through to the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub count: u32,
    pub seed: Option<i64>,
    pub strength: Option<f64>,
}

impl GenerationOptions {
    /// Range-checks raw request values. Nothing is persisted before this passes.
    pub fn new(count: Option<i64>, seed: Option<i64>, strength: Option<f64>) -> AppResult<Self> {
        let count = count.unwrap_or(DEFAULT_CANDIDATES);
        if !(MIN_CANDIDATES..=MAX_CANDIDATES).contains(&count) {
            return Err(AppError::validation(
                ErrorCode::InvalidCountRange,
                format!("count must be between {MIN_CANDIDATES} and {MAX_CANDIDATES}, got {count}"),
            ));
        }

        if let Some(s) = strength {
            // NaN fails the range check as well.
            if !(0.0..=1.0).contains(&s) {
                return Err(AppError::validation(
                    ErrorCode::InvalidStrengthRange,
                    format!("strength must be between 0 and 1, got {s}"),
                ));
            }
        }

        Ok(Self {
            count: count as u32,
            seed,
            strength,
        })
    }
}
