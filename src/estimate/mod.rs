//! Background estimation.
//!
//! Responsibilities:
//!
//! - read per-sample region yields and apply systematic shifts (`reader`)
//! - aggregate data and background samples under one selection (`collection`)
//! - ABCD closure estimate (`abcd`) and tag-rate cross-check (`tag_rate`)
//! - per-sample contamination fractions (`contamination`)

pub mod abcd;
pub mod collection;
pub mod contamination;
pub mod reader;
pub mod tag_rate;

pub use abcd::*;
pub use collection::*;
pub use contamination::*;
pub use reader::*;
pub use tag_rate::*;

use crate::error::{EstimateError, Result};

/// Reject an exactly-zero denominator instead of letting `inf`/`NaN` through.
pub(crate) fn nonzero(value: f64, what: &str) -> Result<f64> {
    if value == 0.0 {
        return Err(EstimateError::DivisionByZero(what.to_string()));
    }
    Ok(value)
}

pub(crate) fn ensure_finite(value: f64, what: &str) -> Result<f64> {
    if !value.is_finite() {
        return Err(EstimateError::NonFinite(what.to_string()));
    }
    Ok(value)
}
