//! Histogram store: the only external boundary of the estimation core.
//!
//! - `HistogramStore` is the lookup contract used by the accessors
//! - `JsonHistogramStore` reads one JSON file per sample (`json`)
//! - `MemoryStore` keeps region yields in a map (`memory`)

pub mod json;
pub mod memory;

pub use json::*;
pub use memory::*;

use crate::domain::{BrVariation, JetSelection, Mode, Region, SampleId};
use crate::error::Result;

/// Full coordinates of one region yield in the store.
#[derive(Debug, Clone, Copy)]
pub struct YieldKey<'a> {
    pub sample: &'a SampleId,
    pub mode: Mode,
    pub region: Region,
    pub jet: JetSelection,
    pub br: &'a BrVariation,
}

/// Source of raw (unshifted) region yields and their statistical errors.
///
/// Identical keys must return identical values. A failed lookup is fatal for the
/// caller: estimators never continue with partial data.
pub trait HistogramStore {
    fn yield_value(&self, key: &YieldKey<'_>) -> Result<f64>;

    fn yield_error(&self, key: &YieldKey<'_>) -> Result<f64>;
}

impl<S: HistogramStore + ?Sized> HistogramStore for &S {
    fn yield_value(&self, key: &YieldKey<'_>) -> Result<f64> {
        (**self).yield_value(key)
    }

    fn yield_error(&self, key: &YieldKey<'_>) -> Result<f64> {
        (**self).yield_error(key)
    }
}

/// Histogram name for a mode/region pair, with the BR label appended when set.
pub fn histogram_name(mode: Mode, region: Region, br: &BrVariation) -> String {
    if br.is_nominal() {
        format!("h_njet_{}_{}", mode.label(), region.label())
    } else {
        format!("h_njet_{}_{}_{}", mode.label(), region.label(), br.as_str())
    }
}
