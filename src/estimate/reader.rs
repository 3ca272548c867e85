//! Per-sample view of the four region yields under one selection.

use tracing::debug;

use crate::domain::{Region, RegionYield, SampleId, Selection, Variation};
use crate::error::Result;
use crate::estimate::{ensure_finite, nonzero};
use crate::store::{HistogramStore, YieldKey};

/// Region yields of one sample, read once from the store and rescaled by the
/// sample's systematic factor on access.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionYieldAccessor {
    sample: SampleId,
    /// Fractional yield uncertainty of this sample.
    delta: f64,
    variation: Variation,
    raw: [RegionYield; 4],
}

impl RegionYieldAccessor {
    /// Read all four regions eagerly. Any store failure aborts construction.
    pub fn load<S: HistogramStore + ?Sized>(
        store: &S,
        sample: &SampleId,
        delta: f64,
        selection: &Selection,
    ) -> Result<Self> {
        let mut raw = [RegionYield::default(); 4];
        for region in Region::ALL {
            let key = YieldKey {
                sample,
                mode: selection.mode,
                region,
                jet: selection.jet,
                br: &selection.br,
            };
            let value = store.yield_value(&key)?;
            let stat_error = store.yield_error(&key)?;
            debug!(
                sample = %sample,
                mode = %selection.mode,
                region = %region,
                jet = %selection.jet.label(),
                value,
                stat_error,
                "region yield"
            );
            raw[region.index()] = RegionYield { value, stat_error };
        }

        Ok(Self {
            sample: sample.clone(),
            delta,
            variation: selection.variation,
            raw,
        })
    }

    /// Same sample and cached yields, shifted by another variation.
    pub fn with_variation(&self, variation: Variation) -> Self {
        Self {
            variation,
            ..self.clone()
        }
    }

    pub fn sample(&self) -> &SampleId {
        &self.sample
    }

    pub fn syst_factor(&self) -> f64 {
        self.variation.factor(self.delta)
    }

    /// Store value for `region`, rescaled by the systematic factor.
    pub fn region_yield(&self, region: Region) -> f64 {
        self.raw[region.index()].value * self.syst_factor()
    }

    /// Statistical error for `region`, not rescaled by the systematic factor.
    pub fn region_error(&self, region: Region) -> f64 {
        self.raw[region.index()].stat_error
    }

    /// The unshifted store values.
    pub fn raw(&self, region: Region) -> RegionYield {
        self.raw[region.index()]
    }

    /// `B * C / A` on this sample alone, compared against its own D to check closure.
    pub fn closure_estimate(&self) -> Result<f64> {
        let a = nonzero(
            self.region_yield(Region::A),
            &format!("the closure estimate of '{}' (zero yield in A)", self.sample),
        )?;
        let estimate = self.region_yield(Region::B) * self.region_yield(Region::C) / a;
        ensure_finite(estimate, &format!("the closure estimate of '{}'", self.sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JetSelection, Mode};
    use crate::error::EstimateError;
    use crate::store::MemoryStore;

    fn store_with(sample: &SampleId) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_regions(
            sample,
            Mode::Tag,
            JetSelection::exclusive(3),
            [100.0, 50.0, 40.0, 12.0],
            [10.0, 7.0, 6.0, 3.0],
        );
        store
    }

    fn selection(variation: Variation) -> Selection {
        Selection::nominal(Mode::Tag, JetSelection::exclusive(3)).with_variation(variation)
    }

    #[test]
    fn shifted_yields_round_trip_to_store_values() {
        let sample = SampleId::new("ttbarSig");
        let store = store_with(&sample);
        for variation in [Variation::Down, Variation::Up] {
            let reader = RegionYieldAccessor::load(&store, &sample, 0.15, &selection(variation)).unwrap();
            for region in Region::ALL {
                let unshifted = reader.region_yield(region) / reader.syst_factor();
                assert!((unshifted - reader.raw(region).value).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn errors_are_not_rescaled() {
        let sample = SampleId::new("WJetsScaled");
        let store = store_with(&sample);
        let up = RegionYieldAccessor::load(&store, &sample, 0.25, &selection(Variation::Up)).unwrap();
        assert_eq!(up.syst_factor(), 1.25);
        assert_eq!(up.region_yield(Region::A), 125.0);
        assert_eq!(up.region_error(Region::A), 10.0);

        let down = up.with_variation(Variation::Down);
        assert_eq!(down.syst_factor(), 0.75);
        assert_eq!(down.region_yield(Region::B), 37.5);
    }

    #[test]
    fn zero_nuisance_samples_ignore_the_variation() {
        let sample = SampleId::new("Zjets");
        let store = store_with(&sample);
        let nominal = RegionYieldAccessor::load(&store, &sample, 0.0, &selection(Variation::Nominal)).unwrap();
        for variation in [Variation::Down, Variation::Up] {
            let shifted = nominal.with_variation(variation);
            for region in Region::ALL {
                assert_eq!(shifted.region_yield(region), nominal.region_yield(region));
            }
        }
    }

    #[test]
    fn sibling_matches_a_fresh_load() {
        let sample = SampleId::new("ttbarSig");
        let store = store_with(&sample);
        let nominal = RegionYieldAccessor::load(&store, &sample, 0.15, &selection(Variation::Nominal)).unwrap();
        let fresh = RegionYieldAccessor::load(&store, &sample, 0.15, &selection(Variation::Up)).unwrap();
        assert_eq!(nominal.with_variation(Variation::Up), fresh);
    }

    #[test]
    fn closure_estimate_uses_one_sample() {
        let sample = SampleId::new("Zjets");
        let store = store_with(&sample);
        let reader = RegionYieldAccessor::load(&store, &sample, 0.0, &selection(Variation::Nominal)).unwrap();
        // 50 * 40 / 100, next to the stored D of 12.
        assert_eq!(reader.closure_estimate().unwrap(), 20.0);
        assert_eq!(reader.sample(), &sample);
    }

    #[test]
    fn closure_estimate_rejects_empty_a() {
        let sample = SampleId::new("diBoson");
        let mut store = MemoryStore::new();
        store.insert_regions(
            &sample,
            Mode::Tag,
            JetSelection::exclusive(3),
            [0.0, 5.0, 4.0, 1.0],
            [0.0, 1.0, 1.0, 1.0],
        );
        let reader = RegionYieldAccessor::load(&store, &sample, 0.0, &selection(Variation::Nominal)).unwrap();
        assert!(matches!(reader.closure_estimate(), Err(EstimateError::DivisionByZero(_))));
    }

    #[test]
    fn unavailable_store_fails_construction() {
        let store = MemoryStore::new();
        let sample = SampleId::new("singleTop");
        let err = RegionYieldAccessor::load(&store, &sample, 0.0, &selection(Variation::Nominal)).unwrap_err();
        assert!(matches!(err, EstimateError::ResourceUnavailable(_)));
    }
}
