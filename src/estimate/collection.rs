//! Data and background accessors sharing one selection.

use tracing::debug;

use crate::domain::{AnalysisConfig, Region, Selection, Variation};
use crate::error::Result;
use crate::estimate::RegionYieldAccessor;
use crate::store::HistogramStore;

/// One DATA accessor plus one accessor per simulated background.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleCollection {
    selection: Selection,
    data: RegionYieldAccessor,
    backgrounds: Vec<RegionYieldAccessor>,
}

impl SampleCollection {
    pub fn load<S: HistogramStore + ?Sized>(
        store: &S,
        analysis: &AnalysisConfig,
        selection: &Selection,
    ) -> Result<Self> {
        let data = RegionYieldAccessor::load(
            store,
            &analysis.data_sample,
            analysis.nuisance(&analysis.data_sample),
            selection,
        )?;
        let backgrounds = analysis
            .background_samples
            .iter()
            .map(|sample| RegionYieldAccessor::load(store, sample, analysis.nuisance(sample), selection))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            selection: selection.clone(),
            data,
            backgrounds,
        })
    }

    /// Same cached yields under another systematic variation; no store access.
    pub fn with_variation(&self, variation: Variation) -> Self {
        Self {
            selection: self.selection.with_variation(variation),
            data: self.data.with_variation(variation),
            backgrounds: self
                .backgrounds
                .iter()
                .map(|b| b.with_variation(variation))
                .collect(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn data_yield(&self, region: Region) -> f64 {
        self.data.region_yield(region)
    }

    /// Total predicted contamination from simulated processes.
    pub fn background_correction(&self, region: Region) -> f64 {
        let correction = self.backgrounds.iter().map(|b| b.region_yield(region)).sum();
        debug!(region = %region, mode = %self.selection.mode, correction, "background correction");
        correction
    }

    pub fn corrected_yield(&self, region: Region) -> f64 {
        self.data_yield(region) - self.background_correction(region)
    }

    /// Quadrature sum of the statistical errors of every sample, data included.
    pub fn combined_stat_error(&self, region: Region) -> f64 {
        std::iter::once(&self.data)
            .chain(self.backgrounds.iter())
            .map(|a| {
                let e = a.region_error(region);
                e * e
            })
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JetSelection, Mode, SampleId};
    use crate::store::MemoryStore;

    fn analysis() -> AnalysisConfig {
        AnalysisConfig {
            background_samples: vec![SampleId::new("ttbarSig"), SampleId::new("Zjets")],
            ..AnalysisConfig::default()
        }
    }

    fn store(jet: JetSelection) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_regions(&"dataAllEgamma".into(), Mode::Tag, jet, [200.0, 90.0, 70.0, 30.0], [4.0, 3.0, 2.0, 1.0]);
        store.insert_regions(&"ttbarSig".into(), Mode::Tag, jet, [60.0, 20.0, 10.0, 5.0], [3.0, 0.0, 2.0, 1.0]);
        store.insert_regions(&"Zjets".into(), Mode::Tag, jet, [40.0, 20.0, 20.0, 5.0], [0.0, 4.0, 1.0, 1.0]);
        store
    }

    #[test]
    fn corrected_yield_is_data_minus_backgrounds() {
        let jet = JetSelection::exclusive(3);
        let store = store(jet);
        let collection = SampleCollection::load(&store, &analysis(), &Selection::nominal(Mode::Tag, jet)).unwrap();

        for variation in [Variation::Down, Variation::Nominal, Variation::Up] {
            let shifted = collection.with_variation(variation);
            for region in Region::ALL {
                assert_eq!(
                    shifted.corrected_yield(region),
                    shifted.data_yield(region) - shifted.background_correction(region)
                );
            }
        }
        assert_eq!(collection.background_correction(Region::A), 100.0);
        assert_eq!(collection.corrected_yield(Region::B), 50.0);
    }

    #[test]
    fn up_variation_scales_only_samples_with_a_nuisance() {
        let jet = JetSelection::exclusive(3);
        let store = store(jet);
        let collection = SampleCollection::load(&store, &analysis(), &Selection::nominal(Mode::Tag, jet)).unwrap();
        let up = collection.with_variation(Variation::Up);
        // ttbar 60 * 1.15 + Z 40
        assert!((up.background_correction(Region::A) - 109.0).abs() < 1e-12);
        assert_eq!(up.data_yield(Region::A), 200.0);
    }

    #[test]
    fn stat_errors_add_in_quadrature_over_all_samples() {
        let jet = JetSelection::exclusive(3);
        let store = store(jet);
        let collection = SampleCollection::load(&store, &analysis(), &Selection::nominal(Mode::Tag, jet)).unwrap();
        assert_eq!(collection.combined_stat_error(Region::A), 5.0);
        assert_eq!(collection.combined_stat_error(Region::B), 5.0);
        assert_eq!(collection.combined_stat_error(Region::C), 3.0);
    }
}
