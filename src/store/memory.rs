//! In-memory histogram store keyed by the full yield coordinates.

use std::collections::HashMap;

use crate::domain::{BrVariation, JetSelection, Mode, Region, RegionYield, SampleId};
use crate::error::{EstimateError, Result};
use crate::store::{HistogramStore, YieldKey};

type Key = (SampleId, Mode, Region, JetSelection, BrVariation);

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<Key, RegionYield>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        sample: &SampleId,
        mode: Mode,
        region: Region,
        jet: JetSelection,
        br: &BrVariation,
        value: RegionYield,
    ) {
        self.entries
            .insert((sample.clone(), mode, region, jet, br.clone()), value);
    }

    /// Set all four regions of one sample at once; `values` and `errors` are in A..D order.
    pub fn insert_regions(
        &mut self,
        sample: &SampleId,
        mode: Mode,
        jet: JetSelection,
        values: [f64; 4],
        errors: [f64; 4],
    ) {
        let br = BrVariation::nominal();
        for region in Region::ALL {
            let i = region.index();
            self.insert(
                sample,
                mode,
                region,
                jet,
                &br,
                RegionYield {
                    value: values[i],
                    stat_error: errors[i],
                },
            );
        }
    }

    fn get(&self, key: &YieldKey<'_>) -> Result<RegionYield> {
        self.entries
            .get(&(key.sample.clone(), key.mode, key.region, key.jet, key.br.clone()))
            .copied()
            .ok_or_else(|| {
                EstimateError::ResourceUnavailable(format!(
                    "no {} yield for sample '{}' region {} ({})",
                    key.mode,
                    key.sample,
                    key.region,
                    key.jet.label()
                ))
            })
    }
}

impl HistogramStore for MemoryStore {
    fn yield_value(&self, key: &YieldKey<'_>) -> Result<f64> {
        self.get(key).map(|y| y.value)
    }

    fn yield_error(&self, key: &YieldKey<'_>) -> Result<f64> {
        self.get(key).map(|y| y.stat_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entries_are_unavailable() {
        let mut store = MemoryStore::new();
        let sample = SampleId::new("ttbarSig");
        let jet = JetSelection::exclusive(3);
        store.insert_regions(&sample, Mode::Tag, jet, [1.0, 2.0, 3.0, 4.0], [0.1, 0.2, 0.3, 0.4]);

        let br = BrVariation::nominal();
        let key = YieldKey {
            sample: &sample,
            mode: Mode::Tag,
            region: Region::C,
            jet,
            br: &br,
        };
        assert_eq!(store.yield_value(&key).unwrap(), 3.0);
        assert_eq!(store.yield_error(&key).unwrap(), 0.3);

        let pretag = YieldKey { mode: Mode::Pretag, ..key };
        assert!(matches!(store.yield_value(&pretag), Err(EstimateError::ResourceUnavailable(_))));
    }
}
