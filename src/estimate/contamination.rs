//! Fraction of the observed yield attributed to one simulated sample.

use crate::domain::{AnalysisConfig, Region, RegionYield, SampleId, Selection};
use crate::error::{EstimateError, Result};
use crate::estimate::{RegionYieldAccessor, ensure_finite, nonzero};
use crate::store::HistogramStore;

/// `100 * sample / data` in percent, with relative errors added in quadrature.
pub fn contamination(sample: RegionYield, data: RegionYield) -> Result<RegionYield> {
    let data_value = nonzero(data.value, "the contamination (zero data yield)")?;
    let sample_value = nonzero(sample.value, "the contamination error (zero sample yield)")?;

    let percent = 100.0 * sample_value / data_value;
    let sample_sigma = sample.stat_error / sample_value;
    let data_sigma = data.stat_error / data_value;
    let error = percent * (sample_sigma * sample_sigma + data_sigma * data_sigma).sqrt();

    Ok(RegionYield {
        value: ensure_finite(percent, "the contamination")?,
        stat_error: ensure_finite(error, "the contamination error")?,
    })
}

/// Contamination of `sample` in every region (A..D) for one selection.
///
/// Uses unshifted store values regardless of `selection.variation`.
pub fn contamination_by_region<S: HistogramStore + ?Sized>(
    store: &S,
    analysis: &AnalysisConfig,
    sample: &SampleId,
    selection: &Selection,
) -> Result<[RegionYield; 4]> {
    if *sample == analysis.data_sample {
        return Err(EstimateError::Configuration(format!(
            "contamination of '{sample}' relative to itself is not defined"
        )));
    }
    let data = RegionYieldAccessor::load(store, &analysis.data_sample, 0.0, selection)?;
    let simulated = RegionYieldAccessor::load(store, sample, analysis.nuisance(sample), selection)?;

    let mut out = [RegionYield::default(); 4];
    for region in Region::ALL {
        out[region.index()] = contamination(simulated.raw(region), data.raw(region))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JetSelection, Mode};
    use crate::store::MemoryStore;
    use approx::assert_relative_eq;

    #[test]
    fn percent_and_quadrature_error() {
        let c = contamination(
            RegionYield { value: 25.0, stat_error: 2.5 },
            RegionYield { value: 100.0, stat_error: 10.0 },
        )
        .unwrap();
        assert_eq!(c.value, 25.0);
        assert_relative_eq!(c.stat_error, 25.0 * (0.02_f64).sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn zero_data_yield_is_division_by_zero() {
        let err = contamination(
            RegionYield { value: 1.0, stat_error: 0.0 },
            RegionYield { value: 0.0, stat_error: 0.0 },
        )
        .unwrap_err();
        assert!(matches!(err, EstimateError::DivisionByZero(_)));
    }

    #[test]
    fn table_covers_all_regions() {
        let jet = JetSelection::exclusive(2);
        let mut store = MemoryStore::new();
        store.insert_regions(&"dataAllEgamma".into(), Mode::Pretag, jet, [100.0, 200.0, 400.0, 800.0], [0.0; 4]);
        store.insert_regions(&"Zjets".into(), Mode::Pretag, jet, [10.0, 10.0, 10.0, 10.0], [0.0; 4]);

        let table = contamination_by_region(
            &store,
            &AnalysisConfig::default(),
            &SampleId::new("Zjets"),
            &Selection::nominal(Mode::Pretag, jet),
        )
        .unwrap();
        let percents: Vec<f64> = table.iter().map(|c| c.value).collect();
        assert_eq!(percents, vec![10.0, 5.0, 2.5, 1.25]);
    }
}
