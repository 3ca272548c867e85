//! Shared estimation pipeline used by the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! config -> store -> estimators per selection -> records
//!
//! The command handlers can then focus on presentation.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::domain::{
    AnalysisConfig, BrVariation, EstimateRecord, JetSelection, Method, Mode, Region, RegionYield, SampleId,
    Selection,
};
use crate::error::AppError;
use crate::estimate::{AbcdEstimator, RateSummary, RateValue, RegionYieldAccessor, TagRateEstimator, contamination_by_region};
use crate::report::YieldRow;
use crate::store::{HistogramStore, JsonHistogramStore};

/// Environment variable naming the default store directory.
pub const STORE_DIR_ENV: &str = "ABCD_STORE_DIR";

/// One row of the contamination table.
pub type RegionRow = (JetSelection, Mode, [RegionYield; 4]);

/// Load the analysis configuration, or the built-in defaults when no file is given.
pub fn load_analysis(path: Option<&Path>) -> Result<AnalysisConfig, AppError> {
    match path {
        Some(path) => AnalysisConfig::load(path),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Resolve the store directory from the flag, then `ABCD_STORE_DIR` (environment or `.env`).
pub fn resolve_store_dir(flag: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    dotenvy::dotenv().ok();
    std::env::var(STORE_DIR_ENV)
        .map(PathBuf::from)
        .map_err(|_| AppError::new(2, format!("No store given: pass --store or set {STORE_DIR_ENV} (.env).")))
}

pub fn open_store(flag: Option<&Path>, analysis: &AnalysisConfig) -> Result<JsonHistogramStore, AppError> {
    let dir = resolve_store_dir(flag)?;
    Ok(JsonHistogramStore::open(&dir, analysis.all_samples())?)
}

/// The single requested selection, or one per configured jet selection.
pub fn selections(analysis: &AnalysisConfig, base: &Selection, all_bins: bool) -> Vec<Selection> {
    if !all_bins {
        return vec![base.clone()];
    }
    analysis
        .jet_selections
        .iter()
        .map(|&jet| Selection { jet, ..base.clone() })
        .collect()
}

/// ABCD estimates, one record per selection, in input order.
pub fn run_abcd<S: HistogramStore + Sync + ?Sized>(
    store: &S,
    analysis: &AnalysisConfig,
    selections: &[Selection],
) -> Result<Vec<EstimateRecord>, AppError> {
    let records = selections
        .par_iter()
        .map(|selection| -> Result<EstimateRecord, AppError> {
            let estimator = AbcdEstimator::new(store, analysis, selection)?;
            Ok(EstimateRecord {
                method: Method::Abcd,
                label: estimator.label(),
                estimate: estimator.evaluate()?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    info!(count = records.len(), "ABCD run complete");
    Ok(records)
}

/// Tag-rate estimates, one record per selection, in input order.
pub fn run_tag_rate<S: HistogramStore + Sync + ?Sized>(
    store: &S,
    analysis: &AnalysisConfig,
    selections: &[Selection],
) -> Result<Vec<EstimateRecord>, AppError> {
    selections
        .par_iter()
        .map(|selection| -> Result<EstimateRecord, AppError> {
            let estimator = TagRateEstimator::new(store, analysis, selection)?;
            Ok(EstimateRecord {
                method: Method::TagRate,
                label: estimator.label(),
                estimate: estimator.evaluate()?,
            })
        })
        .collect()
}

/// The pretag-table constants; no histograms are read.
pub fn run_pretag(analysis: &AnalysisConfig, selections: &[Selection]) -> Result<Vec<EstimateRecord>, AppError> {
    selections
        .iter()
        .map(|selection| -> Result<EstimateRecord, AppError> {
            Ok(EstimateRecord {
                method: Method::Pretag,
                label: selection.jet.label(),
                estimate: analysis.pretag_evaluate(selection.jet)?,
            })
        })
        .collect()
}

/// Per-region rate summaries, labelled by jet selection.
pub fn run_rates<S: HistogramStore + Sync + ?Sized>(
    store: &S,
    analysis: &AnalysisConfig,
    selections: &[Selection],
) -> Result<Vec<(String, RateSummary)>, AppError> {
    selections
        .par_iter()
        .map(|selection| -> Result<(String, RateSummary), AppError> {
            let estimator = TagRateEstimator::new(store, analysis, selection)?;
            Ok((estimator.label(), estimator.rate_summary()?))
        })
        .collect()
}

/// One control region's tag rate per selection.
pub fn run_region_rates<S: HistogramStore + Sync + ?Sized>(
    store: &S,
    analysis: &AnalysisConfig,
    selections: &[Selection],
    region: Region,
) -> Result<Vec<(String, RateValue)>, AppError> {
    selections
        .par_iter()
        .map(|selection| -> Result<(String, RateValue), AppError> {
            let estimator = TagRateEstimator::new(store, analysis, selection)?;
            Ok((estimator.label(), estimator.rate_value(region)?))
        })
        .collect()
}

/// Raw region yields of `sample` for every configured jet selection and mode.
///
/// A sample with an empty region A gets no closure estimate instead of failing the table.
pub fn region_yield_rows<S: HistogramStore + ?Sized>(
    store: &S,
    analysis: &AnalysisConfig,
    sample: &SampleId,
    br: &BrVariation,
) -> Result<Vec<YieldRow>, AppError> {
    let mut rows = Vec::new();
    for &jet in &analysis.jet_selections {
        for mode in Mode::ALL {
            let selection = Selection {
                br: br.clone(),
                ..Selection::nominal(mode, jet)
            };
            let reader = RegionYieldAccessor::load(store, sample, analysis.nuisance(sample), &selection)?;
            rows.push(YieldRow {
                jet,
                mode,
                yields: Region::ALL.map(|r| reader.raw(r)),
                closure: reader.closure_estimate().ok(),
            });
        }
    }
    Ok(rows)
}

/// Contamination of `sample` for every configured jet selection and mode.
pub fn contamination_rows<S: HistogramStore + ?Sized>(
    store: &S,
    analysis: &AnalysisConfig,
    sample: &SampleId,
    br: &BrVariation,
) -> Result<Vec<RegionRow>, AppError> {
    let mut rows = Vec::new();
    for &jet in &analysis.jet_selections {
        for mode in Mode::ALL {
            let selection = Selection {
                br: br.clone(),
                ..Selection::nominal(mode, jet)
            };
            rows.push((jet, mode, contamination_by_region(store, analysis, sample, &selection)?));
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn data_only(jets: Vec<JetSelection>) -> AnalysisConfig {
        AnalysisConfig {
            background_samples: Vec::new(),
            jet_selections: jets,
            ..AnalysisConfig::default()
        }
    }

    fn store_for(jets: &[JetSelection]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (i, &jet) in jets.iter().enumerate() {
            let scale = (i + 1) as f64;
            for mode in Mode::ALL {
                store.insert_regions(
                    &"dataAllEgamma".into(),
                    mode,
                    jet,
                    [100.0 * scale, 50.0 * scale, 40.0 * scale, 0.0],
                    [0.0; 4],
                );
            }
        }
        store
    }

    #[test]
    fn all_bins_follows_config_order() {
        let jets = vec![JetSelection::exclusive(3), JetSelection::inclusive(4)];
        let analysis = data_only(jets.clone());
        let base = Selection::nominal(Mode::Tag, JetSelection::exclusive(1));

        assert_eq!(selections(&analysis, &base, false), vec![base.clone()]);

        let all = selections(&analysis, &base, true);
        assert_eq!(all.iter().map(|s| s.jet).collect::<Vec<_>>(), jets);
        assert!(all.iter().all(|s| s.mode == Mode::Tag));
    }

    #[test]
    fn abcd_records_keep_selection_order() {
        let jets = vec![JetSelection::exclusive(3), JetSelection::inclusive(4)];
        let analysis = data_only(jets.clone());
        let store = store_for(&jets);
        let sels = selections(&analysis, &Selection::nominal(Mode::Tag, jets[0]), true);

        let records = run_abcd(&store, &analysis, &sels).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, "3 jet (tag)");
        assert_eq!(records[0].estimate.central, 20.0);
        assert_eq!(records[1].label, "4 jet inc (tag)");
        assert_eq!(records[1].estimate.central, 40.0);
        assert!(records.iter().all(|r| r.method == Method::Abcd));
    }

    #[test]
    fn one_failing_selection_fails_the_run() {
        let jets = vec![JetSelection::exclusive(3), JetSelection::exclusive(5)];
        let analysis = data_only(jets.clone());
        let store = store_for(&jets[..1]);
        let sels = selections(&analysis, &Selection::nominal(Mode::Tag, jets[0]), true);
        assert_eq!(run_abcd(&store, &analysis, &sels).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn tag_rate_and_pretag_records() {
        let jet = JetSelection::inclusive(3);
        let analysis = data_only(vec![jet]);
        let mut store = MemoryStore::new();
        store.insert_regions(&"dataAllEgamma".into(), Mode::Pretag, jet, [1000.0, 500.0, 400.0, 0.0], [0.0; 4]);
        store.insert_regions(&"dataAllEgamma".into(), Mode::Tag, jet, [100.0, 50.0, 40.0, 0.0], [0.0; 4]);
        let sels = vec![Selection::nominal(Mode::Tag, jet)];

        let pretag = run_pretag(&analysis, &sels).unwrap();
        assert_eq!(pretag[0].estimate.central, 11358.0);
        assert_eq!(pretag[0].estimate.stat_error, 5679.0);

        let records = run_tag_rate(&store, &analysis, &sels).unwrap();
        assert_eq!(records[0].method, Method::TagRate);
        assert_eq!(records[0].label, "3 jet inc");
        approx::assert_relative_eq!(records[0].estimate.central, 1135.8, max_relative = 1e-12);

        let rates = run_rates(&store, &analysis, &sels).unwrap();
        assert_eq!(rates[0].1.regions.len(), 3);

        let b = run_region_rates(&store, &analysis, &sels, Region::B).unwrap();
        assert_eq!(b[0].1.rate, 0.1);
        let err = run_region_rates(&store, &analysis, &sels, Region::D).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn yield_rows_cover_every_jet_and_mode() {
        let jets = vec![JetSelection::exclusive(3)];
        let analysis = data_only(jets.clone());
        let store = store_for(&jets);
        let rows = region_yield_rows(&store, &analysis, &analysis.data_sample, &BrVariation::nominal()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mode, Mode::Pretag);
        assert_eq!(rows[1].yields[0].value, 100.0);
        assert_eq!(rows[1].closure, Some(20.0));
    }

    #[test]
    fn explicit_store_flag_wins() {
        let dir = resolve_store_dir(Some(Path::new("/tmp/store"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/store"));
    }
}
