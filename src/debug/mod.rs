//! Debug bundle writer for inspecting store inputs and estimates.

use std::fmt::Write as _;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{AnalysisConfig, Estimate, Mode, Region, Selection, Variation};
use crate::error::AppError;
use crate::estimate::{AbcdEstimator, RegionYieldAccessor, TagRateEstimator};
use crate::store::HistogramStore;

/// Write a markdown bundle under `dir` and return its path.
///
/// Estimator failures are recorded in the bundle instead of aborting it; store
/// failures while reading raw yields still abort.
pub fn write_debug_bundle<S: HistogramStore + ?Sized>(
    store: &S,
    analysis: &AnalysisConfig,
    base: &Selection,
    dir: &Path,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(2, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("abcd_debug_{ts}.md"));
    let text = render_bundle(store, analysis, base)?;

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(2, format!("Failed to create debug file: {e}")))?;
    file.write_all(text.as_bytes())
        .map_err(|e| AppError::new(2, format!("Failed to write debug bundle: {e}")))?;

    Ok(path)
}

fn render_bundle<S: HistogramStore + ?Sized>(
    store: &S,
    analysis: &AnalysisConfig,
    base: &Selection,
) -> Result<String, AppError> {
    let mut out = String::new();
    let _ = writeln!(out, "# abcd debug bundle");
    let _ = writeln!(out, "- generated: {}", Local::now().to_rfc3339());
    let _ = writeln!(out, "- data sample: {}", analysis.data_sample);
    let _ = writeln!(
        out,
        "- br variation: {}",
        if base.br.is_nominal() { "nominal" } else { base.br.as_str() }
    );
    let _ = writeln!(out, "- pretag relative uncertainty: {:.2}", analysis.pretag_relative_uncertainty);

    let _ = writeln!(out, "\n## Nuisances");
    let _ = writeln!(out, "| sample | delta | down | up |");
    let _ = writeln!(out, "| - | - | - | - |");
    for sample in &analysis.background_samples {
        let delta = analysis.nuisance(sample);
        let _ = writeln!(
            out,
            "| {sample} | {delta:.3} | {:.3} | {:.3} |",
            Variation::Down.factor(delta),
            Variation::Up.factor(delta)
        );
    }

    for &jet in &analysis.jet_selections {
        let _ = writeln!(out, "\n## {}", jet.label());

        for mode in Mode::ALL {
            let selection = Selection {
                mode,
                jet,
                ..base.clone()
            };
            let _ = writeln!(out, "\n### {mode} raw yields");
            let _ = writeln!(out, "| sample | A | B | C | D | B*C/A |");
            let _ = writeln!(out, "| - | - | - | - | - | - |");
            for sample in analysis.all_samples() {
                let reader = RegionYieldAccessor::load(store, sample, analysis.nuisance(sample), &selection)?;
                let cells: Vec<String> = Region::ALL
                    .iter()
                    .map(|&r| {
                        let y = reader.raw(r);
                        format!("{:.3} ± {:.3}", y.value, y.stat_error)
                    })
                    .collect();
                let closure = match reader.closure_estimate() {
                    Ok(c) => format!("{c:.3}"),
                    Err(e) => format!("failed: {e}"),
                };
                let _ = writeln!(out, "| {} | {} | {closure} |", reader.sample(), cells.join(" | "));
            }

            let abcd = AbcdEstimator::new(store, analysis, &selection).and_then(|e| e.evaluate());
            let _ = writeln!(out, "\nABCD ({mode}): {}", fmt_result(abcd));
        }

        let selection = Selection { jet, ..base.clone() };
        let rsmt = TagRateEstimator::new(store, analysis, &selection).and_then(|e| e.evaluate());
        let _ = writeln!(out, "Tag rate: {}", fmt_result(rsmt));
    }

    Ok(out)
}

fn fmt_result(result: crate::error::Result<Estimate>) -> String {
    match result {
        Ok(e) => format!(
            "{:.3} ± {:.3} (stat) ± {:.3} (syst)",
            e.central, e.stat_error, e.syst_error
        ),
        Err(e) => format!("failed: {e}"),
    }
}
