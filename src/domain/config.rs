//! Injectable analysis constants.
//!
//! The sample list, per-sample nuisance magnitudes and the pretag-estimate table
//! are configuration, not code. Defaults reproduce the electron-channel analysis;
//! a JSON file can override any field.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Estimate, JetSelection, SampleId};
use crate::error::{AppError, EstimateError};

/// One row of the externally supplied pretag-estimate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretagEntry {
    pub jet_bin: u32,
    #[serde(default)]
    pub inclusive: bool,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data_sample: SampleId,
    pub background_samples: Vec<SampleId>,
    /// Fractional yield uncertainty per sample; absent samples are unshifted.
    pub nuisances: BTreeMap<SampleId, f64>,
    pub pretag_estimates: Vec<PretagEntry>,
    /// Relative uncertainty carried by every pretag-table constant.
    pub pretag_relative_uncertainty: f64,
    /// Jet selections reported by multi-bin runs, in display order.
    pub jet_selections: Vec<JetSelection>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let pretag = [110678.0, 29323.0, 7924.0, 2377.0, 3434.0];
        let mut pretag_estimates: Vec<PretagEntry> = pretag
            .iter()
            .enumerate()
            .map(|(idx, &value)| PretagEntry {
                jet_bin: idx as u32 + 1,
                inclusive: false,
                value,
            })
            .collect();
        pretag_estimates.push(PretagEntry {
            jet_bin: 3,
            inclusive: true,
            value: pretag[2] + pretag[4],
        });
        pretag_estimates.push(PretagEntry {
            jet_bin: 4,
            inclusive: true,
            value: pretag[4],
        });

        Self {
            data_sample: SampleId::new("dataAllEgamma"),
            background_samples: ["ttbarSig", "WJetsScaled", "Zjets", "singleTop", "diBoson"]
                .into_iter()
                .map(SampleId::new)
                .collect(),
            nuisances: BTreeMap::from([
                (SampleId::new("ttbarSig"), 0.15),
                (SampleId::new("WJetsScaled"), 0.25),
            ]),
            pretag_estimates,
            pretag_relative_uncertainty: 0.5,
            jet_selections: vec![
                JetSelection::exclusive(1),
                JetSelection::exclusive(2),
                JetSelection::exclusive(3),
                JetSelection::exclusive(4),
                JetSelection::inclusive(3),
                JetSelection::inclusive(4),
            ],
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON configuration file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open config '{}': {e}", path.display())))?;
        let config: AnalysisConfig =
            serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EstimateError> {
        if self.background_samples.contains(&self.data_sample) {
            return Err(EstimateError::Configuration(format!(
                "data sample '{}' is also listed as a background",
                self.data_sample
            )));
        }
        for (sample, delta) in &self.nuisances {
            if !(delta.is_finite() && *delta >= 0.0) {
                return Err(EstimateError::Configuration(format!(
                    "nuisance for '{sample}' must be finite and >= 0 (got {delta})"
                )));
            }
        }
        if !(self.pretag_relative_uncertainty.is_finite() && self.pretag_relative_uncertainty >= 0.0) {
            return Err(EstimateError::Configuration(
                "pretag_relative_uncertainty must be finite and >= 0".to_string(),
            ));
        }
        if let Some(jet) = self.jet_selections.iter().find(|j| j.bin == 0) {
            return Err(EstimateError::Configuration(format!(
                "jet bins start at 1 (got {})",
                jet.label()
            )));
        }
        Ok(())
    }

    /// Every configured sample, data first.
    pub fn all_samples(&self) -> impl Iterator<Item = &SampleId> {
        std::iter::once(&self.data_sample).chain(self.background_samples.iter())
    }

    /// Fractional uncertainty for `sample` (0 for samples without an entry).
    pub fn nuisance(&self, sample: &SampleId) -> f64 {
        self.nuisances.get(sample).copied().unwrap_or(0.0)
    }

    pub fn pretag_estimate(&self, jet: JetSelection) -> Result<f64, EstimateError> {
        self.pretag_estimates
            .iter()
            .find(|e| e.jet_bin == jet.bin && e.inclusive == jet.inclusive)
            .map(|e| e.value)
            .ok_or_else(|| {
                EstimateError::Configuration(format!("no pretag estimate configured for {}", jet.label()))
            })
    }

    /// The pretag constant with its fixed relative uncertainty as the statistical error.
    pub fn pretag_evaluate(&self, jet: JetSelection) -> Result<Estimate, EstimateError> {
        let central = self.pretag_estimate(jet)?;
        Ok(Estimate {
            central,
            stat_error: central * self.pretag_relative_uncertainty,
            syst_error: 0.0,
        })
    }
}
