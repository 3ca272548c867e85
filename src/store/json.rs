//! File-backed histogram store.
//!
//! Each sample lives in `<dir>/<sample>.json`:
//!
//! ```json
//! { "sample": "ttbarSig",
//!   "histograms": { "h_njet_pretag_A": { "bin_content": [..], "sumw2": [..] }, .. } }
//! ```
//!
//! `bin_content[i]` is the yield with exactly `i` jets. `sumw2` is optional; without
//! it the error of a bin is `sqrt(content)`, as for unweighted counts.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{JetSelection, RegionYield, SampleId};
use crate::error::{AppError, EstimateError, Result};
use crate::store::{HistogramStore, YieldKey, histogram_name};

/// Jet-multiplicity histogram for one sample/mode/region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetHistogram {
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin, if stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sumw2: Option<Vec<f64>>,
}

impl JetHistogram {
    /// `None` when `sumw2` is present but lacks the bin.
    fn variance(&self, idx: usize) -> Option<f64> {
        match &self.sumw2 {
            Some(w2) => w2.get(idx).copied(),
            None => self.bin_content.get(idx).map(|v| v.abs()),
        }
    }

    /// `sumw2`, when stored, must cover every bin.
    pub fn is_consistent(&self) -> bool {
        self.sumw2
            .as_ref()
            .is_none_or(|w2| w2.len() == self.bin_content.len())
    }

    /// Yield and error for a jet selection, or `None` if the bin (or its
    /// `sumw2` entry) is not stored.
    pub fn integral(&self, jet: JetSelection) -> Option<RegionYield> {
        let first = jet.bin as usize;
        if first >= self.bin_content.len() {
            return None;
        }
        let last = if jet.inclusive { self.bin_content.len() } else { first + 1 };

        let value: f64 = self.bin_content[first..last].iter().sum();
        let variance = (first..last).map(|i| self.variance(i)).sum::<Option<f64>>()?;
        Some(RegionYield {
            value,
            stat_error: variance.sqrt(),
        })
    }
}

/// Contents of one sample file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleFile {
    pub sample: SampleId,
    pub histograms: BTreeMap<String, JetHistogram>,
}

#[derive(Debug, Clone)]
pub struct JsonHistogramStore {
    dir: PathBuf,
    samples: HashMap<SampleId, SampleFile>,
}

impl JsonHistogramStore {
    /// Load every listed sample eagerly; a missing or malformed file aborts the open.
    pub fn open<'a>(dir: &Path, samples: impl IntoIterator<Item = &'a SampleId>) -> Result<Self> {
        let mut loaded = HashMap::new();
        for sample in samples {
            let path = sample_path(dir, sample);
            let file = File::open(&path).map_err(|e| {
                EstimateError::ResourceUnavailable(format!("sample file '{}': {e}", path.display()))
            })?;
            let contents: SampleFile = serde_json::from_reader(file).map_err(|e| {
                EstimateError::ResourceUnavailable(format!("sample file '{}' is not valid: {e}", path.display()))
            })?;
            if let Some((name, _)) = contents.histograms.iter().find(|(_, h)| !h.is_consistent()) {
                return Err(EstimateError::ResourceUnavailable(format!(
                    "histogram '{name}' in '{}' has sumw2 and bin_content of different lengths",
                    path.display()
                )));
            }
            info!(sample = %sample, histograms = contents.histograms.len(), "loaded sample");
            loaded.insert(sample.clone(), contents);
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            samples: loaded,
        })
    }

    /// Write a sample file into `dir` (used by the synthetic generator).
    pub fn write_sample(dir: &Path, contents: &SampleFile) -> std::result::Result<PathBuf, AppError> {
        let path = sample_path(dir, &contents.sample);
        let file = File::create(&path)
            .map_err(|e| AppError::new(2, format!("Failed to create sample file '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(file, contents)
            .map_err(|e| AppError::new(2, format!("Failed to write sample file: {e}")))?;
        Ok(path)
    }

    fn lookup(&self, key: &YieldKey<'_>) -> Result<RegionYield> {
        let sample = self.samples.get(key.sample).ok_or_else(|| {
            EstimateError::ResourceUnavailable(format!("sample '{}' was not loaded from '{}'", key.sample, self.dir.display()))
        })?;
        let name = histogram_name(key.mode, key.region, key.br);
        let histogram = sample.histograms.get(&name).ok_or_else(|| {
            EstimateError::ResourceUnavailable(format!("histogram '{name}' missing for sample '{}'", key.sample))
        })?;
        histogram.integral(key.jet).ok_or_else(|| {
            EstimateError::ResourceUnavailable(format!(
                "histogram '{name}' of sample '{}' has no bin for {}",
                key.sample,
                key.jet.label()
            ))
        })
    }
}

impl HistogramStore for JsonHistogramStore {
    fn yield_value(&self, key: &YieldKey<'_>) -> Result<f64> {
        self.lookup(key).map(|y| y.value)
    }

    fn yield_error(&self, key: &YieldKey<'_>) -> Result<f64> {
        self.lookup(key).map(|y| y.stat_error)
    }
}

fn sample_path(dir: &Path, sample: &SampleId) -> PathBuf {
    dir.join(format!("{}.json", sample.as_str()))
}
