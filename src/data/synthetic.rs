//! Synthetic histogram store generation.
//!
//! Produces a self-consistent store for demos and smoke runs:
//!
//! - each background gets a falling jet-multiplicity spectrum, a region split
//!   and a tag efficiency, drawn once from the seeded RNG
//! - simulated counts are Poisson draws of `mu / weight`, stored with `sumw2`
//! - data is a Poisson draw of all backgrounds plus a QCD-like component that
//!   satisfies the closure relation `D = B * C / A` exactly in expectation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Poisson;
use tracing::info;

use crate::domain::{AnalysisConfig, BrVariation, Mode, Region, SampleId};
use crate::error::AppError;
use crate::store::{JetHistogram, JsonHistogramStore, SampleFile, histogram_name};

/// Knobs for the generator.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub seed: u64,
    /// Number of jet bins (`0..n_bins` jets).
    pub n_bins: usize,
    /// Expected pretag QCD yield in regions A, B, C (D follows from closure).
    pub qcd_pretag: [f64; 3],
    pub qcd_tag_rate: f64,
    /// Per-event weight of the simulated samples.
    pub mc_weight: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_bins: 8,
            qcd_pretag: [60000.0, 20000.0, 15000.0],
            qcd_tag_rate: 0.06,
            mc_weight: 0.4,
        }
    }
}

/// Expected yields of one process: `[mode][region][jet]`.
type Expectation = [[Vec<f64>; 4]; 2];

fn mode_index(mode: Mode) -> usize {
    match mode {
        Mode::Pretag => 0,
        Mode::Tag => 1,
    }
}

/// Falling jet spectrum normalized to 1 over `n_bins`.
fn jet_shape(n_bins: usize, slope: f64) -> Vec<f64> {
    let raw: Vec<f64> = (0..n_bins).map(|j| (-(j as f64) / slope).exp()).collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|v| v / total).collect()
}

fn expectation(total: f64, shares: [f64; 4], shape: &[f64], tag_eff: f64) -> Expectation {
    let per_region = |scale: f64, region: usize| -> Vec<f64> {
        shape.iter().map(|s| total * shares[region] * s * scale).collect()
    };
    [
        std::array::from_fn(|r| per_region(1.0, r)),
        std::array::from_fn(|r| per_region(tag_eff, r)),
    ]
}

fn background_expectation(rng: &mut StdRng, n_bins: usize) -> Expectation {
    let total = rng.gen_range(500.0..8000.0);
    let mut shares = [
        rng.gen_range(0.02..0.08),
        rng.gen_range(0.05..0.2),
        rng.gen_range(0.05..0.2),
        0.0,
    ];
    shares[3] = 1.0 - shares[0] - shares[1] - shares[2];
    let slope = rng.gen_range(0.8..3.0);
    let tag_eff = rng.gen_range(0.05..0.6);
    expectation(total, shares, &jet_shape(n_bins, slope), tag_eff)
}

fn qcd_expectation(config: &SynthConfig) -> Expectation {
    let [a, b, c] = config.qcd_pretag;
    let d = b * c / a;
    let total = a + b + c + d;
    let shares = [a / total, b / total, c / total, d / total];
    expectation(total, shares, &jet_shape(config.n_bins, 1.2), config.qcd_tag_rate)
}

fn poisson(rng: &mut StdRng, mean: f64) -> f64 {
    if mean <= 0.0 {
        return 0.0;
    }
    match Poisson::new(mean) {
        Ok(dist) => dist.sample(rng),
        Err(_) => 0.0,
    }
}

fn sample_file(sample: &SampleId, histograms: BTreeMap<String, JetHistogram>) -> SampleFile {
    SampleFile {
        sample: sample.clone(),
        histograms,
    }
}

/// Generate one file per configured sample (data first).
pub fn generate_samples(analysis: &AnalysisConfig, config: &SynthConfig) -> Result<Vec<SampleFile>, AppError> {
    if config.n_bins < 2 {
        return Err(AppError::new(2, "Synthetic store needs at least 2 jet bins."));
    }
    if !(config.mc_weight.is_finite() && config.mc_weight > 0.0) {
        return Err(AppError::new(2, "MC weight must be finite and > 0."));
    }
    if config.qcd_pretag.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
        return Err(AppError::new(2, "QCD pretag yields must be finite and > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let br = BrVariation::nominal();
    let mut files = Vec::with_capacity(analysis.background_samples.len() + 1);

    let mut data_mu = qcd_expectation(config);
    for sample in &analysis.background_samples {
        let mu = background_expectation(&mut rng, config.n_bins);
        let mut histograms = BTreeMap::new();
        for mode in Mode::ALL {
            for region in Region::ALL {
                let expected = &mu[mode_index(mode)][region.index()];
                let counts: Vec<f64> = expected
                    .iter()
                    .map(|m| poisson(&mut rng, m / config.mc_weight))
                    .collect();
                histograms.insert(
                    histogram_name(mode, region, &br),
                    JetHistogram {
                        bin_content: counts.iter().map(|n| n * config.mc_weight).collect(),
                        sumw2: Some(counts.iter().map(|n| n * config.mc_weight * config.mc_weight).collect()),
                    },
                );

                let target = &mut data_mu[mode_index(mode)][region.index()];
                for (acc, m) in target.iter_mut().zip(expected) {
                    *acc += m;
                }
            }
        }
        files.push(sample_file(sample, histograms));
    }

    let mut histograms = BTreeMap::new();
    for mode in Mode::ALL {
        for region in Region::ALL {
            let counts = data_mu[mode_index(mode)][region.index()]
                .iter()
                .map(|m| poisson(&mut rng, *m))
                .collect();
            histograms.insert(
                histogram_name(mode, region, &br),
                JetHistogram {
                    bin_content: counts,
                    sumw2: None,
                },
            );
        }
    }
    files.insert(0, sample_file(&analysis.data_sample, histograms));

    Ok(files)
}

/// Generate and write a store directory; returns the written paths.
pub fn write_store(dir: &Path, analysis: &AnalysisConfig, config: &SynthConfig) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create store dir '{}': {e}", dir.display())))?;

    let files = generate_samples(analysis, config)?;
    let mut paths = Vec::with_capacity(files.len());
    for file in &files {
        let path = JsonHistogramStore::write_sample(dir, file)?;
        info!(sample = %file.sample, path = %path.display(), "wrote synthetic sample");
        paths.push(path);
    }
    Ok(paths)
}
