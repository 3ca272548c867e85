//! ABCD closure estimator.
//!
//! The background-subtracted yields of the control regions predict the target:
//!
//! `D = B * C / A`
//!
//! The systematic error is the envelope of the estimate under the up/down
//! nuisance variations. Siblings reuse the cached yields, so the store is read
//! exactly once per estimator.

use tracing::{debug, info};

use crate::domain::{AnalysisConfig, Estimate, Region, Selection, Variation};
use crate::error::Result;
use crate::estimate::{SampleCollection, ensure_finite, nonzero};
use crate::store::HistogramStore;

#[derive(Debug, Clone, PartialEq)]
pub struct AbcdEstimator {
    samples: SampleCollection,
}

impl AbcdEstimator {
    pub fn new<S: HistogramStore + ?Sized>(
        store: &S,
        analysis: &AnalysisConfig,
        selection: &Selection,
    ) -> Result<Self> {
        let samples = SampleCollection::load(store, analysis, selection)?;
        Ok(Self { samples })
    }

    /// An estimator identical in every field except the systematic variation.
    pub fn sibling(&self, variation: Variation) -> Self {
        Self {
            samples: self.samples.with_variation(variation),
        }
    }

    pub fn selection(&self) -> &Selection {
        self.samples.selection()
    }

    /// `"3 jet inc (tag)"`.
    pub fn label(&self) -> String {
        let selection = self.selection();
        format!("{} ({})", selection.jet.label(), selection.mode)
    }

    pub fn data_yield(&self, region: Region) -> f64 {
        self.samples.data_yield(region)
    }

    pub fn background_correction(&self, region: Region) -> f64 {
        self.samples.background_correction(region)
    }

    pub fn corrected_yield(&self, region: Region) -> f64 {
        self.samples.corrected_yield(region)
    }

    pub fn combined_stat_error(&self, region: Region) -> f64 {
        self.samples.combined_stat_error(region)
    }

    pub fn estimate(&self) -> Result<f64> {
        let a = nonzero(self.corrected_yield(Region::A), "the corrected yield of region A")?;
        let b = self.corrected_yield(Region::B);
        let c = self.corrected_yield(Region::C);
        ensure_finite(b * c / a, "the ABCD estimate")
    }

    /// `estimate * sqrt(eB/corrB² + eC/corrC² + eA/corrA²)`.
    ///
    /// The error enters linearly over the squared corrected yield.
    pub fn stat_error(&self) -> Result<f64> {
        let estimate = self.estimate()?;

        let mut sum = 0.0;
        for region in [Region::B, Region::C, Region::A] {
            let corrected = self.data_yield(region) - self.background_correction(region);
            let corrected = nonzero(corrected, &format!("the corrected yield of region {region}"))?;
            sum += self.combined_stat_error(region) / (corrected * corrected);
        }
        ensure_finite(estimate * sum.sqrt(), "the ABCD statistical error")
    }

    /// Larger absolute deviation of the up/down siblings from this estimate.
    pub fn syst_error(&self) -> Result<f64> {
        let nominal = self.estimate()?;
        let up = self.sibling(Variation::Up).estimate()?;
        let down = self.sibling(Variation::Down).estimate()?;
        debug!(nominal, up, down, "ABCD systematic envelope");
        Ok((up - nominal).abs().max((down - nominal).abs()))
    }

    pub fn evaluate(&self) -> Result<Estimate> {
        let estimate = Estimate {
            central: self.estimate()?,
            stat_error: self.stat_error()?,
            syst_error: self.syst_error()?,
        };
        info!(
            label = %self.label(),
            central = estimate.central,
            stat = estimate.stat_error,
            syst = estimate.syst_error,
            "ABCD estimate"
        );
        Ok(estimate)
    }
}
