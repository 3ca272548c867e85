//! Tag-rate (matrix method, RSMT) estimator.
//!
//! The tag rate `r = tagged / pretag` is measured in the control regions A, B and
//! C after background subtraction, averaged, and applied to an externally
//! supplied pretag yield:
//!
//! `tag_estimate = pretag_estimate * mean(r_A, r_B, r_C)`

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{AnalysisConfig, Estimate, JetSelection, Mode, Region, Selection, Variation};
use crate::error::{EstimateError, Result};
use crate::estimate::{SampleCollection, ensure_finite, nonzero};
use crate::store::HistogramStore;

/// A rate with its statistical and systematic errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateValue {
    pub rate: f64,
    pub stat_error: f64,
    pub syst_error: f64,
}

/// Per-region rates (A, B, C) and their combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSummary {
    pub regions: Vec<(Region, RateValue)>,
    pub weighted: RateValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagRateEstimator {
    pretag: SampleCollection,
    tagged: SampleCollection,
    pretag_table: Option<Estimate>,
    pretag_relative_uncertainty: f64,
}

impl TagRateEstimator {
    /// Load pretag and tagged accessors for every sample; `selection.mode` is ignored.
    pub fn new<S: HistogramStore + ?Sized>(
        store: &S,
        analysis: &AnalysisConfig,
        selection: &Selection,
    ) -> Result<Self> {
        let pretag = SampleCollection::load(store, analysis, &selection.with_mode(Mode::Pretag))?;
        let tagged = SampleCollection::load(store, analysis, &selection.with_mode(Mode::Tag))?;
        Ok(Self {
            pretag,
            tagged,
            pretag_table: analysis.pretag_evaluate(selection.jet).ok(),
            pretag_relative_uncertainty: analysis.pretag_relative_uncertainty,
        })
    }

    pub fn sibling(&self, variation: Variation) -> Self {
        Self {
            pretag: self.pretag.with_variation(variation),
            tagged: self.tagged.with_variation(variation),
            pretag_table: self.pretag_table,
            pretag_relative_uncertainty: self.pretag_relative_uncertainty,
        }
    }

    pub fn jet(&self) -> JetSelection {
        self.tagged.selection().jet
    }

    /// `"3 jet inc"`.
    pub fn label(&self) -> String {
        self.jet().label()
    }

    pub fn collection(&self, mode: Mode) -> &SampleCollection {
        match mode {
            Mode::Pretag => &self.pretag,
            Mode::Tag => &self.tagged,
        }
    }

    pub fn data_yield(&self, mode: Mode, region: Region) -> f64 {
        self.collection(mode).data_yield(region)
    }

    pub fn correction(&self, mode: Mode, region: Region) -> f64 {
        self.collection(mode).background_correction(region)
    }

    pub fn corrected_yield(&self, mode: Mode, region: Region) -> f64 {
        self.collection(mode).corrected_yield(region)
    }

    pub fn region_error(&self, mode: Mode, region: Region) -> f64 {
        self.collection(mode).combined_stat_error(region)
    }

    pub fn tag_rate(&self, region: Region) -> Result<f64> {
        let region = control_region(region)?;
        let pretag = nonzero(
            self.corrected_yield(Mode::Pretag, region),
            &format!("the tag rate of region {region} (zero pretag yield)"),
        )?;
        let rate = self.corrected_yield(Mode::Tag, region) / pretag;
        debug!(region = %region, rate, "tag rate");
        ensure_finite(rate, &format!("the tag rate of region {region}"))
    }

    /// Binomial error on the rate: `sqrt(r(1 - r) / pretag)`.
    pub fn tag_rate_stat_error(&self, region: Region) -> Result<f64> {
        let rate = self.tag_rate(region)?;
        let pretag = self.corrected_yield(Mode::Pretag, region);
        ensure_finite(
            (rate * (1.0 - rate) / pretag).sqrt(),
            &format!("the tag-rate statistical error of region {region}"),
        )
    }

    pub fn tag_rate_syst_error(&self, region: Region) -> Result<f64> {
        let nominal = self.tag_rate(region)?;
        let up = self.sibling(Variation::Up).tag_rate(region)?;
        let down = self.sibling(Variation::Down).tag_rate(region)?;
        Ok((up - nominal).abs().max((down - nominal).abs()))
    }

    fn control_rates(&self) -> Result<[f64; 3]> {
        Ok([
            self.tag_rate(Region::A)?,
            self.tag_rate(Region::B)?,
            self.tag_rate(Region::C)?,
        ])
    }

    /// Unweighted mean of the three control-region rates.
    pub fn weighted_tag_rate(&self) -> Result<f64> {
        let [a, b, c] = self.control_rates()?;
        Ok((a + b + c) / 3.0)
    }

    /// Error on a mean of three independent rates.
    pub fn weighted_tag_rate_stat_error(&self) -> Result<f64> {
        let mut sum = 0.0;
        for region in Region::CONTROL {
            let e = self.tag_rate_stat_error(region)?;
            sum += e * e;
        }
        Ok(((1.0 / 9.0) * sum).sqrt())
    }

    /// Half the fractional spread between the largest and smallest rate.
    pub fn weighted_tag_rate_syst_error(&self) -> Result<f64> {
        let rates = self.control_rates()?;
        let min = rates.iter().copied().fold(f64::INFINITY, f64::min);
        let max = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = nonzero(min, "the tag-rate spread (smallest rate is zero)")?;
        Ok(((max - min) / min) / 2.0)
    }

    /// Table constant for this jet selection; not derived from histograms.
    pub fn pretag_estimate(&self) -> Result<f64> {
        Ok(self.pretag_evaluate()?.central)
    }

    /// The pretag constant with its fixed relative uncertainty as the statistical error.
    pub fn pretag_evaluate(&self) -> Result<Estimate> {
        self.pretag_table.ok_or_else(|| {
            EstimateError::Configuration(format!("no pretag estimate configured for {}", self.label()))
        })
    }

    pub fn tag_estimate(&self) -> Result<f64> {
        Ok(self.pretag_estimate()? * self.weighted_tag_rate()?)
    }

    pub fn tag_estimate_stat_error(&self) -> Result<f64> {
        let rate = nonzero(self.weighted_tag_rate()?, "the tag estimate error (zero mean tag rate)")?;
        Ok(self.tag_estimate()? * (self.weighted_tag_rate_stat_error()? / rate))
    }

    /// Pretag-table uncertainty and rate spread combined in quadrature.
    pub fn tag_estimate_syst_error(&self) -> Result<f64> {
        let u = self.pretag_relative_uncertainty;
        let spread = self.weighted_tag_rate_syst_error()?;
        Ok(self.tag_estimate()? * (u * u + spread * spread).sqrt())
    }

    /// Rate and errors of one control region; D is rejected.
    pub fn rate_value(&self, region: Region) -> Result<RateValue> {
        Ok(RateValue {
            rate: self.tag_rate(region)?,
            stat_error: self.tag_rate_stat_error(region)?,
            syst_error: self.tag_rate_syst_error(region)?,
        })
    }

    pub fn rate_summary(&self) -> Result<RateSummary> {
        let mut regions = Vec::with_capacity(Region::CONTROL.len());
        for region in Region::CONTROL {
            regions.push((region, self.rate_value(region)?));
        }
        Ok(RateSummary {
            regions,
            weighted: RateValue {
                rate: self.weighted_tag_rate()?,
                stat_error: self.weighted_tag_rate_stat_error()?,
                syst_error: self.weighted_tag_rate_syst_error()?,
            },
        })
    }

    pub fn evaluate(&self) -> Result<Estimate> {
        let estimate = Estimate {
            central: self.tag_estimate()?,
            stat_error: self.tag_estimate_stat_error()?,
            syst_error: self.tag_estimate_syst_error()?,
        };
        info!(
            label = %self.label(),
            central = estimate.central,
            stat = estimate.stat_error,
            syst = estimate.syst_error,
            "tag-rate estimate"
        );
        Ok(estimate)
    }
}

fn control_region(region: Region) -> Result<Region> {
    match region {
        Region::D => Err(EstimateError::InvalidRegion(
            "D is predicted by the tag-rate method, not measured".to_string(),
        )),
        other => Ok(other),
    }
}
