//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed by value between the store, the accessors and the estimators
//! - exported to JSON/CSV
//! - read back from analysis configuration files

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EstimateError;

/// One of the four mutually exclusive areas of the discriminant plane.
///
/// `D` is the target region: its yield is predicted, never read directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum Region {
    A,
    B,
    C,
    D,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::A, Region::B, Region::C, Region::D];

    /// Control regions used to measure tag rates (`D` is what gets predicted).
    pub const CONTROL: [Region; 3] = [Region::A, Region::B, Region::C];

    /// Zero-based position, used to index per-region arrays.
    pub fn index(self) -> usize {
        match self {
            Region::A => 0,
            Region::B => 1,
            Region::C => 2,
            Region::D => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Region::A => "A",
            Region::B => "B",
            Region::C => "C",
            Region::D => "D",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Region::A),
            "B" => Ok(Region::B),
            "C" => Ok(Region::C),
            "D" => Ok(Region::D),
            _ => Err(EstimateError::InvalidRegion(s.to_string())),
        }
    }
}

/// Region ordinals as used by the analysis tables (`A = 1` .. `D = 4`).
impl TryFrom<u8> for Region {
    type Error = EstimateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Region::A),
            2 => Ok(Region::B),
            3 => Ok(Region::C),
            4 => Ok(Region::D),
            other => Err(EstimateError::InvalidRegion(other.to_string())),
        }
    }
}

/// Selection stage; `Tag` is a tighter selection applied on top of `Pretag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Pretag,
    Tag,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Pretag, Mode::Tag];

    /// Label used in histogram names and table rows.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Pretag => "pretag",
            Mode::Tag => "tag",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Jet-multiplicity selector.
///
/// With `inclusive = true` the bin and every higher bin are summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JetSelection {
    pub bin: u32,
    #[serde(default)]
    pub inclusive: bool,
}

impl JetSelection {
    pub fn exclusive(bin: u32) -> Self {
        Self { bin, inclusive: false }
    }

    pub fn inclusive(bin: u32) -> Self {
        Self { bin, inclusive: true }
    }

    /// `"3 jet"` / `"3 jet inc"`.
    pub fn label(self) -> String {
        if self.inclusive {
            format!("{} jet inc", self.bin)
        } else {
            format!("{} jet", self.bin)
        }
    }
}

/// Nuisance shift applied multiplicatively to a sample's yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variation {
    Down,
    Nominal,
    Up,
}

impl Variation {
    /// Rescale factor for a sample with fractional uncertainty `delta`.
    pub fn factor(self, delta: f64) -> f64 {
        match self {
            Variation::Down => 1.0 - delta,
            Variation::Nominal => 1.0,
            Variation::Up => 1.0 + delta,
        }
    }
}

/// Label of an alternative branching-ratio weighting; empty means nominal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrVariation(String);

impl BrVariation {
    pub fn nominal() -> Self {
        Self(String::new())
    }

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn is_nominal(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a physical process (the data sample or a simulated background).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A region's yield and its statistical uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionYield {
    pub value: f64,
    pub stat_error: f64,
}

/// Final deliverable of either estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub central: f64,
    pub stat_error: f64,
    pub syst_error: f64,
}

impl Estimate {
    /// Statistical and systematic errors combined in quadrature.
    pub fn total_error(&self) -> f64 {
        (self.stat_error * self.stat_error + self.syst_error * self.syst_error).sqrt()
    }
}

/// Which technique produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Abcd,
    TagRate,
    /// The pretag-table constant itself.
    Pretag,
}

impl Method {
    pub fn label(self) -> &'static str {
        match self {
            Method::Abcd => "abcd",
            Method::TagRate => "tag_rate",
            Method::Pretag => "pretag",
        }
    }
}

/// A labelled estimate, as printed and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    pub method: Method,
    pub label: String,
    pub estimate: Estimate,
}

/// Common configuration shared by every accessor of one estimator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub mode: Mode,
    pub jet: JetSelection,
    pub variation: Variation,
    pub br: BrVariation,
}

impl Selection {
    pub fn nominal(mode: Mode, jet: JetSelection) -> Self {
        Self {
            mode,
            jet,
            variation: Variation::Nominal,
            br: BrVariation::nominal(),
        }
    }

    pub fn with_variation(&self, variation: Variation) -> Self {
        Self {
            variation,
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }
}
