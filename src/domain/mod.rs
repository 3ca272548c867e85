//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - plane/selection enums (`Region`, `Mode`, `Variation`) and selectors (`JetSelection`, `BrVariation`)
//! - value objects (`RegionYield`, `Estimate`)
//! - injectable analysis constants (`AnalysisConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
