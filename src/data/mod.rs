//! Synthetic store generation.
//!
//! Real stores are produced by the upstream histogramming jobs; this module only
//! builds stand-ins with known closure for demos and tests.

pub mod synthetic;

pub use synthetic::*;
