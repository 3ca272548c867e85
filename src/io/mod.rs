//! Input/output helpers.
//!
//! - estimate exports (CSV/JSON) (`export`)
//!
//! Histogram inputs live in `crate::store`.

pub mod export;

pub use export::*;
