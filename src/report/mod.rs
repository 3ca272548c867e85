//! Presentation of computed estimates.
//!
//! Nothing here computes: every function takes finished values plus a
//! `ReportStyle` and returns text.

pub mod format;

pub use format::*;
