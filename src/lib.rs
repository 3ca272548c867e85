//! `abcd-estimate` library crate.
//!
//! The binary (`abcd`) is a thin wrapper around this library so that:
//!
//! - the estimators are testable without spawning processes
//! - stores other than the JSON directory can be plugged in behind `HistogramStore`

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod estimate;
pub mod io;
pub mod report;
pub mod store;
