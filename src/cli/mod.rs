//! Command-line parsing for the ABCD background estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{BrVariation, JetSelection, Mode, Region, SampleId, Selection, Variation};
use crate::error::EstimateError;
use crate::report::{ErrorFormat, TableFormat};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "abcd", version, about = "Data-driven background estimates (ABCD and tag-rate methods)")]
pub struct Cli {
    /// Log level for diagnostics on stderr.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// ABCD estimate for one selection (or every configured jet selection).
    Estimate(EstimateArgs),
    /// Tag-rate (RSMT) estimate, pretag constant or rate table.
    Rsmt(RsmtArgs),
    /// Region-yield table for one sample.
    Yields(SampleArgs),
    /// Contamination table for one simulated sample.
    Contamination(SampleArgs),
    /// Write a synthetic histogram store.
    Synth(SynthArgs),
    /// Write a markdown debug bundle of raw yields and estimates.
    Debug(DebugArgs),
}

/// Options shared by every command that reads a store.
#[derive(Debug, Args, Clone)]
pub struct StoreArgs {
    /// Histogram store directory (falls back to `ABCD_STORE_DIR`, also read from `.env`).
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Analysis configuration (JSON); built-in defaults otherwise.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Which selection to evaluate.
#[derive(Debug, Args, Clone)]
pub struct SelectionArgs {
    #[arg(long, value_enum, default_value_t = Mode::Tag)]
    pub mode: Mode,

    /// Jet-multiplicity bin (1 or more).
    #[arg(long = "jet-bin", default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub jet_bin: u32,

    /// Sum the jet bin and every higher bin.
    #[arg(long)]
    pub inclusive: bool,

    /// Branching-ratio variation label (empty = nominal).
    #[arg(long, default_value = "")]
    pub br: String,

    /// Evaluate every jet selection listed in the analysis configuration.
    #[arg(long)]
    pub all_bins: bool,
}

impl SelectionArgs {
    pub fn jet(&self) -> JetSelection {
        JetSelection {
            bin: self.jet_bin,
            inclusive: self.inclusive,
        }
    }

    pub fn selection(&self) -> Selection {
        Selection {
            mode: self.mode,
            jet: self.jet(),
            variation: Variation::Nominal,
            br: BrVariation::new(self.br.clone()),
        }
    }
}

/// Presentation options for estimate lines.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = TableFormat::Terminal)]
    pub format: TableFormat,

    #[arg(long, value_enum, default_value_t = ErrorFormat::Breakdown)]
    pub errors: ErrorFormat,

    /// Export estimates to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Export estimates to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RsmtArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Print the pretag-table constant with its fixed uncertainty instead.
    #[arg(long, conflicts_with_all = ["rates", "region"])]
    pub pretag: bool,

    /// Print the per-region tag-rate table instead.
    #[arg(long, conflicts_with = "region")]
    pub rates: bool,

    /// Print the tag rate of one control region (`A`..`C` or `1`..`3`).
    #[arg(long, value_parser = parse_region)]
    pub region: Option<Region>,
}

/// Accept a region letter or its table ordinal (`A = 1` .. `D = 4`).
fn parse_region(s: &str) -> Result<Region, EstimateError> {
    match s.trim().parse::<u8>() {
        Ok(ordinal) => Region::try_from(ordinal),
        Err(_) => s.parse(),
    }
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Sample to tabulate (defaults to the data sample for `yields`).
    #[arg(long)]
    pub sample: Option<String>,

    /// Branching-ratio variation label (empty = nominal).
    #[arg(long, default_value = "")]
    pub br: String,
}

impl SampleArgs {
    pub fn sample_id(&self) -> Option<SampleId> {
        self.sample.as_deref().map(SampleId::from)
    }
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output directory.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Analysis configuration (JSON) naming the samples to generate.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of jet-multiplicity bins per histogram.
    #[arg(long, default_value_t = 8)]
    pub n_bins: usize,
}

#[derive(Debug, Args, Clone)]
pub struct DebugArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Branching-ratio variation label (empty = nominal).
    #[arg(long, default_value = "")]
    pub br: String,

    /// Bundle output directory.
    #[arg(long, default_value = "debug")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_defaults() {
        let cli = Cli::parse_from(["abcd", "estimate", "--store", "store"]);
        let Command::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(cli.log_level, tracing::Level::WARN);
        assert_eq!(args.selection.selection(), Selection::nominal(Mode::Tag, JetSelection::exclusive(3)));
        assert_eq!(args.output.format, TableFormat::Terminal);
        assert_eq!(args.store.store, Some(PathBuf::from("store")));
    }

    #[test]
    fn selection_flags() {
        let cli = Cli::parse_from([
            "abcd",
            "rsmt",
            "--mode",
            "pretag",
            "--jet-bin",
            "4",
            "--inclusive",
            "--br",
            "br2",
            "--rates",
            "--log-level",
            "debug",
        ]);
        let Command::Rsmt(args) = cli.command else {
            panic!("expected rsmt");
        };
        let selection = args.selection.selection();
        assert_eq!(selection.mode, Mode::Pretag);
        assert_eq!(selection.jet, JetSelection::inclusive(4));
        assert_eq!(selection.br.as_str(), "br2");
        assert!(args.rates && !args.pretag);
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn pretag_and_rates_conflict() {
        assert!(Cli::try_parse_from(["abcd", "rsmt", "--pretag", "--rates"]).is_err());
        assert!(Cli::try_parse_from(["abcd", "rsmt", "--rates", "--region", "A"]).is_err());
    }

    #[test]
    fn jet_bin_zero_is_rejected() {
        assert!(Cli::try_parse_from(["abcd", "estimate", "--jet-bin", "0"]).is_err());
        assert!(Cli::try_parse_from(["abcd", "estimate", "--jet-bin", "1"]).is_ok());
    }

    #[test]
    fn region_accepts_letters_and_ordinals() {
        for (arg, expected) in [("b", Region::B), ("2", Region::B), ("C", Region::C)] {
            let cli = Cli::parse_from(["abcd", "rsmt", "--region", arg]);
            let Command::Rsmt(args) = cli.command else {
                panic!("expected rsmt");
            };
            assert_eq!(args.region, Some(expected));
        }
        assert!(Cli::try_parse_from(["abcd", "rsmt", "--region", "5"]).is_err());
        assert!(Cli::try_parse_from(["abcd", "rsmt", "--region", "E"]).is_err());
    }
}
