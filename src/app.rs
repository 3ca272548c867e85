//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs the log subscriber
//! - loads the analysis configuration and opens the histogram store
//! - runs the estimators
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, DebugArgs, EstimateArgs, OutputArgs, RsmtArgs, SampleArgs, SynthArgs};
use crate::data::SynthConfig;
use crate::domain::{BrVariation, EstimateRecord};
use crate::error::AppError;
use crate::report::{self, ReportStyle};

pub mod pipeline;

/// Entry point for the `abcd` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Estimate(args) => handle_estimate(args),
        Command::Rsmt(args) => handle_rsmt(args),
        Command::Yields(args) => handle_yields(args),
        Command::Contamination(args) => handle_contamination(args),
        Command::Synth(args) => handle_synth(args),
        Command::Debug(args) => handle_debug(args),
    }
}

fn handle_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let analysis = pipeline::load_analysis(args.store.config.as_deref())?;
    let store = pipeline::open_store(args.store.store.as_deref(), &analysis)?;
    let selections = pipeline::selections(&analysis, &args.selection.selection(), args.selection.all_bins);

    let records = pipeline::run_abcd(&store, &analysis, &selections)?;
    print_records(&records, &args.output);
    export_records(&records, &args.output)
}

fn handle_rsmt(args: RsmtArgs) -> Result<(), AppError> {
    let analysis = pipeline::load_analysis(args.store.config.as_deref())?;
    let selections = pipeline::selections(&analysis, &args.selection.selection(), args.selection.all_bins);

    // The pretag table needs no histograms.
    if args.pretag {
        let records = pipeline::run_pretag(&analysis, &selections)?;
        print_records(&records, &args.output);
        return export_records(&records, &args.output);
    }

    let store = pipeline::open_store(args.store.store.as_deref(), &analysis)?;
    if args.rates {
        let style = ReportStyle::default();
        println!("{}", report::rate_table_header());
        for (label, summary) in pipeline::run_rates(&store, &analysis, &selections)? {
            println!("{}", report::format_rate_row(&label, &summary, &style));
        }
        return Ok(());
    }

    if let Some(region) = args.region {
        let style = ReportStyle::default();
        for (label, value) in pipeline::run_region_rates(&store, &analysis, &selections, region)? {
            println!("{}", report::format_region_rate(&label, region, &value, &style));
        }
        return Ok(());
    }

    let records = pipeline::run_tag_rate(&store, &analysis, &selections)?;
    print_records(&records, &args.output);
    export_records(&records, &args.output)
}

fn handle_yields(args: SampleArgs) -> Result<(), AppError> {
    let analysis = pipeline::load_analysis(args.store.config.as_deref())?;
    let store = pipeline::open_store(args.store.store.as_deref(), &analysis)?;
    let sample = args.sample_id().unwrap_or_else(|| analysis.data_sample.clone());

    let rows = pipeline::region_yield_rows(&store, &analysis, &sample, &BrVariation::new(args.br.clone()))?;
    println!("{sample}");
    print!("{}", report::format_region_yield_table(&rows));
    Ok(())
}

fn handle_contamination(args: SampleArgs) -> Result<(), AppError> {
    let analysis = pipeline::load_analysis(args.store.config.as_deref())?;
    let sample = args
        .sample_id()
        .ok_or_else(|| AppError::new(2, "contamination needs --sample <simulated sample>."))?;
    let store = pipeline::open_store(args.store.store.as_deref(), &analysis)?;

    let rows = pipeline::contamination_rows(&store, &analysis, &sample, &BrVariation::new(args.br.clone()))?;
    println!("{sample}");
    print!("{}", report::format_contamination_table(&rows, &ReportStyle::default()));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let analysis = pipeline::load_analysis(args.config.as_deref())?;
    let config = SynthConfig {
        seed: args.seed,
        n_bins: args.n_bins,
        ..SynthConfig::default()
    };
    let paths = crate::data::write_store(&args.out, &analysis, &config)?;
    for path in &paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_debug(args: DebugArgs) -> Result<(), AppError> {
    let analysis = pipeline::load_analysis(args.store.config.as_deref())?;
    let store = pipeline::open_store(args.store.store.as_deref(), &analysis)?;
    let base = crate::domain::Selection {
        br: BrVariation::new(args.br.clone()),
        ..crate::domain::Selection::nominal(crate::domain::Mode::Tag, crate::domain::JetSelection::exclusive(1))
    };

    let path = crate::debug::write_debug_bundle(&store, &analysis, &base, &args.out)?;
    info!(path = %path.display(), "debug bundle written");
    println!("{}", path.display());
    Ok(())
}

fn print_records(records: &[EstimateRecord], output: &OutputArgs) {
    let style = ReportStyle::default();
    println!("{}", report::rule());
    for record in records {
        println!(
            "{}",
            report::format_estimate_line(&record.label, &record.estimate, output.format, output.errors, &style)
        );
    }
    println!("{}", report::rule());
}

fn export_records(records: &[EstimateRecord], output: &OutputArgs) -> Result<(), AppError> {
    if let Some(path) = &output.export_csv {
        crate::io::write_estimates_csv(path, records)?;
    }
    if let Some(path) = &output.export_json {
        crate::io::write_estimates_json(path, records)?;
    }
    Ok(())
}
