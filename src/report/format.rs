//! Formatted terminal output for estimates, rates and yield tables.
//!
//! We keep formatting code in one place so:
//! - the estimation code stays clean and testable
//! - output changes are localized (important for pasting into notes and wikis)

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{Estimate, JetSelection, Mode, Region, RegionYield};
use crate::estimate::{RateSummary, RateValue};

/// Table layout for one estimate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// `label 20.0 ± 1.7 (stat) ± 0.8 (syst)`
    Terminal,
    /// Tab-separated columns, for spreadsheets.
    Tabbed,
    /// Label and central value only.
    Central,
    /// LaTeX table row for notes.
    Conf,
    /// TWiki table row.
    Twiki,
}

/// Whether uncertainties are printed separately or combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorFormat {
    Breakdown,
    Total,
}

/// Symbols and precision shared by every formatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStyle {
    pub pm: String,
    pub pm_latex: String,
    pub pm_twiki: String,
    /// Decimal places for event yields.
    pub precision: usize,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            pm: "±".to_string(),
            pm_latex: "\\pm".to_string(),
            pm_twiki: "&plusmn;".to_string(),
            precision: 1,
        }
    }
}

/// A line of dashes separating table blocks.
pub fn rule() -> String {
    "-".repeat(52)
}

/// Render one estimate as a single line (no trailing newline).
pub fn format_estimate_line(
    label: &str,
    estimate: &Estimate,
    table: TableFormat,
    errors: ErrorFormat,
    style: &ReportStyle,
) -> String {
    let p = style.precision;
    let c = estimate.central;
    let (s, y, t) = (estimate.stat_error, estimate.syst_error, estimate.total_error());

    match (table, errors) {
        (TableFormat::Central, _) => format!("{label}\t{c:.p$}"),
        (TableFormat::Terminal, ErrorFormat::Breakdown) => {
            let pm = &style.pm;
            format!("{label} {c:.p$} {pm} {s:.p$} (stat) {pm} {y:.p$} (syst)")
        }
        (TableFormat::Terminal, ErrorFormat::Total) => format!("{label} {c:.p$} {} {t:.p$}", style.pm),
        (TableFormat::Tabbed, ErrorFormat::Breakdown) => format!("{label}\t{c:.p$}\t{s:.p$}\t{y:.p$}"),
        (TableFormat::Tabbed, ErrorFormat::Total) => format!("{label}\t{c:.p$}\t{t:.p$}"),
        (TableFormat::Conf, ErrorFormat::Breakdown) => {
            let pm = &style.pm_latex;
            format!("{label} & ${c:.p$} {pm} {s:.p$} {pm} {y:.p$}$ \\\\")
        }
        (TableFormat::Conf, ErrorFormat::Total) => {
            format!("{label} & ${c:.p$} {} {t:.p$}$ \\\\", style.pm_latex)
        }
        (TableFormat::Twiki, ErrorFormat::Breakdown) => {
            let pm = &style.pm_twiki;
            format!("| {label} | {c:.p$} {pm} {s:.p$} (stat) {pm} {y:.p$} (syst) |")
        }
        (TableFormat::Twiki, ErrorFormat::Total) => {
            format!("| {label} | {c:.p$} {} {t:.p$} |", style.pm_twiki)
        }
    }
}

/// One row of the tag-rate table: rates in percent for A, B, C and their mean.
///
/// The mean's systematic column is the fractional spread times the mean rate.
pub fn format_rate_row(label: &str, summary: &RateSummary, style: &ReportStyle) -> String {
    let pm = &style.pm;
    let cell = |v: &RateValue| {
        format!(
            "{:.3}{pm}{:.3}(stat){pm}{:.3}(syst)",
            100.0 * v.rate,
            100.0 * v.stat_error,
            100.0 * v.syst_error
        )
    };

    let mut out = format!("| {label} |");
    for (_, value) in &summary.regions {
        out.push_str(&format!(" {} |", cell(value)));
    }
    let w = &summary.weighted;
    let rate_pct = 100.0 * w.rate;
    out.push_str(&format!(
        " {rate_pct:.3}{pm}{:.3}(stat){pm}{:.3}(syst) |",
        100.0 * w.stat_error,
        w.syst_error * rate_pct
    ));
    out
}

/// One region's tag rate in percent: `3 jet inc R_B = 5.000 ± 0.100 (stat) ± 0.200 (syst) %`.
pub fn format_region_rate(label: &str, region: Region, value: &RateValue, style: &ReportStyle) -> String {
    let pm = &style.pm;
    format!(
        "{label} R_{region} = {:.3} {pm} {:.3} (stat) {pm} {:.3} (syst) %",
        100.0 * value.rate,
        100.0 * value.stat_error,
        100.0 * value.syst_error
    )
}

pub fn rate_table_header() -> String {
    "| *Jet-bin* | *R_A (%)* | *R_B (%)* | *R_C (%)* | *R_wgt (%)* |".to_string()
}

/// `| 3 inc (tag) |` row prefix used by the yield and contamination tables.
fn row_label(jet: JetSelection, mode: Mode) -> String {
    let inc = if jet.inclusive { "inc " } else { "" };
    format!("{} {inc}({mode})", jet.bin)
}

/// One sample's region yields under one jet selection and mode.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldRow {
    pub jet: JetSelection,
    pub mode: Mode,
    pub yields: [RegionYield; 4],
    /// `B * C / A` of this sample; `None` when A is empty.
    pub closure: Option<f64>,
}

/// Region yields per jet selection and mode, with the sample's own closure estimate.
pub fn format_region_yield_table(rows: &[YieldRow]) -> String {
    let mut out = String::from("| *Jet-bin* | *A* | *B* | *C* | *D* | *B*C/A* |\n");
    for row in rows {
        out.push_str(&format!("| {} |", row_label(row.jet, row.mode)));
        for y in &row.yields {
            out.push_str(&format!(" {:.2} |", y.value));
        }
        match row.closure {
            Some(c) => out.push_str(&format!(" {c:.2} |")),
            None => out.push_str(" - |"),
        }
        out.push('\n');
    }
    out
}

/// Contamination percentages (with errors) per jet selection and mode.
pub fn format_contamination_table(rows: &[(JetSelection, Mode, [RegionYield; 4])], style: &ReportStyle) -> String {
    let mut out =
        String::from("| *Jet-bin* | *A+-(stat) (%)* | *B+-(stat) (%)* | *C+-(stat) (%)* | *D+-(stat) (%)* |\n");
    for (jet, mode, values) in rows {
        out.push_str(&format!("| {} |", row_label(*jet, *mode)));
        for c in values {
            out.push_str(&format!(" {:.2}{}{:.2} |", c.value, style.pm, c.stat_error));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate() -> Estimate {
        Estimate {
            central: 20.0,
            stat_error: 3.0,
            syst_error: 4.0,
        }
    }

    #[test]
    fn terminal_breakdown_and_total() {
        let style = ReportStyle::default();
        assert_eq!(
            format_estimate_line("3 jet (tag)", &estimate(), TableFormat::Terminal, ErrorFormat::Breakdown, &style),
            "3 jet (tag) 20.0 ± 3.0 (stat) ± 4.0 (syst)"
        );
        assert_eq!(
            format_estimate_line("3 jet (tag)", &estimate(), TableFormat::Terminal, ErrorFormat::Total, &style),
            "3 jet (tag) 20.0 ± 5.0"
        );
    }

    #[test]
    fn other_layouts() {
        let style = ReportStyle::default();
        let e = estimate();
        assert_eq!(
            format_estimate_line("x", &e, TableFormat::Central, ErrorFormat::Breakdown, &style),
            "x\t20.0"
        );
        assert_eq!(
            format_estimate_line("x", &e, TableFormat::Tabbed, ErrorFormat::Total, &style),
            "x\t20.0\t5.0"
        );
        assert_eq!(
            format_estimate_line("x", &e, TableFormat::Conf, ErrorFormat::Breakdown, &style),
            "x & $20.0 \\pm 3.0 \\pm 4.0$ \\\\"
        );
        assert_eq!(
            format_estimate_line("x", &e, TableFormat::Twiki, ErrorFormat::Total, &style),
            "| x | 20.0 &plusmn; 5.0 |"
        );
    }

    #[test]
    fn precision_is_configurable() {
        let style = ReportStyle {
            precision: 3,
            ..ReportStyle::default()
        };
        assert_eq!(
            format_estimate_line("x", &estimate(), TableFormat::Central, ErrorFormat::Total, &style),
            "x\t20.000"
        );
    }

    #[test]
    fn rate_row_reports_percent() {
        let value = RateValue {
            rate: 0.05,
            stat_error: 0.001,
            syst_error: 0.002,
        };
        let summary = RateSummary {
            regions: vec![(Region::A, value), (Region::B, value), (Region::C, value)],
            weighted: RateValue {
                rate: 0.05,
                stat_error: 0.001,
                syst_error: 0.1,
            },
        };
        let row = format_rate_row("3 jet inc", &summary, &ReportStyle::default());
        assert!(row.starts_with("| 3 jet inc | 5.000±0.100(stat)±0.200(syst) |"));
        assert!(row.ends_with("| 5.000±0.100(stat)±0.500(syst) |"));
    }

    #[test]
    fn single_region_rate_line() {
        let value = RateValue {
            rate: 0.05,
            stat_error: 0.001,
            syst_error: 0.002,
        };
        assert_eq!(
            format_region_rate("3 jet inc", Region::B, &value, &ReportStyle::default()),
            "3 jet inc R_B = 5.000 ± 0.100 (stat) ± 0.200 (syst) %"
        );
    }

    #[test]
    fn yield_table_rows() {
        let yields = [1.0, 2.0, 3.0, 4.5].map(|value| RegionYield { value, stat_error: 0.0 });
        let rows = vec![
            YieldRow {
                jet: JetSelection::inclusive(3),
                mode: Mode::Tag,
                yields,
                closure: Some(6.0),
            },
            YieldRow {
                jet: JetSelection::exclusive(2),
                mode: Mode::Pretag,
                yields,
                closure: None,
            },
        ];
        let table = format_region_yield_table(&rows);
        assert!(table.contains("| 3 inc (tag) | 1.00 | 2.00 | 3.00 | 4.50 | 6.00 |"));
        assert!(table.contains("| 2 (pretag) | 1.00 | 2.00 | 3.00 | 4.50 | - |"));
    }
}
