//! Export estimates to CSV or JSON.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::EstimateRecord;
use crate::error::AppError;

/// Write one CSV row per estimate.
pub fn write_estimates_csv(path: &Path, records: &[EstimateRecord]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "method,label,central,stat_error,syst_error,total_error")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in records {
        let e = &r.estimate;
        writeln!(
            file,
            "{},{},{:.6},{:.6},{:.6},{:.6}",
            r.method.label(),
            r.label,
            e.central,
            e.stat_error,
            e.syst_error,
            e.total_error(),
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write all estimates as a pretty-printed JSON array.
pub fn write_estimates_json(path: &Path, records: &[EstimateRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, records)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Estimate, Method};

    fn records() -> Vec<EstimateRecord> {
        vec![
            EstimateRecord {
                method: Method::Abcd,
                label: "3 jet (tag)".to_string(),
                estimate: Estimate {
                    central: 20.0,
                    stat_error: 3.0,
                    syst_error: 4.0,
                },
            },
            EstimateRecord {
                method: Method::TagRate,
                label: "3 jet inc".to_string(),
                estimate: Estimate {
                    central: 681.48,
                    stat_error: 49.2,
                    syst_error: 366.9,
                },
            },
        ]
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estimates.csv");
        write_estimates_csv(&path, &records()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "method,label,central,stat_error,syst_error,total_error");
        assert_eq!(lines[1], "abcd,3 jet (tag),20.000000,3.000000,4.000000,5.000000");
        assert!(lines[2].starts_with("tag_rate,3 jet inc,681.480000"));
    }

    #[test]
    fn json_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estimates.json");
        write_estimates_json(&path, &records()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: Vec<EstimateRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, records());
    }
}
