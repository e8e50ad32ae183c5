//! CSV output formatter for removal decisions.
//!
//! One row is generated for each file marked for removal.
//!
//! # Columns
//!
//! - `canonical_name`: Canonical name of the game
//! - `reason`: `cross_regional` or `same_region`
//! - `region`: Region of the removed file
//! - `path`: Path to the removed file
//! - `version_info`: Revision/edition markers of the removed file
//! - `kept_path`: Path to the file kept in its place
//! - `kept_region`: Region of the kept file

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::{DecisionReason, ScanReport};

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    canonical_name: &'a str,
    reason: &'static str,
    region: &'static str,
    path: String,
    version_info: &'a str,
    kept_path: String,
    kept_region: &'static str,
}

fn reason_code(reason: DecisionReason) -> &'static str {
    match reason {
        DecisionReason::CrossRegionalDuplicate => "cross_regional",
        DecisionReason::SameRegionInferior => "same_region",
    }
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    report: &'a ScanReport,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self { report }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for bucket in &self.report.buckets {
            for decision in &bucket.decisions {
                csv_writer.serialize(CsvRow {
                    canonical_name: &bucket.bucket.canonical_name,
                    reason: reason_code(decision.reason),
                    region: decision.file.region.as_str(),
                    path: decision.file.path.to_string_lossy().into_owned(),
                    version_info: &decision.file.version_info,
                    kept_path: decision.kept_counterpart.path.to_string_lossy().into_owned(),
                    kept_region: decision.kept_counterpart.region.as_str(),
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{FinderConfig, RomFinder};
    use crate::resolver::{CanonicalResolver, ResolverCache};
    use crate::scanner::RomFile;
    use std::sync::Arc;

    fn report(names: &[&str]) -> ScanReport {
        let finder = RomFinder::new(
            FinderConfig::default(),
            Arc::new(CanonicalResolver::new(Arc::new(ResolverCache::new()))),
        );
        finder
            .analyze_files(names.iter().map(|n| RomFile::from_filename(n)).collect())
            .unwrap()
    }

    #[test]
    fn test_csv_output_rows() {
        let report = report(&[
            "Game (USA).zip",
            "Game (Japan).zip",
            "Game, The (Europe) (Rev 1).cue",
            "Game, The (Europe) (Rev 2).zip",
        ]);
        let csv_str = CsvOutput::new(&report).to_string().unwrap();
        let lines: Vec<&str> = csv_str.lines().collect();

        assert_eq!(
            lines[0],
            "canonical_name,reason,region,path,version_info,kept_path,kept_region"
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "Game,cross_regional,japan,Game (Japan).zip,,Game (USA).zip,usa"
        );
        // Fields containing commas are quoted
        assert!(lines[2].starts_with("\"Game, The\",same_region,europe,"));
        assert!(lines[2].contains("Rev 1"));
    }

    #[test]
    fn test_csv_output_empty() {
        let report = report(&["Solo (USA).zip"]);
        let csv_str = CsvOutput::new(&report).to_string().unwrap();
        assert!(csv_str.is_empty());
    }
}
