//! Human-readable audit log.
//!
//! Every bucket with two or more members gets a header, one KEEP/REMOVE line
//! per member and, where relevant, a note explaining the verdict:
//!
//! ```text
//! == mega man (2 files) ==
//!   KEEP    [usa]    Mega Man (USA).nes
//!   REMOVE  [japan]  Rockman (Japan).nes -> kept Mega Man (USA).nes (cross-regional duplicate)
//! ```

use std::io::{self, Write};

use yansi::{Color, Paint};

use crate::duplicates::{BucketReport, BucketVerdict, CrossRegionalRule, ScanReport};

/// Text audit log renderer.
pub struct TextOutput<'a> {
    report: &'a ScanReport,
    color: bool,
    show_singletons: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a renderer; colors are off by default.
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self {
            report,
            color: false,
            show_singletons: false,
        }
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Also list single-member buckets.
    #[must_use]
    pub fn with_singletons(mut self, show: bool) -> Self {
        self.show_singletons = show;
        self
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.paint(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the audit log followed by the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for entry in &self.report.buckets {
            if entry.bucket.has_duplicates() || self.show_singletons {
                self.write_bucket(writer, entry)?;
            }
        }
        writeln!(writer, "{}", self.report.summary)
    }

    fn write_bucket<W: Write>(&self, writer: &mut W, entry: &BucketReport) -> io::Result<()> {
        let header = format!(
            "== {} ({} file{}) ==",
            entry.bucket.canonical_name,
            entry.bucket.len(),
            if entry.bucket.len() == 1 { "" } else { "s" }
        );
        writeln!(writer, "{}", self.paint(&header, Color::Cyan))?;

        for member in &entry.bucket.members {
            let region = format!("[{}]", member.region);
            let version = if member.version_info.is_empty() {
                String::new()
            } else {
                format!(" ({})", member.version_info)
            };

            match entry.decisions.iter().find(|d| d.file.path == member.path) {
                Some(decision) => writeln!(
                    writer,
                    "  {}  {:<9}{}{} -> kept {} ({})",
                    self.paint("REMOVE", Color::Red),
                    region,
                    member.filename,
                    version,
                    decision.kept_counterpart.filename,
                    decision.reason
                )?,
                None => writeln!(
                    writer,
                    "  {}    {:<9}{}{}",
                    self.paint("KEEP", Color::Green),
                    region,
                    member.filename,
                    version
                )?,
            }
        }

        if let Some(note) = verdict_note(&entry.verdict) {
            writeln!(writer, "  {}", self.paint(&note, Color::Yellow))?;
        }
        writeln!(writer)
    }
}

fn verdict_note(verdict: &BucketVerdict) -> Option<String> {
    match verdict {
        BucketVerdict::MultiPart => Some("note: multi-disc release, all parts kept".to_string()),
        BucketVerdict::LowConfidence { max_ratio } => Some(format!(
            "note: low name similarity ({max_ratio:.2}), all versions kept"
        )),
        BucketVerdict::CrossRegional {
            rule: CrossRegionalRule::UsaOverJapanByGrouping { max_ratio },
        } => Some(format!(
            "note: names differ ({max_ratio:.2}) but were grouped as one game"
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{FinderConfig, RomFinder};
    use crate::resolver::{CanonicalResolver, LocalMappings, ResolverCache};
    use crate::scanner::RomFile;
    use std::sync::Arc;

    fn render(names: &[&str], singletons: bool) -> String {
        let resolver = CanonicalResolver::new(Arc::new(ResolverCache::new()))
            .with_lookup(Arc::new(LocalMappings::new()));
        let report = RomFinder::new(FinderConfig::default(), Arc::new(resolver))
            .analyze_files(names.iter().map(|n| RomFile::from_filename(n)).collect())
            .unwrap();
        let mut buffer = Vec::new();
        TextOutput::new(&report)
            .with_singletons(singletons)
            .write_to(&mut buffer)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_text_keep_and_remove_lines() {
        let text = render(&["Mega Man (USA).nes", "Rockman (Japan).nes"], false);
        assert!(text.contains("== mega man (2 files) =="));
        assert!(text.contains("  KEEP    [usa]    Mega Man (USA).nes\n"));
        assert!(text.contains(
            "  REMOVE  [japan]  Rockman (Japan).nes -> kept Mega Man (USA).nes (cross-regional duplicate)"
        ));
        assert!(text.contains("note: names differ"));
        assert!(text.contains("Files to remove:           1"));
    }

    #[test]
    fn test_text_version_info_and_singletons() {
        let text = render(&["Game (USA) (Rev 1).zip", "Game (USA) (Rev 2).zip"], false);
        assert!(text.contains("Game (USA) (Rev 1).zip (Rev 1) -> kept Game (USA) (Rev 2).zip"));

        let text = render(&["Solo (USA).zip"], false);
        assert!(!text.contains("== Solo"));
        let text = render(&["Solo (USA).zip"], true);
        assert!(text.contains("== Solo (1 file) =="));
    }

    #[test]
    fn test_text_multi_disc_note() {
        let text = render(&["Saga (USA) (Disc 1).bin"], true);
        assert!(!text.contains("multi-disc"));
        assert_eq!(
            verdict_note(&BucketVerdict::MultiPart).as_deref(),
            Some("note: multi-disc release, all parts kept")
        );
    }

    #[test]
    fn test_text_color() {
        let report = ScanReport::default();
        let output = TextOutput::new(&report).with_color(true);
        assert!(output.paint("KEEP", Color::Green).contains("\u{1b}["));
        assert_eq!(TextOutput::new(&report).paint("KEEP", Color::Green), "KEEP");
    }
}
