//! The `cov-import-results` report document.

use crate::render::RenderedDefect;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;

pub const REPORT_VERSION: u32 = 1;
pub const REPORT_FORMAT: &str = "cov-import-results input";
pub const SOURCE_ENCODING: &str = "ASCII";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportHeader {
    pub version: u32,
    pub format: String,
}

impl Default for ReportHeader {
    fn default() -> Self {
        Self {
            version: REPORT_VERSION,
            format: REPORT_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SourceEntry {
    pub file: String,
    pub encoding: String,
}

/// Report with one issue per rendered defect and every source they mention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovImportReport {
    pub header: ReportHeader,
    pub issues: Vec<serde_json::Value>,
    pub sources: Vec<SourceEntry>,
}

impl CovImportReport {
    pub fn from_defects(defects: &[RenderedDefect]) -> Self {
        let files: BTreeSet<&str> = defects
            .iter()
            .flat_map(|defect| defect.sources.iter())
            .flat_map(|label| label.split(','))
            .filter(|file| !file.is_empty())
            .collect();

        Self {
            header: ReportHeader::default(),
            issues: defects.iter().map(|d| d.fragment.clone()).collect(),
            sources: files
                .into_iter()
                .map(|file| SourceEntry {
                    file: file.to_string(),
                    encoding: SOURCE_ENCODING.to_string(),
                })
                .collect(),
        }
    }
}

/// Destination for a finished report.
pub trait ReportWriter {
    fn write_report(&mut self, report: &CovImportReport) -> anyhow::Result<()>;
}

pub struct JsonReportWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonReportWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReportWriter for JsonReportWriter<W> {
    fn write_report(&mut self, report: &CovImportReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rendered(checker: &str, sources: &[&str]) -> RenderedDefect {
        RenderedDefect {
            checker: checker.to_string(),
            fragment: json!({ "checker": checker }),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn report_has_exactly_three_sections() {
        let report = CovImportReport::from_defects(&[
            rendered("METRICS.A", &["/b.c", "/a.c"]),
            rendered("METRICS.B", &["/a.c"]),
        ]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "header": { "version": 1, "format": "cov-import-results input" },
                "issues": [ { "checker": "METRICS.A" }, { "checker": "METRICS.B" } ],
                "sources": [
                    { "file": "/a.c", "encoding": "ASCII" },
                    { "file": "/b.c", "encoding": "ASCII" }
                ]
            })
        );
    }

    #[test]
    fn empty_report_still_has_header() {
        let report = CovImportReport::from_defects(&[]);
        assert!(report.issues.is_empty());
        assert!(report.sources.is_empty());
        assert_eq!(report.header.version, REPORT_VERSION);
    }

    #[test]
    fn json_writer_emits_pretty_document() {
        let mut out = Vec::new();
        JsonReportWriter::new(&mut out)
            .write_report(&CovImportReport::from_defects(&[]))
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("{\n"));
        assert!(text.ends_with("}\n"));
    }
}
