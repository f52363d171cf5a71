pub mod record_reader;
pub mod report;

pub use record_reader::{RawRecord, RecordCursor};
pub use report::{CovImportReport, JsonReportWriter, ReportWriter};
