//! Streaming reader for function metrics exports.
//!
//! A metrics export is a sequence of `<fnmetric>` elements with no enclosing
//! root element, optionally gzip-compressed:
//!
//! ```text
//! <fnmetric>
//!   <file>/src/app/io.c</file>
//!   <names>fn:read_all;mn:app</names>
//!   <metrics>lc:42;cc:7</metrics>
//! </fnmetric>
//! <fnmetric>...</fnmetric>
//! ```
//!
//! [`RecordCursor`] wraps the decoded bytes in a synthetic `<root>` element and
//! pulls one [`RawRecord`] at a time. Malformed units are skipped, and a
//! stream-level parse error ends the sequence: it is logged and kept on the
//! cursor, never returned to the caller.

use crate::errors::{Error, Result};
use flate2::read::MultiGzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ROOT_OPEN: &[u8] = b"<root>";
const ROOT_CLOSE: &[u8] = b"</root>";
const UNIT_TAG: &[u8] = b"fnmetric";

/// Fields captured from one `<fnmetric>` element.
///
/// Values are kept as raw text; interpretation happens in
/// [`crate::core::unit::parse_unit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub file: String,
    pub names: String,
    pub metrics: String,
    pub coverage: Option<String>,
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    File,
    Names,
    Metrics,
    Coverage,
    Impact,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"file" => Some(Self::File),
            b"names" => Some(Self::Names),
            b"metrics" => Some(Self::Metrics),
            b"coverage" => Some(Self::Coverage),
            b"impact" => Some(Self::Impact),
            _ => None,
        }
    }
}

/// Partially read unit.
#[derive(Default)]
struct UnitBuilder {
    file: Option<String>,
    names: Option<String>,
    metrics: Option<String>,
    coverage: Option<String>,
    impact: Option<String>,
}

impl UnitBuilder {
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::File => &mut self.file,
            Field::Names => &mut self.names,
            Field::Metrics => &mut self.metrics,
            Field::Coverage => &mut self.coverage,
            Field::Impact => &mut self.impact,
        };
        *slot = Some(value);
    }

    fn build(self) -> std::result::Result<RawRecord, &'static str> {
        let file = self.file.filter(|f| !f.is_empty()).ok_or("missing file")?;
        Ok(RawRecord {
            file,
            names: self.names.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
            coverage: self.coverage,
            impact: self.impact,
        })
    }
}

enum UnitOutcome {
    Complete(RawRecord),
    Skipped(&'static str),
    /// The stream ended or failed inside the unit.
    Aborted,
}

/// Forward-only pull cursor over the records of one metrics export.
///
/// The only way to advance is [`RecordCursor::next_record`] (or the
/// [`Iterator`] impl that delegates to it). Once it returns `None` the cursor
/// is exhausted for good.
pub struct RecordCursor {
    reader: Reader<Box<dyn BufRead + Send>>,
    buf: Vec<u8>,
    /// A nested unit start was consumed while reading the previous unit.
    pending_start: bool,
    finished: bool,
    produced: usize,
    skipped: usize,
    stream_error: Option<String>,
}

impl RecordCursor {
    /// Open a metrics export, decompressing it when it carries a gzip header.
    ///
    /// Failing to open the file or to read the first compressed block is
    /// fatal. Later decoding problems end the sequence early instead.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::file_system("Cannot open metrics file", path, e))?;
        let mut buffered = BufReader::new(file);
        let head = buffered
            .fill_buf()
            .map_err(|e| Error::file_system("Cannot read metrics file", path, e))?;

        if head.starts_with(&GZIP_MAGIC) {
            let mut decoded = BufReader::new(MultiGzDecoder::new(buffered));
            decoded
                .fill_buf()
                .map_err(|e| Error::decode(path, e.to_string()))?;
            log::debug!("Reading gzip metrics export {}", path.display());
            Ok(Self::from_reader(decoded))
        } else if has_gz_extension(path) && !head.is_empty() {
            Err(Error::decode(path, "not in gzip format"))
        } else {
            log::debug!("Reading plain metrics export {}", path.display());
            Ok(Self::from_reader(buffered))
        }
    }

    /// Build a cursor over already decoded export bytes.
    pub fn from_reader<R: Read + Send + 'static>(input: R) -> Self {
        let framed = Cursor::new(ROOT_OPEN).chain(input).chain(Cursor::new(ROOT_CLOSE));
        let source: Box<dyn BufRead + Send> = Box::new(BufReader::new(framed));

        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.trim_text(true);
        // Units may be cut short; mismatched end tags are expected.
        config.check_end_names = false;

        Self {
            reader,
            buf: Vec::new(),
            pending_start: false,
            finished: false,
            produced: 0,
            skipped: 0,
            stream_error: None,
        }
    }

    /// Advance to the next complete record.
    pub fn next_record(&mut self) -> Option<RawRecord> {
        loop {
            if self.finished {
                return None;
            }
            if !std::mem::take(&mut self.pending_start) && !self.seek_unit_start() {
                return None;
            }
            match self.read_unit() {
                UnitOutcome::Complete(record) => {
                    self.produced += 1;
                    return Some(record);
                }
                UnitOutcome::Skipped(reason) => {
                    self.skipped += 1;
                    log::warn!("Skipping malformed metrics unit: {}", reason);
                }
                UnitOutcome::Aborted => {
                    self.skipped += 1;
                    log::warn!("Metrics export ended inside a unit");
                    return None;
                }
            }
        }
    }

    /// Number of records returned so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Number of malformed or truncated units skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The parse error that ended the sequence, if any.
    pub fn stream_error(&self) -> Option<&str> {
        self.stream_error.as_deref()
    }

    fn fail(&mut self, message: String) {
        log::error!("Metrics export parse error: {}", message);
        self.stream_error = Some(message);
        self.finished = true;
    }

    /// Scan forward to the next `<fnmetric>` start tag.
    fn seek_unit_start(&mut self) -> bool {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) if e.local_name().as_ref() == UNIT_TAG => return true,
                Ok(Event::Empty(e)) if e.local_name().as_ref() == UNIT_TAG => {
                    self.skipped += 1;
                    log::warn!("Skipping malformed metrics unit: empty element");
                }
                Ok(Event::Eof) => {
                    self.finished = true;
                    return false;
                }
                Ok(_) => {}
                Err(e) => {
                    self.fail(e.to_string());
                    return false;
                }
            }
        }
    }

    /// Read fields until the unit's end tag.
    fn read_unit(&mut self) -> UnitOutcome {
        let mut unit = UnitBuilder::default();
        let mut current: Option<Field> = None;
        let mut text = String::new();

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    let message = e.to_string();
                    self.fail(message);
                    return UnitOutcome::Aborted;
                }
            };

            match event {
                Event::Start(e) => {
                    let tag = e.local_name();
                    if tag.as_ref() == UNIT_TAG {
                        self.pending_start = true;
                        return UnitOutcome::Skipped("unterminated unit");
                    }
                    current = Field::from_tag(tag.as_ref());
                    if current.is_none() {
                        log::debug!(
                            "Ignoring unknown metrics field <{}>",
                            String::from_utf8_lossy(tag.as_ref())
                        );
                    }
                    text.clear();
                }
                Event::Empty(e) => {
                    if let Some(field) = Field::from_tag(e.local_name().as_ref()) {
                        unit.set(field, String::new());
                    }
                }
                Event::Text(t) => {
                    if current.is_some() {
                        match t.unescape() {
                            Ok(value) => text.push_str(&value),
                            Err(err) => {
                                log::debug!("Keeping unescaped field text: {}", err);
                                text.push_str(&String::from_utf8_lossy(&t));
                            }
                        }
                    }
                }
                Event::CData(c) => {
                    if current.is_some() {
                        text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Event::End(e) => {
                    let tag = e.local_name();
                    if tag.as_ref() == UNIT_TAG {
                        return match unit.build() {
                            Ok(record) => UnitOutcome::Complete(record),
                            Err(reason) => UnitOutcome::Skipped(reason),
                        };
                    }
                    if let Some(field) = current.take() {
                        if Field::from_tag(tag.as_ref()) == Some(field) {
                            unit.set(field, std::mem::take(&mut text));
                        }
                    }
                }
                Event::Eof => {
                    self.fail("export ends inside a unit".to_string());
                    return UnitOutcome::Aborted;
                }
                _ => {}
            }
        }
    }
}

impl Iterator for RecordCursor {
    type Item = RawRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

fn has_gz_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(text: &str) -> RecordCursor {
        RecordCursor::from_reader(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn reads_rootless_sequence() {
        let mut c = cursor(
            "<fnmetric><file>a.c</file><names>fn:f</names><metrics>lc:4</metrics></fnmetric>\
             <fnmetric><file>b.c</file><names>fn:g</names><metrics>lc:5</metrics></fnmetric>",
        );
        let first = c.next_record().unwrap();
        assert_eq!(first.file, "a.c");
        assert_eq!(first.names, "fn:f");
        assert_eq!(first.metrics, "lc:4");
        assert_eq!(c.next_record().unwrap().file, "b.c");
        assert!(c.next_record().is_none());
        assert!(c.next_record().is_none());
        assert_eq!(c.produced(), 2);
        assert!(c.stream_error().is_none());
    }

    #[test]
    fn captures_optional_blobs_and_cdata() {
        let mut c = cursor(
            "<fnmetric><file>a.c</file><metrics><![CDATA[lc:1;cc:1]]></metrics>\
             <coverage>ln:1</coverage><impact>x</impact></fnmetric>",
        );
        let record = c.next_record().unwrap();
        assert_eq!(record.metrics, "lc:1;cc:1");
        assert_eq!(record.coverage.as_deref(), Some("ln:1"));
        assert_eq!(record.impact.as_deref(), Some("x"));
    }

    #[test]
    fn unit_without_file_is_skipped() {
        let mut c = cursor(
            "<fnmetric><metrics>lc:1</metrics></fnmetric>\
             <fnmetric><file>ok.c</file></fnmetric>",
        );
        assert_eq!(c.next_record().unwrap().file, "ok.c");
        assert_eq!(c.skipped(), 1);
    }

    #[test]
    fn interrupted_unit_resumes_at_next_start() {
        let mut c = cursor(
            "<fnmetric><file>cut.c</file><metrics>lc:1\
             <fnmetric><file>next.c</file><metrics>lc:2</metrics></fnmetric>",
        );
        let record = c.next_record().unwrap();
        assert_eq!(record.file, "next.c");
        assert_eq!(c.skipped(), 1);
    }

    #[test]
    fn unit_cut_off_by_end_of_input_is_a_stream_error() {
        let mut c = cursor(
            "<fnmetric><file>a.c</file></fnmetric>\
             <fnmetric><file>cut.c</file><metrics>lc:",
        );
        assert_eq!(c.next_record().unwrap().file, "a.c");
        assert!(c.next_record().is_none());
        assert_eq!(c.skipped(), 1);
        assert!(c.stream_error().is_some());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut c = cursor("<fnmetric><file>a.c</file><extra>zzz</extra></fnmetric>");
        let record = c.next_record().unwrap();
        assert_eq!(record.file, "a.c");
        assert_eq!(record.names, "");
    }

    #[test]
    fn gz_extension_check_is_case_insensitive() {
        assert!(has_gz_extension(Path::new("FUNCTION.metrics.xml.GZ")));
        assert!(!has_gz_extension(Path::new("FUNCTION.metrics.xml")));
    }
}
