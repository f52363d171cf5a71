// Test utility module for covmetrics integration tests
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One `<fnmetric>` element.
pub fn fnmetric(file: &str, names: &str, metrics: &str) -> String {
    format!(
        "<fnmetric>\n  <file>{}</file>\n  <names>{}</names>\n  <metrics>{}</metrics>\n</fnmetric>\n",
        file, names, metrics
    )
}

/// A function record with only lines of code and complexity.
pub fn function(file: &str, name: &str, loc: u32, ccm: u32) -> String {
    fnmetric(file, &format!("fn:{}", name), &format!("lc:{};cc:{}", loc, ccm))
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("Failed to compress");
    encoder.finish().expect("Failed to finish gzip stream")
}

/// Write `text` gzip-compressed to `dir/name`.
pub fn write_gz(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, gzip(text.as_bytes())).expect("Failed to write gzip file");
    path
}

pub fn write_plain(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("Failed to write file");
    path
}

/// Lay out `dir/output<tag>/FUNCTION.metrics.xml.gz`.
pub fn write_intermediate_dir(dir: &Path, tag: &str, text: &str) -> PathBuf {
    let output = dir.join(format!("output{}", tag));
    std::fs::create_dir_all(&output).expect("Failed to create output dir");
    write_gz(&output, "FUNCTION.metrics.xml.gz", text)
}

/// `count` distinct files in module directory `module`, one small function
/// each.
pub fn module_with_files(module: &str, count: usize) -> String {
    (0..count)
        .map(|i| function(&format!("{}/f{}.c", module, i), &format!("fn{}", i), 10, 2))
        .collect()
}
