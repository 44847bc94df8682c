//! Archive handling for OIV packages.
//!
//! OIV packages are plain zip files; extraction uses the zip crate directly.

pub mod extract;

pub use extract::{
    extract_all, extract_all_with_progress, extract_into, ExtractProgress, ExtractStats, ExtractedPaths,
};

/// Write a zip archive with the given `(name, data)` entries.
#[cfg(test)]
pub(crate) fn write_test_zip(path: &std::path::Path, entries: &[(&str, &[u8])]) {
    use std::io::Write;

    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }

    zip.finish().unwrap();
}
