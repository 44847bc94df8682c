//! Streaming zip extraction for OIV packages.
//!
//! Entries are copied through a fixed 4 KiB buffer so packages larger than
//! available memory (multi-GB `dlcpacks` are common) can be unpacked.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::paths::{create_dir_recorded, sanitize_entry_path};

/// Copy buffer size for a single entry.
pub const COPY_BUFFER_SIZE: usize = 4096;

/// Unix file type bits for a symlink entry.
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Extraction statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub skipped_dirs: usize,
    pub skipped_symlinks: usize,
    pub bytes: u64,
}

/// Files and directories an extraction created.
///
/// Filled as extraction goes, so it is accurate even when extraction stops
/// part way. Directories are listed parents first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractedPaths {
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

impl ExtractedPaths {
    /// Nothing was written to disk.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}

/// Progress for one extracted file.
#[derive(Debug, Clone, Copy)]
pub struct ExtractProgress<'a> {
    /// Zero-based index of the entry in the archive.
    pub index: usize,
    /// Total number of entries in the archive (directories included).
    pub total: usize,
    /// Entry name as stored in the archive.
    pub name: &'a str,
    /// Bytes written for this entry.
    pub bytes: u64,
}

/// Extract every regular file of `archive_path` into `dest`.
pub fn extract_all(archive_path: &Path, dest: &Path) -> Result<ExtractStats> {
    extract_all_with_progress(archive_path, dest, &mut |_| {})
}

/// Extract every regular file of `archive_path` into `dest`, reporting each
/// written file to `on_progress`.
pub fn extract_all_with_progress(
    archive_path: &Path,
    dest: &Path,
    on_progress: &mut dyn FnMut(ExtractProgress<'_>),
) -> Result<ExtractStats> {
    extract_into(archive_path, dest, &mut ExtractedPaths::default(), on_progress)
}

/// Extract `archive_path` into `dest`, recording every file and directory
/// created in `written`.
///
/// `dest` is created if missing; existing content is left alone and
/// overwritten on path collisions. Directory entries are implied by the file
/// paths and skipped, symlink entries are skipped. An entry whose name
/// escapes `dest` aborts extraction with `SecurityViolation`. An unreadable
/// archive fails before anything is written.
pub fn extract_into(
    archive_path: &Path,
    dest: &Path,
    written: &mut ExtractedPaths,
    on_progress: &mut dyn FnMut(ExtractProgress<'_>),
) -> Result<ExtractStats> {
    let file = File::open(archive_path).map_err(|e| Error::io(archive_path, e))?;
    let reader = BufReader::new(file);
    let mut archive = ZipArchive::new(reader).map_err(|source| Error::CorruptArchive {
        path: archive_path.to_path_buf(),
        source,
    })?;

    create_dir_recorded(dest, &mut written.dirs)?;

    let total = archive.len();
    info!("Extracting {} entries from {} to {}", total, archive_path.display(), dest.display());

    let mut stats = ExtractStats::default();
    let mut buffer = [0u8; COPY_BUFFER_SIZE];

    for index in 0..total {
        let mut entry = archive.by_index(index).map_err(|source| Error::CorruptArchive {
            path: archive_path.to_path_buf(),
            source,
        })?;

        if entry.is_dir() {
            stats.skipped_dirs += 1;
            continue;
        }

        if entry.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFLNK) {
            debug!("Skipping symlink entry {}", entry.name());
            stats.skipped_symlinks += 1;
            continue;
        }

        let name = entry.name().to_string();
        let out_path = sanitize_entry_path(&name, dest)?;
        if let Some(parent) = out_path.parent() {
            create_dir_recorded(parent, &mut written.dirs)?;
        }

        let output = File::create(&out_path).map_err(|e| Error::io(&out_path, e))?;
        written.files.push(out_path.clone());
        let mut writer = BufWriter::new(output);
        let bytes = copy_entry(&mut entry, &mut writer, &mut buffer)
            .map_err(|e| Error::io(&out_path, e))?;
        writer.flush().map_err(|e| Error::io(&out_path, e))?;

        debug!("Extracted {} ({} bytes)", name, bytes);
        stats.files += 1;
        stats.bytes += bytes;

        on_progress(ExtractProgress {
            index,
            total,
            name: &name,
            bytes,
        });
    }

    info!(
        "Extracted {} files ({} bytes), skipped {} directories",
        stats.files, stats.bytes, stats.skipped_dirs
    );

    Ok(stats)
}

/// Stream `reader` into `writer` through `buffer`.
fn copy_entry(reader: &mut impl Read, writer: &mut impl Write, buffer: &mut [u8]) -> std::io::Result<u64> {
    let mut written = 0u64;
    loop {
        let n = match reader.read(buffer) {
            Ok(0) => return Ok(written),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..n])?;
        written += n as u64;
    }
}
