//! Archive extraction and nested fragment resolution
//!
//! Unpacks a downloaded export archive into its target directory, then
//! runs a second pass over the result: large space exports arrive
//! chunked, with secondary `... Part-<N>.zip` archives embedded in the
//! top level. The format guarantees exactly two nesting levels, so the
//! second pass never recurses.

use crate::error::{Error, ExtractionError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extract a ZIP archive into a directory
///
/// Creates the destination if needed. Entries with unsafe paths (those
/// that would escape the destination) are skipped.
///
/// # Returns
///
/// The paths of the extracted files (directories excluded).
pub fn extract_archive(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
    debug!(?archive_path, ?dest_path, "extracting archive");

    std::fs::create_dir_all(dest_path)?;

    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        Error::Extraction(ExtractionError::Failed {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read ZIP archive: {e}"),
        })
    })?;

    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| {
            Error::Extraction(ExtractionError::Failed {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to read ZIP entry: {e}"),
            })
        })?;

        if let Some(path) = extract_entry(entry, dest_path, archive_path)? {
            extracted_files.push(path);
        }
    }

    info!(
        ?archive_path,
        extracted_count = extracted_files.len(),
        "archive extraction successful"
    );

    Ok(extracted_files)
}

/// Extract a single ZIP entry to disk, creating directories as needed
fn extract_entry(
    mut entry: zip::read::ZipFile,
    dest_path: &Path,
    archive_path: &Path,
) -> Result<Option<PathBuf>> {
    let entry_path = match entry.enclosed_name() {
        Some(path) => dest_path.join(path),
        None => {
            warn!(?archive_path, "skipping entry with unsafe path");
            return Ok(None);
        }
    };

    if entry.is_dir() {
        std::fs::create_dir_all(&entry_path)?;
        return Ok(None);
    }

    if let Some(parent) = entry_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut outfile = std::fs::File::create(&entry_path)?;
    std::io::copy(&mut entry, &mut outfile).map_err(|e| {
        Error::Extraction(ExtractionError::Failed {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to extract entry: {e}"),
        })
    })?;

    Ok(Some(entry_path))
}

/// Extract nested archive fragments inside an extracted tree
///
/// Lists `dir`, selects the file names matching `pattern` (the remote
/// export service's chunking convention, e.g. `Part-1.zip`), and
/// extracts each into `dir` itself, sequentially, in listing order.
/// One failing extraction aborts the rest. Only one nested level is
/// resolved.
///
/// # Returns
///
/// The number of fragments extracted.
pub fn resolve_nested_archives(dir: &Path, pattern: &Regex) -> Result<usize> {
    let mut fragments = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        if pattern.is_match(&name.to_string_lossy()) {
            fragments.push(path);
        }
    }

    for fragment in &fragments {
        debug!(?fragment, "extracting nested archive fragment");
        extract_archive(fragment, dir)?;
    }

    if !fragments.is_empty() {
        info!(
            ?dir,
            fragment_count = fragments.len(),
            "nested archive fragments resolved"
        );
    }

    Ok(fragments.len())
}

/// Compile a nested-fragment pattern from configuration
///
/// # Errors
///
/// Returns [`Error::Config`] if the pattern is not a valid regex.
pub fn compile_fragment_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config {
        message: format!("invalid nested fragment pattern {pattern:?}: {e}"),
        key: Some("nested_fragment_pattern".to_string()),
    })
}
