//! Zip packaging of cut clips.

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ExportError, ExportResult};

/// Deflate the given files into an in-memory zip, one entry per file named
/// by its base name, in the order given.
pub fn pack_files(files: &[PathBuf]) -> ExportResult<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ExportError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("clip path has no usable file name: {}", path.display()),
                ))
            })?
            .to_string();

        zip.start_file(name, options)?;
        let mut file = File::open(path)?;
        std::io::copy(&mut file, &mut zip)?;
    }

    let mut cursor = zip.finish()?;
    cursor.flush()?;
    let bytes = cursor.into_inner();
    debug!(entries = files.len(), bytes = bytes.len(), "Packed clip archive");
    Ok(bytes)
}

/// [`pack_files`] on the blocking pool.
pub async fn pack(files: Vec<PathBuf>) -> ExportResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || pack_files(&files))
        .await
        .map_err(|e| ExportError::Task(e.to_string()))?
}
