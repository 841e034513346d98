use std::fs;
use std::io::{self, Cursor, Seek, Write};
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::Result;

/// Builds a deflated zip in memory. Each entry is `(source, stored_name)`;
/// a directory source is stored recursively under `stored_name/`.
pub fn create_archive<P: AsRef<Path>>(entries: &[(P, String)]) -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    // directories need the search bit to be entered after extraction
    let dir_options = options.unix_permissions(0o755);
    for (src, name) in entries {
        let src = src.as_ref();
        if src.is_dir() {
            add_tree(&mut zip, src, name, options, dir_options)?;
        } else {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&fs::read(src)?)?;
        }
        debug!(source = %src.display(), %name, "archived");
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn add_tree<W: Write + Seek>(
    zip: &mut zip::ZipWriter<W>,
    base: &Path,
    prefix: &str,
    options: FileOptions,
    dir_options: FileOptions,
) -> Result<()> {
    for entry in WalkDir::new(base) {
        let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(base) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        let name = if rel.is_empty() {
            prefix.to_string()
        } else {
            format!("{}/{}", prefix, rel)
        };
        if entry.file_type().is_dir() {
            zip.add_directory(name, dir_options)?;
        } else {
            zip.start_file(name, options)?;
            zip.write_all(&fs::read(path)?)?;
        }
    }
    Ok(())
}

/// Extracts every entry of the zip in `bytes` below `dest`; returns the entry count.
pub fn extract_archive(bytes: &[u8], dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest)?;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let n = archive.len();
    archive.extract(dest)?;
    debug!(dest = %dest.display(), entries = n, "extracted archive");
    Ok(n)
}
