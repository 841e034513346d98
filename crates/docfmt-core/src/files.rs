//! Plain file and directory helpers.
//!
//! - Absence is a normal outcome: `Ok(false)` / `Ok(None)`, never an error.
//! - Whole-buffer reads and writes; nothing is streamed.
//! - Zip helpers go through `archive`, CSV through `table`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive;
use crate::error::{Error, Result};
use crate::table::{self, Record};

#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub size: u64,
    pub last_modified: DateTime<Local>,
    pub extension: Option<String>,
}

pub fn file_exists(path: &Path) -> bool {
    path.exists()
}

pub fn delete_file(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path)?;
    debug!(path = %path.display(), "deleted file");
    Ok(true)
}

pub fn create_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    debug!(path = %path.display(), "created file");
    Ok(())
}

pub fn load_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
}

/// Reads a CSV file into header-keyed records.
pub fn read_csv(path: &Path) -> Result<Vec<Record>> {
    let text = load_file(path)?.ok_or_else(|| Error::FileNotFound(path.to_path_buf()))?;
    let records = table::parse_table(&text)?.records();
    debug!(path = %path.display(), rows = records.len(), "read csv");
    Ok(records)
}

pub fn copy_file(src: &Path, dst: &Path) -> Result<bool> {
    if !src.exists() {
        return Ok(false);
    }
    fs::copy(src, dst)?;
    Ok(true)
}

/// Renames in place; across filesystems it falls back to copy then delete.
pub fn move_file(src: &Path, dst: &Path) -> Result<bool> {
    if !src.exists() {
        return Ok(false);
    }
    match fs::rename(src, dst) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(src, dst)?;
            fs::remove_file(src)?;
        }
        Err(e) => return Err(e.into()),
    }
    debug!(from = %src.display(), to = %dst.display(), "moved file");
    Ok(true)
}

pub fn rename_file(old: &Path, new: &Path) -> Result<bool> {
    if !old.exists() {
        return Ok(false);
    }
    fs::rename(old, new)?;
    Ok(true)
}

pub fn get_file_info(path: &Path) -> Result<Option<FileInfo>> {
    if !path.exists() {
        return Ok(None);
    }
    let meta = fs::metadata(path)?;
    Ok(Some(FileInfo {
        size: meta.len(),
        last_modified: DateTime::<Local>::from(meta.modified()?),
        extension: path
            .extension()
            .map(|e| e.to_string_lossy().into_owned()),
    }))
}

pub fn write_to_file(path: &Path, content: &str, append: bool) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    f.write_all(content.as_bytes())?;
    debug!(path = %path.display(), append, bytes = content.len(), "wrote file");
    Ok(())
}

pub fn search_in_file(path: &Path, term: &str) -> Result<bool> {
    Ok(load_file(path)?.is_some_and(|s| s.contains(term)))
}

/// Creates the directory and any missing parents; `false` if it already exists.
pub fn create_directory(path: &Path) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)?;
    Ok(true)
}

/// Deletes a directory and everything below it; `false` if it is not a directory.
pub fn delete_directory(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    for entry in WalkDir::new(path).contents_first(true) {
        let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    info!(path = %path.display(), "deleted directory");
    Ok(true)
}

/// Entry names (files and directories) sorted ascending.
pub fn list_files_in_directory(path: &Path) -> Result<Vec<String>> {
    if !path.is_dir() {
        return Err(Error::NotADirectory(path.to_path_buf()));
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(path)? {
        out.push(entry?.file_name().to_string_lossy().into_owned());
    }
    out.sort();
    Ok(out)
}

/// Zips the given files under their base names; missing files are skipped.
/// Returns how many files were stored.
pub fn zip_files<P: AsRef<Path>>(files: &[P], zip_path: &Path) -> Result<usize> {
    let mut entries: Vec<(PathBuf, String)> = Vec::new();
    for f in files {
        let f = f.as_ref();
        if !f.exists() {
            warn!(path = %f.display(), "missing file not added to archive");
            continue;
        }
        let name = f
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| f.display().to_string());
        entries.push((f.to_path_buf(), name));
    }
    let bytes = archive::create_archive(&entries)?;
    fs::write(zip_path, bytes)?;
    info!(path = %zip_path.display(), files = entries.len(), "wrote zip");
    Ok(entries.len())
}

pub fn unzip_file(zip_path: &Path, dest: &Path) -> Result<usize> {
    if !zip_path.exists() {
        return Err(Error::FileNotFound(zip_path.to_path_buf()));
    }
    let bytes = fs::read(zip_path)?;
    archive::extract_archive(&bytes, dest)
}
