use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::info;
use walkdir::WalkDir;
use zip::result::{ZipError, ZipResult};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PackError;
use crate::staging::{archive_path, StagedTask};

/// Delete an archive left by a previous run.
pub fn remove_stale_archive(destination: &Path) -> Result<(), PackError> {
    if destination.exists() {
        fs::remove_file(destination).map_err(|error| PackError::io(destination, error))?;
    }
    Ok(())
}

/// Write the staged tree to `destination` and finalize it. Returns the number
/// of file entries written.
///
/// Dependency folders go in first, then copied folders, then single files.
/// The archive is written in place, so a failure can leave a partial file.
pub fn write_archive(destination: &Path, staged: &StagedTask) -> Result<usize, PackError> {
    remove_stale_archive(destination)?;
    write_entries(destination, staged).map_err(|source| PackError::Archive {
        path: destination.to_path_buf(),
        source,
    })
}

fn write_entries(destination: &Path, staged: &StagedTask) -> ZipResult<usize> {
    let file = File::create(destination)?;
    let mut zip = ZipWriter::new(file);
    let mut written = 0usize;

    for dependency in &staged.dependencies {
        info!(" + {}", dependency.source.display());
        written += add_folder(&mut zip, &dependency.source, &dependency.target)?;
    }
    for folder in &staged.folders {
        info!(" + {}", folder.source.display());
        written += add_folder(&mut zip, &folder.source, &folder.target)?;
    }
    for entry in &staged.files {
        info!(" + {}", entry.source.display());
        add_file(&mut zip, &entry.source, &entry.target)?;
        written += 1;
    }

    info!("Finalizing archive");
    zip.finish()?;
    Ok(written)
}

fn add_folder(zip: &mut ZipWriter<File>, source: &Path, target: &str) -> ZipResult<usize> {
    let mut written = 0usize;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|error| ZipError::Io(io::Error::from(error)))?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let relative = archive_path(relative);
        let name = if relative.is_empty() {
            target.to_string()
        } else {
            format!("{target}/{relative}")
        };

        if entry.file_type().is_dir() {
            zip.add_directory(name, entry_options(None))?;
        } else if entry.file_type().is_file() {
            add_file(zip, entry.path(), &name)?;
            written += 1;
        }
    }
    Ok(written)
}

fn add_file(zip: &mut ZipWriter<File>, source: &Path, name: &str) -> ZipResult<()> {
    let metadata = fs::metadata(source)?;
    zip.start_file(name, entry_options(Some(&metadata)))?;
    let mut reader = File::open(source)?;
    io::copy(&mut reader, zip)?;
    Ok(())
}

fn entry_options(metadata: Option<&fs::Metadata>) -> FileOptions {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    match metadata {
        Some(metadata) => with_permissions(options, metadata),
        None => options,
    }
}

#[cfg(unix)]
fn with_permissions(options: FileOptions, metadata: &fs::Metadata) -> FileOptions {
    use std::os::unix::fs::PermissionsExt;
    options.unix_permissions(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn with_permissions(options: FileOptions, _metadata: &fs::Metadata) -> FileOptions {
    options
}
