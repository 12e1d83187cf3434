//! Storage operations
//!
//! Read, write, list, delete, move and copy, each confined to the base
//! directory. Operations are independent and unsynchronized; concurrent
//! callers touching the same path race at the filesystem level.

use log::{info, warn};
use std::fs::{self, File, FileTimes, Metadata};
use std::io;
use std::path::Path;

use crate::error::FsError;
use crate::storage::results::{
    DeleteResult, DirEntry, EntryKind, ListResult, ReadResult, SUCCESS, TransferResult,
    WriteResult,
};
use crate::storage::validation::{BaseDir, is_missing};

/// Reads a whole file as UTF-8 text
pub fn read_file(base: &BaseDir, file_path: &str) -> Result<ReadResult, FsError> {
    let real_path = base.resolve(file_path)?;

    let metadata = match fs::metadata(&real_path) {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(FsError::not_found(file_path)),
        Err(e) if is_missing(&e) => return Err(FsError::not_found(file_path)),
        Err(e) => return Err(FsError::from(e)),
    };

    // read_to_string reports invalid UTF-8 as InvalidData
    let content = fs::read_to_string(&real_path)?;

    info!(
        "Read {} (real: {}) - {} bytes",
        file_path,
        real_path.display(),
        metadata.len()
    );

    Ok(ReadResult {
        content,
        path: real_path.display().to_string(),
        size: metadata.len(),
    })
}

/// Writes `content` to a file, creating parent directories and replacing
/// whatever file was there before
pub fn write_file(base: &BaseDir, file_path: &str, content: &str) -> Result<WriteResult, FsError> {
    let real_path = base.resolve(file_path)?;

    ensure_not_directory(&real_path, file_path)?;
    create_parent_dirs(&real_path)?;
    fs::write(&real_path, content.as_bytes())?;

    let size = content.len() as u64;
    info!(
        "Wrote {} (real: {}) - {} bytes",
        file_path,
        real_path.display(),
        size
    );

    Ok(WriteResult {
        status: SUCCESS,
        path: real_path.display().to_string(),
        size,
    })
}

/// Lists the immediate children of a directory, sorted by name
pub fn list_directory(base: &BaseDir, dir_path: &str) -> Result<ListResult, FsError> {
    let real_path = base.resolve(dir_path)?;

    match fs::metadata(&real_path) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => return Err(FsError::not_a_directory(dir_path)),
        Err(e) if is_missing(&e) => return Err(FsError::not_found(dir_path)),
        Err(e) => return Err(FsError::from(e)),
    }

    let mut contents = Vec::new();
    for entry in fs::read_dir(&real_path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();

        // Follow symlinks so a link to a directory is listed as a directory
        let dir_entry = match fs::metadata(entry.path()) {
            Ok(metadata) if metadata.is_dir() => DirEntry {
                name,
                kind: EntryKind::Directory,
                size: None,
            },
            Ok(metadata) => DirEntry {
                name,
                kind: EntryKind::File,
                size: metadata.is_file().then(|| metadata.len()),
            },
            Err(_) => DirEntry {
                name,
                kind: EntryKind::File,
                size: None,
            },
        };
        contents.push(dir_entry);
    }

    contents.sort_by(|a, b| a.name.cmp(&b.name));

    info!(
        "Listed directory {} (real: {}) - {} entries",
        dir_path,
        real_path.display(),
        contents.len()
    );

    Ok(ListResult {
        path: real_path.display().to_string(),
        contents,
    })
}

/// Deletes a single file. Directories are never removed.
pub fn delete_file(base: &BaseDir, file_path: &str) -> Result<DeleteResult, FsError> {
    let real_path = base.resolve(file_path)?;

    match fs::metadata(&real_path) {
        Ok(metadata) if metadata.is_dir() => return Err(FsError::not_a_file(file_path)),
        Ok(_) => {}
        Err(e) if is_missing(&e) => return Err(FsError::not_found(file_path)),
        Err(e) => return Err(FsError::from(e)),
    }

    fs::remove_file(&real_path)?;

    info!("Deleted {} (real: {})", file_path, real_path.display());

    Ok(DeleteResult {
        status: SUCCESS,
        message: format!("File {} deleted successfully", file_path),
    })
}

/// Moves a file, replacing an existing destination file
pub fn move_file(
    base: &BaseDir,
    source_path: &str,
    destination_path: &str,
) -> Result<TransferResult, FsError> {
    let source = base.resolve(source_path)?;
    let destination = base.resolve(destination_path)?;

    let source_metadata = match fs::metadata(&source) {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(FsError::not_a_file(source_path)),
        Err(e) if is_missing(&e) => return Err(FsError::not_found(source_path)),
        Err(e) => return Err(FsError::from(e)),
    };

    ensure_not_directory(&destination, destination_path)?;
    create_parent_dirs(&destination)?;

    match fs::rename(&source, &destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            info!(
                "Rename across filesystems for {}, falling back to copy and delete",
                source_path
            );
            move_across_filesystems(&source, &destination, &source_metadata)?;
        }
        Err(e) => return Err(FsError::from(e)),
    }

    let size = fs::metadata(&destination)?.len();
    info!(
        "Moved {} to {} (real: {} -> {})",
        source_path,
        destination_path,
        source.display(),
        destination.display()
    );

    Ok(TransferResult {
        status: SUCCESS,
        source: source.display().to_string(),
        destination: destination.display().to_string(),
        size,
    })
}

/// Copies a file with its permission bits and timestamps, replacing an
/// existing destination file
pub fn copy_file(
    base: &BaseDir,
    source_path: &str,
    destination_path: &str,
) -> Result<TransferResult, FsError> {
    let source = base.resolve(source_path)?;
    let destination = base.resolve(destination_path)?;

    let source_metadata = match fs::metadata(&source) {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(FsError::not_a_file(source_path)),
    };

    // fs::copy onto the source itself would truncate it
    if source == destination {
        return Err(FsError::IoFailure(io::Error::new(
            io::ErrorKind::InvalidInput,
            "source and destination are the same file",
        )));
    }

    ensure_not_directory(&destination, destination_path)?;
    create_parent_dirs(&destination)?;

    // Carries permission bits along with the content
    let size = fs::copy(&source, &destination)?;
    preserve_times(&source_metadata, &destination);

    info!(
        "Copied {} to {} (real: {} -> {}) - {} bytes",
        source_path,
        destination_path,
        source.display(),
        destination.display(),
        size
    );

    Ok(TransferResult {
        status: SUCCESS,
        source: source.display().to_string(),
        destination: destination.display().to_string(),
        size,
    })
}

fn create_parent_dirs(path: &Path) -> Result<(), FsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write targets must not be directories; a missing target is fine.
fn ensure_not_directory(real_path: &Path, relative: &str) -> Result<(), FsError> {
    match fs::metadata(real_path) {
        Ok(metadata) if metadata.is_dir() => Err(FsError::not_a_file(relative)),
        _ => Ok(()),
    }
}

/// Copy-then-delete used when `rename` cannot cross a filesystem boundary.
fn move_across_filesystems(
    source: &Path,
    destination: &Path,
    source_metadata: &Metadata,
) -> Result<(), FsError> {
    fs::copy(source, destination)?;
    preserve_times(source_metadata, destination);
    fs::remove_file(source)?;
    Ok(())
}

/// Best effort: a destination without the original timestamps is still a
/// valid copy.
fn preserve_times(source_metadata: &Metadata, destination: &Path) {
    let result = (|| -> io::Result<()> {
        let mut times = FileTimes::new().set_modified(source_metadata.modified()?);
        if let Ok(accessed) = source_metadata.accessed() {
            times = times.set_accessed(accessed);
        }
        File::options()
            .write(true)
            .open(destination)?
            .set_times(times)
    })();

    if let Err(e) = result {
        warn!(
            "Could not preserve timestamps on {}: {}",
            destination.display(),
            e
        );
    }
}
