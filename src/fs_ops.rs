//! File-system capabilities used by the router and purge pass.
//!
//! The routing logic only decides what to move or delete; the actual calls go
//! through [`Mover`] and [`Remover`] so tests can observe or fail them.

use std::fs;
use std::io;
use std::path::Path;

/// Relocates a file. Failures must be returned, never swallowed.
pub trait Mover: Send + Sync {
    fn move_file(&self, source: &Path, destination: &Path) -> io::Result<()>;
}

/// Deletes a file.
pub trait Remover: Send + Sync {
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// The local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Mover for LocalFs {
    /// Renames `source` to `destination`, replacing any existing file.
    ///
    /// Removable media is usually a different mount than the target, where
    /// `rename` fails with `CrossesDevices`; in that case the file is copied
    /// and the original deleted.
    fn move_file(&self, source: &Path, destination: &Path) -> io::Result<()> {
        match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                copy_then_remove(source, destination, |path| fs::remove_file(path))
            }
            Err(e) => Err(e),
        }
    }
}

/// Copies `source` to `destination`, then removes `source` with `remove`.
///
/// If the source cannot be removed the copy is deleted again, so a failed
/// move never leaves the file in both places.
fn copy_then_remove<F>(source: &Path, destination: &Path, remove: F) -> io::Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    fs::copy(source, destination)?;
    if let Err(e) = remove(source) {
        if let Err(cleanup) = fs::remove_file(destination) {
            tracing::warn!(
                destination = %destination.display(),
                error = %cleanup,
                "Failed to remove copy after incomplete move"
            );
        }
        return Err(e);
    }
    Ok(())
}

impl Remover for LocalFs {
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Lists the subdirectories of `path` whose names are not in `excluded`.
///
/// Symlinks to directories count, since mount points are often links.
/// Names that are not valid UTF-8 are skipped. The result is sorted.
pub fn list_subdirectories<'a, I>(path: &Path, excluded: I) -> io::Result<Vec<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    let excluded: Vec<&String> = excluded.into_iter().collect();
    let mut names = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let Some(name) = utf8_name(&entry) else {
            continue;
        };
        if excluded.iter().any(|skip| **skip == name) {
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// Lists the regular files directly inside `path`, sorted by name.
///
/// Symlinks and directories are left out.
pub fn list_files(path: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if let Ok(file_type) = entry.file_type()
            && file_type.is_file()
            && let Some(name) = utf8_name(&entry)
        {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

fn utf8_name(entry: &fs::DirEntry) -> Option<String> {
    match entry.file_name().into_string() {
        Ok(name) => Some(name),
        Err(raw) => {
            tracing::warn!(name = ?raw, "Skipping entry with non UTF-8 name");
            None
        }
    }
}
