//! Atomic datafile writes.
//!
//! Uses the temp file + rename pattern:
//! 1. Write to a temp file in the destination directory
//! 2. Flush and sync the temp file
//! 3. Rename temp to final (atomic on POSIX)
//!
//! If any step fails the temp file is removed and whatever was at the
//! destination before stays untouched.
//!
//! A new file gets the process default mode (0o666 less the umask), the
//! same as any plainly created file. Replacing a file keeps its mode.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

/// Atomically replace `path` with `bytes`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    write_atomic_with(path, |file| file.write_all(bytes))
}

/// Atomically replace `path` with whatever `fill` writes.
///
/// `fill` receives the temp file handle. An error from `fill` aborts the
/// write without touching `path`.
pub fn write_atomic_with<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = new_temp_in(dir)?;
    if let Ok(existing) = std::fs::metadata(path) {
        if existing.is_file() {
            temp.as_file().set_permissions(existing.permissions())?;
        }
    }
    debug!(
        final_path = %path.display(),
        temp_path = %temp.path().display(),
        "Starting atomic datafile write"
    );

    // NamedTempFile removes itself on drop, so early returns leave no residue.
    if let Err(e) = fill(temp.as_file_mut()) {
        warn!(temp_path = %temp.path().display(), error = %e, "Write failed, discarding temp file");
        return Err(e);
    }
    temp.as_file_mut().flush()?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| {
        warn!(path = %path.display(), error = %e.error, "Rename failed, discarding temp file");
        e.error
    })?;

    sync_dir(dir);
    debug!(path = %path.display(), "Atomic rename completed");
    Ok(())
}

#[cfg(unix)]
fn new_temp_in(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    // Mode is applied at open(2), so the umask still masks it.
    Builder::new()
        .prefix(".pico")
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_temp_in(dir: &Path) -> io::Result<NamedTempFile> {
    Builder::new().prefix(".pico").tempfile_in(dir)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
