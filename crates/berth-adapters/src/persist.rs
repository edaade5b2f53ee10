//! Crash-safe file replacement and cross-process advisory locks.
//!
//! Shared state (the port ledger, the route table) is only ever changed
//! inside a [`LockGuard`] and only ever replaced through [`atomic_write`],
//! so readers see either the old file or the new one.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, trace};

/// Mode for every file berth writes.
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Write `data` to `path` via a temp file in the same directory and a rename.
///
/// Parent directories are created. The temp file is synced before the rename.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(FILE_MODE))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Lock file guarding `target`: `<target>.lock`.
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out after {} ms waiting for {}", waited.as_millis(), path.display())]
    TimedOut { path: PathBuf, waited: Duration },

    #[error("cannot lock {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An exclusive advisory lock, released on drop.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Poll for the lock at `path` until `timeout` elapses.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let io_err = |source| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;

        let started = Instant::now();
        loop {
            match fs2::FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    trace!(path = %path.display(), "lock acquired");
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if is_contended(&e) => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        debug!(path = %path.display(), ?waited, "lock wait exhausted");
                        return Err(LockError::TimedOut {
                            path: path.to_path_buf(),
                            waited,
                        });
                    }
                    thread::sleep(POLL_INTERVAL.min(timeout - waited));
                }
                Err(e) => return Err(io_err(e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/ports.json");
        atomic_write(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.yml");
        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        // only the target remains, no stray temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_uses_standard_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.yml");
        atomic_write(&path, b"x").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path_for(Path::new("/home/u/.berth/ports.json")),
            PathBuf::from("/home/u/.berth/ports.json.lock")
        );
    }

    #[test]
    fn second_lock_times_out_then_succeeds_after_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ports.json.lock");

        let held = LockGuard::acquire(&path, Duration::from_millis(100)).unwrap();
        let err = LockGuard::acquire(&path, Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, LockError::TimedOut { .. }));

        drop(held);
        assert!(LockGuard::acquire(&path, Duration::from_millis(50)).is_ok());
    }
}
