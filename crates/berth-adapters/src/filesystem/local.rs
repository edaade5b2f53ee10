//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use berth_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{BerthError, BerthResult},
};

use crate::persist::atomic_write;

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> BerthResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    /// Files are replaced atomically; parents are created as needed.
    fn write_file(&self, path: &Path, content: &str) -> BerthResult<()> {
        atomic_write(path, content.as_bytes()).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> BerthError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}
