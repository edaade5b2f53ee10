//! `berth.yaml` loader.

use std::path::{Path, PathBuf};

use berth_core::{
    application::{ApplicationError, ports::ManifestLoader},
    domain::{Manifest, ManifestDocument},
    error::{BerthError, BerthResult},
};
use tracing::{debug, instrument};

/// File names looked up in a project directory, first match wins.
pub const MANIFEST_FILE_NAMES: [&str; 2] = ["berth.yaml", "berth.yml"];

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlManifestLoader;

impl YamlManifestLoader {
    pub fn new() -> Self {
        Self
    }

    /// The manifest file for `project_path`, which may also name the file
    /// itself.
    pub fn locate(project_path: &Path) -> Option<PathBuf> {
        if project_path.is_file() {
            return Some(project_path.to_path_buf());
        }
        MANIFEST_FILE_NAMES
            .iter()
            .map(|name| project_path.join(name))
            .find(|candidate| candidate.is_file())
    }
}

impl ManifestLoader for YamlManifestLoader {
    #[instrument(skip(self), fields(path = %project_path.display()))]
    fn load(&self, project_path: &Path) -> BerthResult<Manifest> {
        let file = Self::locate(project_path).ok_or_else(|| ApplicationError::ManifestNotFound {
            path: project_path.to_path_buf(),
        })?;
        debug!(manifest = %file.display(), "reading manifest");

        let raw = std::fs::read_to_string(&file).map_err(|e| ApplicationError::FilesystemError {
            path: file.clone(),
            reason: e.to_string(),
        })?;

        let doc: ManifestDocument =
            serde_yaml::from_str(&raw).map_err(|e| ApplicationError::ManifestParse {
                path: file.clone(),
                reason: e.to_string(),
            })?;

        Manifest::from_document(doc, &fallback_name(&file)).map_err(BerthError::Domain)
    }
}

/// Name of the directory holding the manifest.
fn fallback_name(manifest_file: &Path) -> String {
    let dir = manifest_file.parent().unwrap_or(Path::new("."));
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
