//! Per-request scoped working directory.

use crate::error::EngineError;
use std::path::{Path, PathBuf};

/// Exclusively owned, uniquely named directory for one request.
///
/// Materialized resources and extracted archives land here, and the renderer
/// receives the path as the `workdir` namespace entry. The directory is
/// removed when the area is dropped, on every exit path; call [`keep`] to
/// leave it behind for inspection.
///
/// [`keep`]: WorkArea::keep
#[derive(Debug)]
pub struct WorkArea {
    path: PathBuf,
    keep: bool,
}

impl WorkArea {
    /// Create a fresh work area under the system temp directory
    pub fn new() -> Result<Self, EngineError> {
        Self::new_in(std::env::temp_dir())
    }

    /// Create a fresh work area under the given root
    pub fn new_in(root: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = root
            .as_ref()
            .join(format!("overture-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        tracing::debug!("work area created: {}", path.display());
        Ok(Self { path, keep: false })
    }

    /// Path of the work area
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the directory on disk when the area is dropped
    pub fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for WorkArea {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("failed to remove work area {}: {}", self.path.display(), e);
            }
        }
    }
}
