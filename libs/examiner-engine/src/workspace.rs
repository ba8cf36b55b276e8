/// Workspace Manager - Per-Session Scratch Directories
///
/// Every execution gets `<root>/<session_id>/`, created exclusively and owned
/// by exactly one `Workspace`. All generated artifacts (source files, class
/// files, executables) live inside it, so releasing the workspace is a single
/// recursive delete and concurrent sessions never collide.
///
/// Cleanup is best-effort: failures are logged, never returned.
use anyhow::{Context, Result};
use examiner_common::types::Language;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    /// Create the manager, making sure the root directory exists
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create workspace root {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate an empty directory for `session_id`.
    ///
    /// Fails if the directory already exists: session ids must not be reused
    /// while a previous workspace with the same id is alive.
    pub async fn acquire(&self, language: Language, session_id: Uuid) -> Result<Workspace> {
        let dir = self.root.join(session_id.to_string());
        fs::create_dir(&dir)
            .await
            .with_context(|| format!("Failed to create workspace {}", dir.display()))?;

        debug!(session_id = %session_id, language = %language, path = %dir.display(), "Workspace acquired");

        Ok(Workspace {
            session_id,
            language,
            dir,
            released: false,
        })
    }
}

/// Exclusive scratch directory for one execution.
///
/// Call [`Workspace::release`] on every exit path. If a workspace is dropped
/// without being released (panic, cancelled task) the directory is removed
/// synchronously in `Drop`.
#[derive(Debug)]
pub struct Workspace {
    session_id: Uuid,
    language: Language,
    dir: PathBuf,
    released: bool,
}

impl Workspace {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write a source file into the workspace and return its path
    pub async fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.file(name);
        fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Delete every artifact of this session. Never fails.
    pub async fn release(mut self) {
        self.released = true;
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => debug!(session_id = %self.session_id, "Workspace released"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                session_id = %self.session_id,
                path = %self.dir.display(),
                error = %e,
                "Failed to clean up workspace"
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    session_id = %self.session_id,
                    path = %self.dir.display(),
                    error = %e,
                    "Failed to clean up dropped workspace"
                );
            }
        }
    }
}
