//! Ephemeral resource provisioning.
//!
//! Each session gets a private working copy of a template database so
//! runs can mutate state freely without touching the shared template. The
//! copy lives in its own directory named after the session, which makes
//! disposal a single recursive delete.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use toolrun_core::{CleanupError, ProvisionError, SessionId};

/// A provisioned per-session resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub session_id: SessionId,
    /// The session's private directory. Doubles as the disposal target and
    /// the scheduler tag for this session's cleanup jobs.
    pub dir: PathBuf,
    /// The working database copy inside `dir`.
    pub db_path: PathBuf,
}

/// Copies the template into per-session directories and deletes them again.
pub struct ResourceManager {
    template: PathBuf,
    data_dir: PathBuf,
}

impl ResourceManager {
    pub fn new(template: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            data_dir: data_dir.into(),
        }
    }

    /// The directory a given session's resources live in.
    pub fn session_dir(&self, session_id: &SessionId) -> PathBuf {
        self.data_dir.join(format!("tmp_{session_id}"))
    }

    /// Provision a fresh working copy for `session_id`.
    ///
    /// Provisioning an already-provisioned session is idempotent: the
    /// existing copy is kept as-is.
    pub async fn provision(&self, session_id: &SessionId) -> Result<ResourceHandle, ProvisionError> {
        let dir = self.session_dir(session_id);
        let file_name = self
            .template
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.db".into());
        let db_path = dir.join(file_name);

        if tokio::fs::try_exists(&db_path).await.unwrap_or(false) {
            debug!(session_id = %session_id, path = %db_path.display(), "Resource already provisioned");
            return Ok(ResourceHandle {
                session_id: session_id.clone(),
                dir,
                db_path,
            });
        }

        tokio::fs::metadata(&self.template)
            .await
            .map_err(|e| ProvisionError::TemplateUnreadable {
                path: self.template.clone(),
                reason: e.to_string(),
            })?;

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ProvisionError::DestinationUnavailable {
                path: dir.clone(),
                reason: e.to_string(),
            })?;

        tokio::fs::copy(&self.template, &db_path)
            .await
            .map_err(|e| ProvisionError::DestinationUnavailable {
                path: db_path.clone(),
                reason: e.to_string(),
            })?;

        debug!(session_id = %session_id, path = %db_path.display(), "Resource provisioned");
        Ok(ResourceHandle {
            session_id: session_id.clone(),
            dir,
            db_path,
        })
    }

    /// Delete a session directory immediately. Best-effort: a missing
    /// directory counts as success.
    pub async fn dispose_now(dir: &Path) -> Result<(), CleanupError> {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {
                debug!(path = %dir.display(), "Resource disposed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Resource disposal failed");
                Err(CleanupError(format!("{}: {e}", dir.display())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn manager_with_template() -> (tempfile::TempDir, ResourceManager) {
        let root = tempfile::tempdir().unwrap();
        let template = root.path().join("template.db");
        tokio::fs::write(&template, b"seed data").await.unwrap();
        let manager = ResourceManager::new(&template, root.path());
        (root, manager)
    }

    #[tokio::test]
    async fn provision_copies_template() {
        let (_root, manager) = manager_with_template().await;
        let id = SessionId::from("abc123");

        let handle = manager.provision(&id).await.unwrap();
        assert!(handle.dir.ends_with("tmp_abc123"));
        let copied = tokio::fs::read(&handle.db_path).await.unwrap();
        assert_eq!(copied, b"seed data");
    }

    #[tokio::test]
    async fn provision_is_idempotent() {
        let (_root, manager) = manager_with_template().await;
        let id = SessionId::from("abc123");

        let first = manager.provision(&id).await.unwrap();
        // Mutate the working copy, then provision again.
        tokio::fs::write(&first.db_path, b"mutated").await.unwrap();
        let second = manager.provision(&id).await.unwrap();

        assert_eq!(first, second);
        let contents = tokio::fs::read(&second.db_path).await.unwrap();
        assert_eq!(contents, b"mutated");
    }

    #[tokio::test]
    async fn provision_missing_template_fails() {
        let root = tempfile::tempdir().unwrap();
        let manager = ResourceManager::new(root.path().join("missing.db"), root.path());

        let err = manager.provision(&SessionId::new()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::TemplateUnreadable { .. }));
    }

    #[tokio::test]
    async fn dispose_removes_directory() {
        let (_root, manager) = manager_with_template().await;
        let handle = manager.provision(&SessionId::new()).await.unwrap();

        ResourceManager::dispose_now(&handle.dir).await.unwrap();
        assert!(!handle.dir.exists());
    }

    #[tokio::test]
    async fn dispose_missing_directory_is_ok() {
        let root = tempfile::tempdir().unwrap();
        let gone = root.path().join("never_existed");
        assert!(ResourceManager::dispose_now(&gone).await.is_ok());
    }
}
