use crate::domain::schedule::Snapshot;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// File-backed persistence for the scheduler's state. Written after every
/// scheduler tick, read once at startup.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Reads the snapshot from disk. A missing or unreadable file degrades to
    /// an empty snapshot so the process can still start.
    pub async fn load(&self) -> Snapshot {
        match self.try_load().await {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    path = %self.path.display(),
                    schedules = snapshot.schedules.len(),
                    errored = snapshot.errored.len(),
                    completed = snapshot.completed_ids.len(),
                    "Loaded scheduler snapshot"
                );
                tracing::debug!("Snapshot contents:\n{}", snapshot.pretty());
                snapshot
            }
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "No snapshot found, starting empty");
                Snapshot::default()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Snapshot unreadable, starting empty");
                Snapshot::default()
            }
        }
    }

    async fn try_load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Serializes the full snapshot and replaces the durable file. The write
    /// goes through a temp file and a rename so a crash mid-save leaves the
    /// previous snapshot intact.
    ///
    /// # Errors
    /// Returns an error if encoding or the filesystem operations fail.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let data = serde_json::to_vec(snapshot)?;
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, &data).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}
