use crate::domain::payment::TransactionReference;
use crate::domain::ports::RecoveryStore;
use crate::domain::recovery::PendingTransactionContext;
use crate::error::Result;
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Recovery slot kept as a JSON file so it survives a process restart
/// between starting a payment and confirming it.
///
/// Writes go through a temp file in the same directory and an atomic
/// rename, so readers never see a half-written context. Handles in other
/// processes sharing the file are not coordinated.
pub struct FileRecoveryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRecoveryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Option<PendingTransactionContext>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(ctx) => Ok(Some(ctx)),
                Err(e) => {
                    // A corrupt slot is treated as empty and discarded.
                    warn!(path = %self.path.display(), error = %e, "discarding unreadable recovery context");
                    self.clear().await?;
                    Ok(None)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RecoveryStore for FileRecoveryStore {
    async fn set(&self, context: PendingTransactionContext) -> Result<()> {
        let _guard = self.lock.lock().await;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let bytes = serde_json::to_vec_pretty(&context)?;
        let path = self.path.clone();

        // fsync and rename block, so they run off the async workers.
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)??;

        debug!(
            path = %self.path.display(),
            reference = %context.transaction_reference,
            "stored pending transaction context"
        );
        Ok(())
    }

    async fn consume(&self) -> Result<Option<PendingTransactionContext>> {
        let _guard = self.lock.lock().await;
        let ctx = self.read().await?;
        if ctx.is_some() {
            self.clear().await?;
        }
        Ok(ctx)
    }

    async fn consume_for(
        &self,
        reference: &TransactionReference,
    ) -> Result<Option<PendingTransactionContext>> {
        let _guard = self.lock.lock().await;
        match self.read().await? {
            Some(ctx) if ctx.transaction_reference == *reference => {
                self.clear().await?;
                Ok(Some(ctx))
            }
            Some(ctx) => {
                warn!(
                    stored = %ctx.transaction_reference,
                    echoed = %reference,
                    "redirect reference does not match stored context"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
