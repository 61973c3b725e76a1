//! Batch uploads.
//!
//! Transfers run strictly in order over one session, and the first
//! failure stops the batch; later items are never attempted.

use crate::error::TransferError;
use crate::store::RemoteStore;
use std::path::{Path, PathBuf};
use tracing::info;

/// One file to upload.
#[derive(Debug, Clone)]
pub struct TransferItem {
    /// Local source file.
    pub local: PathBuf,
    /// Remote destination path.
    pub remote: String,
}

impl TransferItem {
    /// Pair a local file with its remote destination.
    pub fn new(local: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            remote: remote.into(),
        }
    }
}

fn remote_parent(remote: &str) -> Option<&str> {
    remote.rsplit_once('/').map(|(dir, _)| dir).filter(|d| !d.is_empty())
}

/// Upload one file, creating its remote parent directory as needed.
pub fn upload_file(
    store: &mut dyn RemoteStore,
    local: &Path,
    remote: &str,
) -> Result<(), TransferError> {
    if let Some(dir) = remote_parent(remote) {
        store.ensure_dir(dir)?;
    }
    store.put_file(local, remote)
}

/// Upload items in order, creating remote parent directories as
/// needed. Returns how many items were uploaded.
pub fn upload_batch(
    store: &mut dyn RemoteStore,
    items: &[TransferItem],
) -> Result<usize, TransferError> {
    for (index, item) in items.iter().enumerate() {
        let mut upload = || -> Result<(), TransferError> {
            if let Some(dir) = remote_parent(&item.remote) {
                store.ensure_dir(dir)?;
            }
            store.put_file(&item.local, &item.remote)
        };

        upload().map_err(|source| TransferError::BatchFailed {
            remote: item.remote.clone(),
            completed: index,
            source: Box::new(source),
        })?;
    }

    info!(count = items.len(), "batch uploaded");
    Ok(items.len())
}

/// Collect every file under a local directory as transfer items, the
/// remote side joined with `/` regardless of the local separator.
pub fn directory_items(
    local_dir: &Path,
    remote_dir: &str,
) -> Result<Vec<TransferItem>, TransferError> {
    let mut items = Vec::new();
    collect(local_dir, remote_dir.trim_end_matches('/'), &mut items)?;
    items.sort_by(|a, b| a.remote.cmp(&b.remote));
    Ok(items)
}

fn collect(
    dir: &Path,
    remote_dir: &str,
    items: &mut Vec<TransferItem>,
) -> Result<(), TransferError> {
    let entries = std::fs::read_dir(dir).map_err(|source| TransferError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| TransferError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let remote = format!("{remote_dir}/{name}");

        if path.is_dir() {
            collect(&path, &remote, items)?;
        } else {
            items.push(TransferItem::new(path, remote));
        }
    }
    Ok(())
}
