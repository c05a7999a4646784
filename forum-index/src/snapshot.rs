//! Durable `{embeddings, posts}` snapshot.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{errors::IndexError, record::PersistedIndex};

/// Reads a persisted index.
///
/// Returns `Ok(None)` when no snapshot exists yet.
///
/// # Errors
/// - [`IndexError::Io`] for read failures other than "not found".
/// - [`IndexError::Parse`] if the snapshot is malformed.
pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<Option<PersistedIndex>, IndexError> {
    let path = path.as_ref();
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No snapshot at {:?}", path);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let idx: PersistedIndex = serde_json::from_slice(&raw)?;
    debug!(
        posts = idx.posts.len(),
        embeddings = idx.embeddings.len(),
        "Snapshot read from {:?}",
        path
    );
    Ok(Some(idx))
}

/// Writes the snapshot, replacing any previous one.
///
/// The JSON goes to a sibling temp file first and is renamed into place so a
/// crash never leaves a half-written snapshot behind.
///
/// # Errors
/// Returns [`IndexError::Io`] / [`IndexError::Parse`] on failure.
pub async fn save_snapshot(path: impl AsRef<Path>, idx: &PersistedIndex) -> Result<(), IndexError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let body = serde_json::to_vec_pretty(idx)?;
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;

    info!(posts = idx.posts.len(), "Embeddings saved to {:?}", path);
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
