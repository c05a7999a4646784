//! Posts file helpers: tolerant loader for the index and writer for the scraper.
//!
//! The posts file is a single JSON array of [`PostRecord`].

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::{errors::IndexError, record::PostRecord};

/// Reads the posts file strictly.
///
/// # Errors
/// - [`IndexError::Io`] if the file cannot be read.
/// - [`IndexError::Parse`] if the content is not a JSON array of posts.
pub async fn read_posts(path: impl AsRef<Path>) -> Result<Vec<PostRecord>, IndexError> {
    let raw = tokio::fs::read(path.as_ref()).await?;
    let posts: Vec<PostRecord> = serde_json::from_slice(&raw)?;
    debug!("Parsed {} posts from {:?}", posts.len(), path.as_ref());
    Ok(posts)
}

/// Loads posts for indexing; never fails.
///
/// A missing file yields an empty corpus with a warning, a malformed one an
/// empty corpus with an error log. The service stays available either way.
pub async fn load_posts(path: impl AsRef<Path>) -> Vec<PostRecord> {
    let path = path.as_ref();
    match read_posts(path).await {
        Ok(posts) => {
            info!("Loaded {} posts", posts.len());
            posts
        }
        Err(IndexError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Posts file {:?} not found; corpus is empty", path);
            Vec::new()
        }
        Err(e) => {
            error!(error = %e, "Error loading posts from {:?}; corpus is empty", path);
            Vec::new()
        }
    }
}

/// Writes posts as a pretty-printed JSON array, creating parent directories.
///
/// # Errors
/// Returns [`IndexError::Io`] / [`IndexError::Parse`] on failure.
pub async fn write_posts(path: impl AsRef<Path>, posts: &[PostRecord]) -> Result<(), IndexError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let body = serde_json::to_vec_pretty(posts)?;
    tokio::fs::write(path, body).await?;
    info!("Wrote {} posts to {:?}", posts.len(), path);
    Ok(())
}
