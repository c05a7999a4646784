//! Runtime configuration for the post index.

use std::{path::PathBuf, time::Duration};

use crate::errors::IndexError;

/// Dimension of `text-embedding-3-small` vectors.
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;
/// Posts per embedding request.
pub const DEFAULT_BATCH_SIZE: usize = 20;
/// Pause between two embedding requests.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(1000);
/// Characters of post content kept in a search result.
pub const DEFAULT_SNIPPET_CHARS: usize = 200;

/// Configuration for building, persisting and searching the index.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    /// JSON array of posts produced by the scraper.
    pub posts_path: PathBuf,
    /// Persisted `{embeddings, posts}` snapshot.
    pub index_path: PathBuf,
    /// Expected vector dimension; also the size of zero-vector fallbacks.
    pub dim: usize,
    /// Number of posts sent per embedding request.
    pub batch_size: usize,
    /// Fixed wait between embedding requests (upstream rate limit backpressure).
    pub batch_delay: Duration,
    /// Characters of content kept in [`crate::SearchResult::content`].
    pub snippet_chars: usize,
}

impl IndexConfig {
    /// Creates a config with default knobs for the given files.
    pub fn new_default(posts_path: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            posts_path: posts_path.into(),
            index_path: index_path.into(),
            dim: DEFAULT_EMBEDDING_DIM,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    /// Build from environment variables with defaults.
    ///
    /// - `POSTS_FILE` (default `data/discourse_posts.json`)
    /// - `INDEX_FILE` (default `data/embeddings.json`)
    /// - `EMBEDDING_DIM`, `EMBEDDING_BATCH_SIZE`, `EMBEDDING_BATCH_DELAY_MS`, `SNIPPET_CHARS`
    ///
    /// # Errors
    /// Returns `IndexError::Config` if the resulting values are invalid.
    pub fn from_env() -> Result<Self, IndexError> {
        let cfg = Self {
            posts_path: env("POSTS_FILE", "data/discourse_posts.json").into(),
            index_path: env("INDEX_FILE", "data/embeddings.json").into(),
            dim: parse("EMBEDDING_DIM", DEFAULT_EMBEDDING_DIM),
            batch_size: parse("EMBEDDING_BATCH_SIZE", DEFAULT_BATCH_SIZE),
            batch_delay: Duration::from_millis(parse(
                "EMBEDDING_BATCH_DELAY_MS",
                DEFAULT_BATCH_DELAY.as_millis() as u64,
            )),
            snippet_chars: parse("SNIPPET_CHARS", DEFAULT_SNIPPET_CHARS),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.posts_path.as_os_str().is_empty() {
            return Err(IndexError::Config("posts_path is empty".into()));
        }
        if self.index_path.as_os_str().is_empty() {
            return Err(IndexError::Config("index_path is empty".into()));
        }
        if self.dim == 0 {
            return Err(IndexError::Config("dim must be > 0".into()));
        }
        if self.batch_size == 0 {
            return Err(IndexError::Config("batch_size must be > 0".into()));
        }
        Ok(())
    }
}

fn env(k: &str, dflt: &str) -> String {
    std::env::var(k)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| dflt.to_string())
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(dflt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_model() {
        let cfg = IndexConfig::new_default("p.json", "i.json");
        assert_eq!(cfg.dim, 1536);
        assert_eq!(cfg.batch_size, 20);
        assert_eq!(cfg.batch_delay, Duration::from_secs(1));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_batch_is_rejected() {
        let mut cfg = IndexConfig::new_default("p.json", "i.json");
        cfg.batch_size = 0;
        assert!(matches!(cfg.validate(), Err(IndexError::Config(_))));
    }
}
