//! In-memory embedding index over harvested forum posts.
//!
//! This crate provides a small API to:
//! - Build (or reload) vectors for every post, batched against a hosted embedding API
//! - Persist the `{embeddings, posts}` snapshot and reuse it on the next start
//! - Retrieve top‑K similar posts for a textual query by cosine similarity
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod builder;
mod config;
pub mod corpus;
mod embed;
mod errors;
mod record;
mod retrieve;
pub mod similarity;
pub mod snapshot;

pub use builder::{EmbedOutcome, embed_corpus};
pub use config::IndexConfig;
pub use embed::noop_embedder::NoopEmbedder;
pub use embed::openai::OpenAiEmbedder;
pub use embed::{EmbedFuture, EmbeddingsProvider};
pub use errors::IndexError;
pub use record::{PersistedIndex, PostRecord, SearchResult, snippet, truncate_chars};

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Process-wide post index.
///
/// Construct once, wrap in `Arc` and share. The first search (or an explicit
/// [`PostIndex::build`]) fills the index; afterwards it is read-only until the
/// next forced rebuild.
///
/// Builds are single-flight: callers that arrive while a build is running
/// wait for it and receive its result instead of starting another one. A
/// forced rebuild never settles for the result of an unforced one.
pub struct PostIndex {
    cfg: IndexConfig,
    provider: Arc<dyn EmbeddingsProvider>,
    state: RwLock<Option<Arc<PersistedIndex>>>,
    build_lock: Mutex<()>,
    /// Incremented after every completed build.
    generation: AtomicU64,
    /// Whether the most recent completed build was forced.
    last_forced: AtomicBool,
}

impl PostIndex {
    /// Creates an empty, not yet built index.
    pub fn new(cfg: IndexConfig, provider: Arc<dyn EmbeddingsProvider>) -> Self {
        Self {
            cfg,
            provider,
            state: RwLock::new(None),
            build_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            last_forced: AtomicBool::new(false),
        }
    }

    /// Builds the index.
    ///
    /// With `force_recreate = false` an existing, consistent snapshot is loaded
    /// without any embedding call. Otherwise posts are read from disk and
    /// embedded in batches; failed batches become zero vectors. The result is
    /// persisted (persistence errors are logged, not returned).
    pub async fn build(&self, force_recreate: bool) -> Arc<PersistedIndex> {
        let seen = self.generation.load(Ordering::Acquire);
        let _guard = self.build_lock.lock().await;

        if let Some(current) = self.current().await {
            let joined = self.generation.load(Ordering::Acquire) != seen;
            // A forced caller only shares the result of another forced build.
            if !force_recreate || (joined && self.last_forced.load(Ordering::Acquire)) {
                if joined {
                    debug!("joined an in-flight build");
                }
                return current;
            }
        }

        let built = Arc::new(self.build_locked(force_recreate).await);
        // An empty index is not kept, so the next caller reads the corpus again.
        *self.state.write().await = (!built.is_empty()).then(|| built.clone());
        self.last_forced.store(force_recreate, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
        built
    }

    /// Returns the built index, building it first if needed.
    ///
    /// An empty corpus is never cached, so this keeps re-reading the posts
    /// file until it has content.
    pub async fn ensure_built(&self) -> Arc<PersistedIndex> {
        match self.current().await {
            Some(idx) => idx,
            None => self.build(false).await,
        }
    }

    /// Returns up to `top_k` posts most similar to `query`, best first.
    ///
    /// Never fails: an empty corpus or an embedding API error yields `[]`.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let idx = self.ensure_built().await;
        retrieve::search(
            &idx,
            self.provider.as_ref(),
            query,
            top_k,
            self.cfg.dim,
            self.cfg.snippet_chars,
        )
        .await
    }

    /// Currently loaded snapshot, if any build has completed.
    pub async fn snapshot(&self) -> Option<Arc<PersistedIndex>> {
        self.current().await
    }

    /// Finds the first indexed post whose topic URL contains `url` or is
    /// contained in it.
    pub async fn find_post_by_url(&self, url: &str) -> Option<PostRecord> {
        let idx = self.current().await?;
        idx.posts
            .iter()
            .find(|p| !p.topic_url.is_empty() && (p.topic_url.contains(url) || url.contains(&p.topic_url)))
            .cloned()
    }

    /// Number of indexed posts (0 until a non-empty build).
    pub async fn len(&self) -> usize {
        self.current().await.map(|idx| idx.len()).unwrap_or(0)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.cfg
    }

    /* --------------------- Internals --------------------- */

    async fn current(&self) -> Option<Arc<PersistedIndex>> {
        self.state.read().await.clone()
    }

    async fn build_locked(&self, force_recreate: bool) -> PersistedIndex {
        if !force_recreate {
            match snapshot::load_snapshot(&self.cfg.index_path).await {
                Ok(Some(idx)) if idx.is_consistent() => {
                    info!(posts = idx.len(), "Loaded existing embeddings");
                    return idx;
                }
                Ok(Some(idx)) => warn!(
                    posts = idx.posts.len(),
                    embeddings = idx.embeddings.len(),
                    "Snapshot is misaligned; rebuilding"
                ),
                Ok(None) => info!("No existing embeddings found, creating new ones"),
                Err(e) => warn!(error = %e, "Snapshot unreadable; rebuilding"),
            }
        }

        let posts = corpus::load_posts(&self.cfg.posts_path).await;
        if posts.is_empty() {
            warn!("Corpus is empty; nothing to embed");
            return PersistedIndex::default();
        }

        let outcome = embed_corpus(&posts, self.provider.as_ref(), &self.cfg).await;
        if !outcome.failed_batches.is_empty() {
            warn!(
                failed = outcome.failed_batches.len(),
                "Some batches fell back to zero vectors"
            );
        }

        let idx = PersistedIndex {
            embeddings: outcome.embeddings,
            posts,
        };

        if let Err(e) = snapshot::save_snapshot(&self.cfg.index_path, &idx).await {
            error!(error = %e, "Failed to persist embeddings; keeping in-memory index");
        }

        idx
    }
}
