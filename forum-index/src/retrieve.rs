//! Query-time retrieval: embed the query, rank, map to results.

use tracing::{error, trace};

use crate::{
    builder::check_dim,
    embed::EmbeddingsProvider,
    record::{PersistedIndex, SearchResult, snippet},
    similarity::rank_top_k,
};

/// Embeds `query` and returns up to `top_k` results from `idx`.
///
/// An empty index yields `[]`. A provider failure or a query vector that is
/// not `dim` long is logged and also yields `[]`.
pub async fn search(
    idx: &PersistedIndex,
    provider: &dyn EmbeddingsProvider,
    query: &str,
    top_k: usize,
    dim: usize,
    snippet_chars: usize,
) -> Vec<SearchResult> {
    if idx.is_empty() || top_k == 0 {
        trace!("retrieve::search skipped (empty index or top_k=0)");
        return Vec::new();
    }

    let qv = match provider.embed(query).await.and_then(|v| check_dim(&v, dim).map(|()| v)) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "Error searching similar posts");
            return Vec::new();
        }
    };

    let ranked = rank_top_k(&qv, &idx.embeddings, top_k);

    let out: Vec<SearchResult> = ranked
        .into_iter()
        .filter_map(|(i, similarity)| idx.posts.get(i).map(|post| (post, similarity)))
        .map(|(post, similarity)| SearchResult {
            post: post.clone(),
            similarity,
            url: post.topic_url.clone(),
            title: post.topic_title.clone(),
            content: snippet(&post.cleaned_content, snippet_chars),
        })
        .collect();

    trace!("retrieve::search hits={}", out.len());
    out
}
