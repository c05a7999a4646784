//! Batched corpus embedding with zero-vector fallback.

use tracing::{debug, error, info};

use crate::{
    config::IndexConfig, embed::EmbeddingsProvider, errors::IndexError, record::PostRecord,
};

/// Result of embedding a whole corpus.
#[derive(Debug, Default)]
pub struct EmbedOutcome {
    /// One vector per post, in post order.
    pub embeddings: Vec<Vec<f32>>,
    /// Zero-based numbers of batches that fell back to zero vectors.
    pub failed_batches: Vec<usize>,
}

/// Embeds every post in fixed-size batches.
///
/// Between two batches the task sleeps for `cfg.batch_delay` (not after the
/// last one). A failing batch is replaced by zero vectors of `cfg.dim`, so the
/// output always has exactly `posts.len()` vectors.
pub async fn embed_corpus(
    posts: &[PostRecord],
    provider: &dyn EmbeddingsProvider,
    cfg: &IndexConfig,
) -> EmbedOutcome {
    let texts: Vec<String> = posts.iter().map(PostRecord::embedding_text).collect();
    let batch_size = cfg.batch_size.max(1);
    let total = texts.len().div_ceil(batch_size);

    info!(
        posts = posts.len(),
        batches = total,
        batch_size,
        "Creating embeddings"
    );

    let mut out = EmbedOutcome {
        embeddings: Vec::with_capacity(texts.len()),
        failed_batches: Vec::new(),
    };

    for (batch_no, batch) in texts.chunks(batch_size).enumerate() {
        info!("Processing batch {}/{}", batch_no + 1, total);

        let result = provider
            .embed_batch(batch)
            .await
            .and_then(|vs| check_batch(vs, batch.len(), cfg.dim));

        match result {
            Ok(vs) => out.embeddings.extend(vs),
            Err(e) => {
                error!(
                    error = %e,
                    batch = batch_no,
                    size = batch.len(),
                    "Error creating embeddings for batch; using zero vectors"
                );
                out.failed_batches.push(batch_no);
                out.embeddings
                    .extend(std::iter::repeat_n(vec![0.0f32; cfg.dim], batch.len()));
            }
        }

        if batch_no + 1 < total && !cfg.batch_delay.is_zero() {
            debug!(delay_ms = cfg.batch_delay.as_millis(), "rate limit pause");
            tokio::time::sleep(cfg.batch_delay).await;
        }
    }

    debug_assert_eq!(out.embeddings.len(), posts.len());
    out
}

/// Rejects batches with the wrong vector count or dimension.
fn check_batch(vs: Vec<Vec<f32>>, want: usize, dim: usize) -> Result<Vec<Vec<f32>>, IndexError> {
    if vs.len() != want {
        return Err(IndexError::CountMismatch {
            got: vs.len(),
            want,
        });
    }
    for v in &vs {
        check_dim(v, dim)?;
    }
    Ok(vs)
}

/// Every vector entering or querying the index must have the configured size.
pub(crate) fn check_dim(v: &[f32], dim: usize) -> Result<(), IndexError> {
    if v.len() != dim {
        return Err(IndexError::VectorSizeMismatch { got: v.len(), want: dim });
    }
    Ok(())
}
