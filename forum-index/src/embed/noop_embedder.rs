use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::errors::IndexError;

/// Provider that always fails.
///
/// Useful when the index must only ever be served from a snapshot: any build
/// degrades to zero vectors and queries return no results.
#[derive(Clone, Debug, Default)]
pub struct NoopEmbedder;

impl EmbeddingsProvider for NoopEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async { Err(IndexError::MissingEmbedding) })
    }

    fn embed_batch<'a>(&'a self, _texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async { Err(IndexError::MissingEmbedding) })
    }
}
